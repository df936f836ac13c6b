// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::error::{ProviderError, ProviderResult};
use crate::helpers::time::{Clock, ManualClock};
use crate::sources::{FetchToken, FetchedToken};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc::now()))
}

/// Token source that counts its fetches and mints `token-<n>`
pub struct CountingSource {
    calls: AtomicUsize,
    failing: AtomicBool,
    clock: Arc<ManualClock>,
    /// `None` mints tokens without an expiry
    ttl: Option<Duration>,
    delay_ms: AtomicU64,
}

impl CountingSource {
    pub fn new(clock: Arc<ManualClock>, ttl: Option<Duration>, delay: std::time::Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            clock,
            ttl,
            delay_ms: AtomicU64::new(delay.as_millis() as u64),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: std::time::Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl FetchToken for CountingSource {
    fn name(&self) -> &str {
        "counting"
    }

    async fn fetch_token(&self) -> ProviderResult<FetchedToken> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let delay_ms = self.delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::Fetch("token endpoint returned 503".to_string()));
        }
        Ok(FetchedToken::new(
            format!("token-{}", n),
            self.ttl.map(|ttl| self.clock.now() + ttl),
        ))
    }
}
