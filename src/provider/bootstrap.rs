use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::config::sasl::ServiceConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::provider::token_provider::TokenProvider;
use crate::sources::IamSigner;

/// Holds the one provider built for a scope (usually the process).
///
/// Construction runs at most once; concurrent callers wait for it and all get
/// the same instance. A failed construction is kept too: every later caller
/// receives the original error and the slot is never rebuilt. If the caller
/// running construction is cancelled before it finishes, the slot fails
/// permanently with a configuration error instead of constructing again.
#[derive(Debug)]
pub struct ProviderSlot {
    cell: OnceCell<ProviderResult<Arc<TokenProvider>>>,
    /// set once an initializer has started running
    started: AtomicBool,
}

impl Default for ProviderSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderSlot {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
            started: AtomicBool::new(false),
        }
    }

    /// Provider in this slot, built by `init` if nobody has tried yet
    pub async fn get_or_init<F, Fut>(&self, init: F) -> ProviderResult<Arc<TokenProvider>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ProviderResult<TokenProvider>>,
    {
        self.cell
            .get_or_init(|| async move {
                // the cell only runs one initializer at a time, so a set flag
                // means an earlier one was dropped mid-construction
                if self.started.swap(true, Ordering::SeqCst) {
                    let e = ProviderError::Configuration(
                        "token provider construction was cancelled before it finished".to_string(),
                    );
                    error!("token provider construction failed: {}", e);
                    return Err(e);
                }
                match init().await {
                    Ok(provider) => {
                        info!(source = provider.source_name(), "token provider ready");
                        Ok(Arc::new(provider))
                    }
                    Err(e) => {
                        error!("token provider construction failed: {}", e);
                        Err(e)
                    }
                }
            })
            .await
            .clone()
    }

    /// Provider in this slot, built from `config` if nobody has tried yet
    pub async fn get_or_build(
        &self,
        config: &ServiceConfig,
        signer: Option<Arc<dyn IamSigner>>,
    ) -> ProviderResult<Arc<TokenProvider>> {
        self.get_or_init(|| TokenProvider::from_config(config, signer)).await
    }

    /// Outcome of construction, `None` while nothing has finished yet
    pub fn get(&self) -> Option<ProviderResult<Arc<TokenProvider>>> {
        self.cell.get().cloned()
    }
}

static PROVIDER: ProviderSlot = ProviderSlot::new();

/// Process-wide provider. The first caller's `config` and `signer` win.
pub async fn global_provider(
    config: &ServiceConfig,
    signer: Option<Arc<dyn IamSigner>>,
) -> ProviderResult<Arc<TokenProvider>> {
    PROVIDER.get_or_build(config, signer).await
}
