use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}

/// Render every registered metric in the prometheus text format
pub async fn gather_text() -> String {
    let metrics = get_metrics().await;
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if encoder.encode(&metrics.registry.gather(), &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Fetch metrics
    pub fetch_requests: IntCounterVec,
    pub fetch_failures: IntCounterVec,
    pub fetch_duration: HistogramVec,

    // Refresh metrics
    pub refresh_coalesced: IntCounterVec,

    // Cache metrics
    pub token_expiry_unix: IntGaugeVec,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("sasltoken".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Fetch
            fetch_requests: IntCounterVec::new(Opts::new("fetch_requests_total","Total token fetch attempts by source",),&["source"],).unwrap(),
            fetch_failures: IntCounterVec::new(Opts::new("fetch_failures_total", "Token fetch failures by reason"),&["source", "reason"],).unwrap(),
            fetch_duration: HistogramVec::new(HistogramOpts::new("fetch_duration_seconds", "Token fetch duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),&["source"],).unwrap(),

            // Refresh
            refresh_coalesced: IntCounterVec::new(Opts::new("refresh_coalesced_total", "Refreshes skipped because a concurrent caller already refreshed"),&["source"],).unwrap(),

            // Cache
            token_expiry_unix: IntGaugeVec::new(Opts::new("token_expiry_unix_seconds", "Cached token expiry timestamp"),&["source"],).unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.fetch_requests.clone())).unwrap();
        reg.register(Box::new(metrics.fetch_failures.clone())).unwrap();
        reg.register(Box::new(metrics.fetch_duration.clone())).unwrap();
        reg.register(Box::new(metrics.refresh_coalesced.clone())).unwrap();
        reg.register(Box::new(metrics.token_expiry_unix.clone())).unwrap();

        metrics
    }
}
