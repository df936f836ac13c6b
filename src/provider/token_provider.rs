use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::token::TokenRecord;
use crate::config::sasl::ServiceConfig;
use crate::config::settings::SettingsConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::helpers::time::{get_instant, seconds, Clock, SystemClock};
use crate::observability::metrics::get_metrics;
use crate::sources::{
    select_strategy, CloudIamSource, FetchToken, FetchedToken, IamSigner, OAuth2Source,
    SourceStrategy, StaticSource,
};

/// Token handed to the broker client for one authentication handshake
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<HashMap<String, String>>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("extensions", &self.extensions)
            .finish()
    }
}

/// Execution context a provider binds its token source to
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    /// subtracted from the expiry to get the replacement time
    pub refresh_buffer: chrono::Duration,
    /// bound on a single fetch
    pub fetch_timeout: Duration,
    pub clock: Arc<dyn Clock>,
    pub extensions: Option<HashMap<String, String>>,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self::from_settings(&SettingsConfig::default())
    }
}

impl ProviderOptions {
    pub fn from_settings(settings: &SettingsConfig) -> Self {
        Self {
            refresh_buffer: seconds(settings.refresh_buffer_seconds()),
            fetch_timeout: Duration::from_secs(settings.fetch_timeout_seconds()),
            clock: Arc::new(SystemClock),
            extensions: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_extensions(mut self, extensions: Option<HashMap<String, String>>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_refresh_buffer(mut self, refresh_buffer: chrono::Duration) -> Self {
        self.refresh_buffer = refresh_buffer;
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Record for a freshly fetched refreshable token.
    /// Unknown expiry counts as expiring at `now`, so the next call refreshes.
    fn record_for(&self, fetched: FetchedToken, now: DateTime<Utc>) -> TokenRecord {
        let expires_at = fetched.expires_at.unwrap_or(now);
        TokenRecord::expiring(fetched.value, expires_at, self.refresh_buffer)
    }
}

/// Caches one bearer token and refreshes it lazily, at most one fetch at a time.
pub struct TokenProvider {
    /// swapped whole on refresh, readers never block
    record: ArcSwap<TokenRecord>,
    /// serializes fetches against the token source
    refresh_guard: Mutex<()>,
    is_static: bool,
    source: Arc<dyn FetchToken>,
    options: ProviderOptions,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let record = self.record.load();
        f.debug_struct("TokenProvider")
            .field("source", &self.source.name())
            .field("is_static", &self.is_static)
            .field("expires_at", &record.expires_at)
            .field("replace_at", &record.replace_at)
            .finish()
    }
}

impl TokenProvider {
    /// Provider that always hands out `token`
    pub fn new_static(token: impl Into<String>, options: ProviderOptions) -> Self {
        let token = token.into();
        Self {
            record: ArcSwap::from_pointee(TokenRecord::never_expiring(token.clone())),
            refresh_guard: Mutex::new(()),
            is_static: true,
            source: Arc::new(StaticSource::new(token)),
            options,
        }
    }

    /// Provider bound to a refreshable source. Fetches the first token before returning.
    pub async fn new_refreshing(
        source: Arc<dyn FetchToken>,
        options: ProviderOptions,
    ) -> ProviderResult<Self> {
        let fetched = timed_fetch(source.as_ref(), options.fetch_timeout).await?;
        let record = options.record_for(fetched, options.clock.now());
        info!(
            source = source.name(),
            expires_at = ?record.expires_at,
            replace_at = ?record.replace_at,
            "initial token fetched"
        );
        Ok(Self {
            record: ArcSwap::from_pointee(record),
            refresh_guard: Mutex::new(()),
            is_static: false,
            source,
            options,
        })
    }

    /// Build the provider for `strategy`. `signer` is only consulted for cloud IAM.
    pub async fn from_strategy(
        strategy: SourceStrategy,
        signer: Option<Arc<dyn IamSigner>>,
        options: ProviderOptions,
    ) -> ProviderResult<Self> {
        let is_static = strategy.is_static();
        info!(strategy = strategy.name(), is_static, "building token provider");
        match strategy {
            SourceStrategy::CloudIam(chain) => {
                let signer = signer.ok_or_else(|| {
                    ProviderError::Configuration(
                        "AWS_MSK_IAM requires a cloud IAM signer".to_string(),
                    )
                })?;
                let source = CloudIamSource::new(chain, signer);
                let signed = timed_fetch(&source, options.fetch_timeout).await?;
                // signed once, never refreshed by this provider
                Ok(Self {
                    record: ArcSwap::from_pointee(TokenRecord::never_expiring(signed.value)),
                    refresh_guard: Mutex::new(()),
                    is_static,
                    source: Arc::new(source),
                    options,
                })
            }
            SourceStrategy::Static(token) => Ok(Self::new_static(token, options)),
            SourceStrategy::OAuth2(settings) => {
                let source = OAuth2Source::new(settings, options.fetch_timeout, options.clock.clone())?;
                Self::new_refreshing(Arc::new(source), options).await
            }
        }
    }

    /// Build the provider described by `config`
    pub async fn from_config(
        config: &ServiceConfig,
        signer: Option<Arc<dyn IamSigner>>,
    ) -> ProviderResult<Self> {
        let strategy = select_strategy(&config.sasl)?;
        let options = ProviderOptions::from_settings(&config.settings)
            .with_extensions(config.sasl.extensions.clone());
        Self::from_strategy(strategy, signer, options).await
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Copy of the cached record
    pub fn snapshot(&self) -> TokenRecord {
        TokenRecord::clone(&self.record.load())
    }

    /// Current token, refreshed first if it is due for replacement.
    ///
    /// A failed refresh is returned as is; the cached token stays in place.
    pub async fn get_token(&self) -> ProviderResult<AccessToken> {
        if self.is_static {
            return Ok(self.access_token(self.record.load().value.clone()));
        }

        let cached = {
            let record = self.record.load();
            (!record.should_replace(self.options.clock.now())).then(|| record.value.clone())
        };

        let token = match cached {
            Some(token) => token,
            None => {
                debug!(source = self.source.name(), "token due for replacement");
                self.refresh().await?
            }
        };
        Ok(self.access_token(token))
    }

    /// Fetch a new token unless a concurrent caller already did while we
    /// waited for the guard. Returns the token that is cached afterwards.
    async fn refresh(&self) -> ProviderResult<String> {
        let _guard = self.refresh_guard.lock().await;

        let refreshed_meanwhile = {
            let record = self.record.load();
            (!record.should_replace(self.options.clock.now())).then(|| record.value.clone())
        };
        if let Some(token) = refreshed_meanwhile {
            debug!(source = self.source.name(), "token already refreshed by a concurrent caller");
            get_metrics()
                .await
                .refresh_coalesced
                .with_label_values(&[self.source.name()])
                .inc();
            return Ok(token);
        }

        let fetched = timed_fetch(self.source.as_ref(), self.options.fetch_timeout)
            .await
            .inspect_err(|e| warn!(source = self.source.name(), "token refresh failed: {}", e))?;

        let record = self.options.record_for(fetched, self.options.clock.now());
        info!(
            source = self.source.name(),
            expires_at = ?record.expires_at,
            replace_at = ?record.replace_at,
            "token refreshed"
        );
        let token = record.value.clone();
        self.record.store(Arc::new(record));
        Ok(token)
    }

    fn access_token(&self, token: String) -> AccessToken {
        AccessToken {
            token,
            extensions: self.options.extensions.clone(),
        }
    }
}

/// One fetch against `source`, bounded by `timeout` and recorded in metrics
async fn timed_fetch(source: &dyn FetchToken, timeout: Duration) -> ProviderResult<FetchedToken> {
    let metrics = get_metrics().await;
    let name = source.name();
    let start = get_instant();
    metrics.fetch_requests.with_label_values(&[name]).inc();

    let result = tokio::time::timeout(timeout, source.fetch_token())
        .await
        .unwrap_or(Err(ProviderError::Timeout(timeout)));

    metrics.fetch_duration.with_label_values(&[name]).observe(start.elapsed().as_secs_f64());
    match &result {
        Ok(fetched) => {
            if let Some(expires_at) = fetched.expires_at {
                metrics.token_expiry_unix.with_label_values(&[name]).set(expires_at.timestamp());
            }
        }
        Err(e) => metrics.fetch_failures.with_label_values(&[name, e.reason()]).inc(),
    }
    result
}
