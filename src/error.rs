//! Error types for token acquisition and provider construction

use std::time::Duration;

/// Errors surfaced by the provider and its token sources.
///
/// Cloneable so that a failed construction can be handed to every caller of
/// the bootstrap slot.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider could not be built from the supplied configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Token source failed to produce a token
    #[error("token fetch failed: {0}")]
    Fetch(String),

    /// Token source did not answer within the fetch timeout
    #[error("token fetch timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    /// Short label used for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            ProviderError::Configuration(_) => "configuration",
            ProviderError::Fetch(_) => "fetch",
            ProviderError::Timeout(_) => "timeout",
        }
    }
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;
