//! Sources module
//!
//! Token sources the provider can be bound to, and the selection of one of
//! them from configuration.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ProviderResult;

#[cfg(feature = "aws-msk-iam")]
pub mod aws_msk;
pub mod builder;
pub mod cloud_iam;
pub mod oauth2;
pub mod static_token;

pub use builder::{select_strategy, SourceStrategy};
pub use cloud_iam::{linked_signer, CloudIamSource, CredentialChain, IamSigner};
pub use oauth2::{OAuth2Settings, OAuth2Source};
pub use static_token::StaticSource;

/// Token as produced by a source, before the provider derives `replace_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedToken {
    pub value: String,
    /// `None` means the source does not know, or the token never expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl FetchedToken {
    pub fn new(value: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { value, expires_at }
    }
}

/// The one capability every token source has.
#[async_trait]
pub trait FetchToken: Send + Sync {
    /// Label for logs and metrics
    fn name(&self) -> &str;

    async fn fetch_token(&self) -> ProviderResult<FetchedToken>;
}
