use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::{ProviderError, ProviderResult};
use crate::sources::{FetchToken, FetchedToken};

/// Ambient credential chain settings, resolved once at construction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialChain {
    /// named profile, default chain when `None`
    pub profile: Option<String>,
    /// region override, chain default when `None`
    pub region: Option<String>,
}

/// Cloud identity signer producing a signed SASL token from the ambient
/// credential chain (e.g. an MSK IAM signer).
#[async_trait]
pub trait IamSigner: Send + Sync {
    async fn sign(&self, chain: &CredentialChain) -> ProviderResult<FetchedToken>;
}

/// Token source backed by an [`IamSigner`].
///
/// The provider calls it once at construction and then treats the signed
/// token as static.
#[derive(Clone)]
pub struct CloudIamSource {
    chain: CredentialChain,
    signer: Arc<dyn IamSigner>,
}

impl CloudIamSource {
    pub fn new(chain: CredentialChain, signer: Arc<dyn IamSigner>) -> Self {
        Self { chain, signer }
    }

}

/// Signer compiled into this build, if any
#[cfg(feature = "aws-msk-iam")]
pub fn linked_signer() -> Option<Arc<dyn IamSigner>> {
    Some(Arc::new(crate::sources::aws_msk::MskIamSigner))
}

#[cfg(not(feature = "aws-msk-iam"))]
pub fn linked_signer() -> Option<Arc<dyn IamSigner>> {
    None
}

#[async_trait]
impl FetchToken for CloudIamSource {
    fn name(&self) -> &str {
        "cloud_iam"
    }

    async fn fetch_token(&self) -> ProviderResult<FetchedToken> {
        info!(
            profile = self.chain.profile.as_deref().unwrap_or("default"),
            region = self.chain.region.as_deref().unwrap_or("default"),
            "signing cloud IAM token"
        );
        // an unusable credential chain is a misconfiguration, not a transient fetch error
        self.signer.sign(&self.chain).await.map_err(|e| match e {
            ProviderError::Fetch(msg) => {
                ProviderError::Configuration(format!("could not generate auth token: {}", msg))
            }
            other => other,
        })
    }
}
