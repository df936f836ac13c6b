//! AWS MSK IAM signer
//!
//! Loads the default AWS config (optionally a shared profile and a region
//! override) and signs a `kafka-cluster:Connect` token with its credentials.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_msk_iam_sasl_signer::generate_auth_token_from_credentials_provider;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::sources::cloud_iam::{CredentialChain, IamSigner};
use crate::sources::FetchedToken;

#[derive(Debug, Clone, Copy, Default)]
pub struct MskIamSigner;

#[async_trait]
impl IamSigner for MskIamSigner {
    async fn sign(&self, chain: &CredentialChain) -> ProviderResult<FetchedToken> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = &chain.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &chain.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let region = sdk_config.region().cloned().ok_or_else(|| {
            ProviderError::Configuration("could not load AWS config: no region configured".to_string())
        })?;
        let credentials = sdk_config.credentials_provider().ok_or_else(|| {
            ProviderError::Configuration(
                "could not load AWS config: no credentials provider configured".to_string(),
            )
        })?;

        debug!(region = %region, "generating MSK IAM auth token");
        let (token, expiration_ms) = generate_auth_token_from_credentials_provider(region, credentials)
            .await
            .map_err(|e| ProviderError::Fetch(e.to_string()))?;

        Ok(FetchedToken::new(token, DateTime::<Utc>::from_timestamp_millis(expiration_ms)))
    }
}
