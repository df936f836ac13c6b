use async_trait::async_trait;

use crate::error::ProviderResult;
use crate::sources::{FetchToken, FetchedToken};

/// Literal token configured by the operator. Never expires.
#[derive(Clone)]
pub struct StaticSource {
    token: String,
}

impl StaticSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl std::fmt::Debug for StaticSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticSource").field("token", &"<redacted>").finish()
    }
}

#[async_trait]
impl FetchToken for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_token(&self) -> ProviderResult<FetchedToken> {
        Ok(FetchedToken::new(self.token.clone(), None))
    }
}
