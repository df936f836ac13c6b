use crate::config::sasl::{Mechanism, SaslConfig};
use crate::error::ProviderResult;
use crate::sources::cloud_iam::CredentialChain;
use crate::sources::oauth2::OAuth2Settings;

/// Which token source a provider is bound to
#[derive(Clone)]
pub enum SourceStrategy {
    /// Signed once from the cloud credential chain, then static
    CloudIam(CredentialChain),
    /// Literal token, static
    Static(String),
    /// Client credentials exchange, refreshed before expiry
    OAuth2(OAuth2Settings),
}

impl SourceStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            SourceStrategy::CloudIam(_) => "cloud_iam",
            SourceStrategy::Static(_) => "static",
            SourceStrategy::OAuth2(_) => "oauth2",
        }
    }

    /// Static strategies never refresh after construction
    pub fn is_static(&self) -> bool {
        !matches!(self, SourceStrategy::OAuth2(_))
    }
}

impl std::fmt::Debug for SourceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceStrategy::CloudIam(chain) => f.debug_tuple("CloudIam").field(chain).finish(),
            SourceStrategy::Static(_) => f.debug_tuple("Static").field(&"<redacted>").finish(),
            SourceStrategy::OAuth2(settings) => f.debug_tuple("OAuth2").field(settings).finish(),
        }
    }
}

/// Pick the token source for `sasl`, in priority order:
/// cloud IAM mechanism, then a literal token, then OAuth2 client credentials.
pub fn select_strategy(sasl: &SaslConfig) -> ProviderResult<SourceStrategy> {
    if sasl.mechanism == Mechanism::AwsMskIam {
        return Ok(SourceStrategy::CloudIam(CredentialChain {
            profile: sasl.profile.clone().filter(|p| !p.is_empty()),
            region: sasl.region.clone().filter(|r| !r.is_empty()),
        }));
    }
    if let Some(token) = sasl.static_token() {
        return Ok(SourceStrategy::Static(token.to_owned()));
    }
    OAuth2Settings::from_sasl(sasl).map(SourceStrategy::OAuth2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;

    fn oauth_sasl() -> SaslConfig {
        SaslConfig {
            client_id: Some("client".into()),
            client_secret: Some("secret".into()),
            token_url: Some("https://idp.example.com/token".into()),
            scopes: vec!["kafka".into()],
            ..Default::default()
        }
    }

    #[test]
    fn cloud_iam_wins_over_literal_token() {
        let sasl = SaslConfig {
            mechanism: Mechanism::AwsMskIam,
            token: Some("literal".into()),
            profile: Some("prod".into()),
            ..oauth_sasl()
        };
        match select_strategy(&sasl).unwrap() {
            SourceStrategy::CloudIam(chain) => {
                assert_eq!(chain.profile.as_deref(), Some("prod"));
                assert_eq!(chain.region, None);
            }
            other => panic!("unexpected strategy {:?}", other),
        }
    }

    #[test]
    fn literal_token_wins_over_oauth() {
        let sasl = SaslConfig { token: Some("literal".into()), ..oauth_sasl() };
        let strategy = select_strategy(&sasl).unwrap();
        assert!(strategy.is_static());
        assert!(matches!(strategy, SourceStrategy::Static(ref t) if t == "literal"));
    }

    #[test]
    fn empty_literal_token_falls_through_to_oauth() {
        let sasl = SaslConfig { token: Some(String::new()), ..oauth_sasl() };
        let strategy = select_strategy(&sasl).unwrap();
        assert!(!strategy.is_static());
        assert_eq!(strategy.name(), "oauth2");
    }

    #[test]
    fn oauth_without_token_url_is_a_configuration_error() {
        let sasl = SaslConfig { token_url: None, ..oauth_sasl() };
        assert!(matches!(select_strategy(&sasl), Err(ProviderError::Configuration(_))));
    }
}
