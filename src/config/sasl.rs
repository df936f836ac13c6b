use serde::Deserialize;
use std::collections::HashMap;

use crate::config::settings::SettingsConfig;

/// ================================
/// Full provider configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    pub sasl: SaslConfig,
}

/// ================================
/// SASL credentials
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SaslConfig {
    #[serde(default)]
    pub mechanism: Mechanism,
    /// literal bearer token, never refreshed
    pub token: Option<String>,

    // OAuth2 client credentials
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_url: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub auth_style: AuthStyle,
    /// extra form parameters sent to the token endpoint
    #[serde(default)]
    pub endpoint_params: HashMap<String, String>,

    // cloud IAM credential chain
    pub profile: Option<String>,
    pub region: Option<String>,

    /// SASL extensions handed to the broker alongside the token
    pub extensions: Option<HashMap<String, String>>,
}

impl SaslConfig {
    /// Literal token if one is configured and non-empty
    pub fn static_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|token| !token.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mechanism {
    #[default]
    #[serde(rename = "OAUTHBEARER")]
    OAuthBearer,
    #[serde(rename = "AWS_MSK_IAM")]
    AwsMskIam,
}

/// How client credentials are presented to the token endpoint
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthStyle {
    /// try the header first, fall back to form fields, remember what worked
    #[default]
    Auto,
    /// HTTP basic authorization header
    Header,
    /// `client_id` / `client_secret` form fields
    Params,
}
