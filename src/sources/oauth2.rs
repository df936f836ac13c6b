use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::sasl::{AuthStyle, SaslConfig};
use crate::error::{ProviderError, ProviderResult};
use crate::helpers::time::Clock;
use crate::parser::token_response::{parse_error_response, parse_token_response};
use crate::sources::{FetchToken, FetchedToken};

const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";

/// OAuth2 client credentials grant settings
#[derive(Clone, Default)]
pub struct OAuth2Settings {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
    pub scopes: Vec<String>,
    pub auth_style: AuthStyle,
    pub endpoint_params: HashMap<String, String>,
}

impl OAuth2Settings {
    pub fn from_sasl(sasl: &SaslConfig) -> ProviderResult<Self> {
        let token_url = sasl
            .token_url
            .clone()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ProviderError::Configuration("missing sasl.token_url".to_string()))?;
        let client_id = sasl
            .client_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::Configuration("missing sasl.client_id".to_string()))?;

        Ok(Self {
            client_id,
            client_secret: sasl.client_secret.clone().unwrap_or_default(),
            token_url,
            scopes: sasl.scopes.clone(),
            auth_style: sasl.auth_style,
            endpoint_params: sasl.endpoint_params.clone(),
        })
    }

    fn form(&self, style: AuthStyle) -> Vec<(&str, &str)> {
        let mut form = vec![("grant_type", GRANT_TYPE_CLIENT_CREDENTIALS)];
        for (k, v) in &self.endpoint_params {
            form.push((k.as_str(), v.as_str()));
        }
        if style == AuthStyle::Params {
            form.push(("client_id", self.client_id.as_str()));
            form.push(("client_secret", self.client_secret.as_str()));
        }
        form
    }
}

impl std::fmt::Debug for OAuth2Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Settings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("token_url", &self.token_url)
            .field("scopes", &self.scopes)
            .field("auth_style", &self.auth_style)
            .finish()
    }
}

/// RFC 6749 §2.3.1: credentials are form-encoded before going into the basic auth header
fn form_escape(value: &str) -> ProviderResult<String> {
    let encoded = serde_urlencoded::to_string([("v", value)])
        .map_err(|e| ProviderError::Configuration(format!("cannot encode client credentials: {}", e)))?;
    Ok(encoded.strip_prefix("v=").unwrap_or_default().to_string())
}

/// Token source exchanging client credentials at an OAuth2 token endpoint
#[derive(Debug, Clone)]
pub struct OAuth2Source {
    pub settings: OAuth2Settings,
    client: Client,
    timeout: Duration,
    clock: Arc<dyn Clock>,
    /// style the endpoint accepted, for `AuthStyle::Auto`
    detected_style: Arc<Mutex<Option<AuthStyle>>>,
}

impl OAuth2Source {
    pub fn new(settings: OAuth2Settings, timeout: Duration, clock: Arc<dyn Clock>) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Configuration(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            settings,
            client,
            timeout,
            clock,
            detected_style: Arc::new(Mutex::new(None)),
        })
    }

    /// Style the next request uses, `None` while `Auto` has not settled on one
    pub fn auth_style(&self) -> Option<AuthStyle> {
        match self.settings.auth_style {
            AuthStyle::Auto => *self.detected_style.lock(),
            explicit => Some(explicit),
        }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.timeout)
        } else {
            ProviderError::Fetch(format!("token request to {} failed: {}", self.settings.token_url, err))
        }
    }
}

#[async_trait]
impl FetchToken for OAuth2Source {
    fn name(&self) -> &str {
        "oauth2"
    }

    async fn fetch_token(&self) -> ProviderResult<FetchedToken> {
        if let Some(style) = self.auth_style() {
            return self.request_token(style).await;
        }

        match self.request_token(AuthStyle::Header).await {
            Ok(token) => {
                self.remember_style(AuthStyle::Header);
                Ok(token)
            }
            Err(ProviderError::Fetch(reason)) => {
                debug!("header client authentication failed, retrying with form fields: {}", reason);
                let token = self.request_token(AuthStyle::Params).await?;
                self.remember_style(AuthStyle::Params);
                Ok(token)
            }
            Err(e) => Err(e),
        }
    }
}

impl OAuth2Source {
    fn remember_style(&self, style: AuthStyle) {
        let mut detected = self.detected_style.lock();
        if detected.is_none() {
            info!(token_url = %self.settings.token_url, auth_style = ?style, "token endpoint auth style detected");
            *detected = Some(style);
        }
    }

    /// One client credentials request with the credentials presented as `style`
    async fn request_token(&self, style: AuthStyle) -> ProviderResult<FetchedToken> {
        let settings = &self.settings;
        let scope = settings.scopes.join(" ");
        let mut form = settings.form(style);
        if !scope.is_empty() {
            form.push(("scope", scope.as_str()));
        }

        let mut request = self.client.post(&settings.token_url).form(&form);
        if style == AuthStyle::Header {
            request = request.basic_auth(
                form_escape(&settings.client_id)?,
                Some(form_escape(&settings.client_secret)?),
            );
        }

        debug!(token_url = %settings.token_url, auth_style = ?style, "requesting client credentials token");
        let response = request.send().await.map_err(|e| self.map_transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            let reason = parse_error_response(&body).unwrap_or(body);
            return Err(ProviderError::Fetch(format!(
                "token endpoint returned {}: {}",
                status, reason
            )));
        }

        parse_token_response(&body, self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_form_escaped() {
        assert_eq!(form_escape("kafka-client").unwrap(), "kafka-client");
        assert_eq!(form_escape("my id:1").unwrap(), "my+id%3A1");
        assert_eq!(form_escape("p&ss=word/").unwrap(), "p%26ss%3Dword%2F");
    }
}
