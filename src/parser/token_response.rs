use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::parser::jwt::jwt_expiration;
use crate::sources::FetchedToken;

/// Successful token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<Value>,
}

/// Error token endpoint response
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Parse a client-credentials token response received at `now`.
///
/// Expiry is `now + expires_in` when the endpoint reports a positive lifetime,
/// else the `exp` claim when the access token is a JWT, else unknown.
pub fn parse_token_response(body: &str, now: DateTime<Utc>) -> ProviderResult<FetchedToken> {
    let response: TokenResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Fetch(format!("invalid token response: {}", e)))?;

    if response.access_token.is_empty() {
        return Err(ProviderError::Fetch(
            "token response contains an empty access_token".to_string(),
        ));
    }
    if let Some(token_type) = &response.token_type {
        if !token_type.eq_ignore_ascii_case("bearer") {
            debug!(token_type = %token_type, "token endpoint returned a non-bearer token type");
        }
    }

    let expires_at = match response.expires_in.as_ref().and_then(expires_in_seconds) {
        // lifetimes past chrono's range saturate instead of reading as unknown
        Some(secs) if secs > 0 => Some(
            Duration::try_seconds(secs)
                .and_then(|ttl| now.checked_add_signed(ttl))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        ),
        _ => match jwt_expiration(&response.access_token) {
            Ok(exp) => Some(exp),
            Err(e) => {
                warn!("token response has no usable expiry: {}", e);
                None
            }
        },
    };

    Ok(FetchedToken::new(response.access_token, expires_at))
}

/// `expires_in` as a number, or as a numeric string (some providers send that)
fn expires_in_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Human-readable reason from an RFC 6749 §5.2 error body, if the body is one
pub fn parse_error_response(body: &str) -> Option<String> {
    let response: ErrorResponse = serde_json::from_str(body).ok()?;
    Some(match response.error_description {
        Some(description) if !description.is_empty() => {
            format!("{}: {}", response.error, description)
        }
        _ => response.error,
    })
}
