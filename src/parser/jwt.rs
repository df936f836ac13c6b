use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

#[derive(Debug, Deserialize)]
struct JwtClaims {
    exp: i64,
}

fn decode_jwt_claims(token: &str) -> ProviderResult<JwtClaims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(ProviderError::Fetch("access token is not a JWT".to_string()));
    }

    // base64url, padding is optional in the wild
    let payload = parts[1].trim_end_matches('=');
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| ProviderError::Fetch(format!("JWT payload base64 decode error: {}", e)))?;

    serde_json::from_slice::<JwtClaims>(&decoded)
        .map_err(|e| ProviderError::Fetch(format!("invalid JWT payload: {}", e)))
}

/// Expiration carried in the `exp` claim of a JWT access token.
///
/// The signature is not verified; the token is opaque to this crate and the
/// claim is only used to schedule the next refresh.
pub fn jwt_expiration(token: &str) -> ProviderResult<DateTime<Utc>> {
    let claims = decode_jwt_claims(token)?;
    let exp = DateTime::from_timestamp(claims.exp, 0)
        .ok_or_else(|| ProviderError::Fetch(format!("JWT exp {} out of range", claims.exp)))?;
    debug!(expires_at = %exp, "jwt exp claim parsed");
    Ok(exp)
}
