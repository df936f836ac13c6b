//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - settings: refresh buffer / fetch timeout / logging invariants
//! - sasl: the fields the selected token source actually needs

use reqwest::Url;
use tracing::{error, info};

use crate::config::sasl::{Mechanism, SaslConfig, ServiceConfig};
use crate::config::settings::SettingsConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_sasl(&cfg.sasl, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        Err(errors)
    }
}

/// AWS_MSK_IAM can only be served when a cloud IAM signer is available to the caller
pub fn validate_signer_available(cfg: &ServiceConfig, signer_linked: bool) -> Result<(), String> {
    if cfg.sasl.mechanism == Mechanism::AwsMskIam && !signer_linked {
        return Err(
            "sasl.mechanism AWS_MSK_IAM needs a cloud IAM signer, but this build has none (enable the `aws-msk-iam` feature)"
                .to_string(),
        );
    }
    Ok(())
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.refresh_buffer_seconds() == 0 {
        errors.push("settings.refresh_buffer_seconds must be greater than 0".to_string());
    }
    if settings.refresh_buffer_seconds() > 60 * 60 * 24 {
        errors.push(format!(
            "settings.refresh_buffer_seconds ({}) is unreasonably large",
            settings.refresh_buffer_seconds()
        ));
    }
    if settings.fetch_timeout_seconds() == 0 {
        errors.push("settings.fetch_timeout_seconds must be greater than 0".to_string());
    }

    if let Some(logging) = &settings.logging {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' must be one of {:?}",
                logging.level, LOG_LEVELS
            ));
        }
    }
}

/// SASL VALIDATION
///
/// Mirrors the selection order of the token source builder: cloud IAM first,
/// then a literal token, then OAuth2 client credentials.
fn validate_sasl(sasl: &SaslConfig, errors: &mut Vec<String>) {
    if sasl.mechanism == Mechanism::AwsMskIam {
        if let Some(profile) = &sasl.profile {
            if profile.trim().is_empty() {
                errors.push("sasl.profile must not be blank when set".to_string());
            }
        }
        return;
    }

    if sasl.static_token().is_some() {
        return;
    }

    match sasl.client_id.as_deref() {
        Some(client_id) if !client_id.trim().is_empty() => {}
        _ => errors.push(
            "sasl.client_id is required when neither sasl.token nor AWS_MSK_IAM is configured"
                .to_string(),
        ),
    }

    match sasl.token_url.as_deref() {
        None | Some("") => errors.push(
            "sasl.token_url is required when neither sasl.token nor AWS_MSK_IAM is configured"
                .to_string(),
        ),
        Some(token_url) => match Url::parse(token_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(format!(
                "sasl.token_url '{}' must use http or https, got '{}'",
                token_url,
                url.scheme()
            )),
            Err(e) => errors.push(format!("sasl.token_url '{}' is invalid: {}", token_url, e)),
        },
    }

    for key in sasl.endpoint_params.keys() {
        if matches!(key.as_str(), "grant_type" | "scope" | "client_id" | "client_secret") {
            errors.push(format!(
                "sasl.endpoint_params must not override '{}'",
                key
            ));
        }
    }
}
