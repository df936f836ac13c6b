use crate::config::sasl::ServiceConfig;
use crate::config::settings::{
    LoggingConfig, FETCH_TIMEOUT_SECONDS_DEFAULT, REFRESH_BUFFER_SECONDS_DEFAULT,
};

pub fn initiate_default_values(mut config: ServiceConfig) -> ServiceConfig {
    let settings = &mut config.settings;
    settings.refresh_buffer_seconds.get_or_insert(REFRESH_BUFFER_SECONDS_DEFAULT);
    settings.fetch_timeout_seconds.get_or_insert(FETCH_TIMEOUT_SECONDS_DEFAULT);
    if settings.logging.is_none() {
        settings.logging = Some(LoggingConfig::default());
    }

    // "scopes: [a, '', b]" and env-expanded blanks collapse to nothing
    config.sasl.scopes = config
        .sasl
        .scopes
        .into_iter()
        .map(|scope| scope.trim().to_owned())
        .filter(|scope| !scope.is_empty())
        .collect();

    config.sasl.extensions = config
        .sasl
        .extensions
        .take()
        .filter(|extensions| !extensions.is_empty());

    config
}
