use serde::Deserialize;

pub const REFRESH_BUFFER_SECONDS_DEFAULT: u64 = 20;
pub const FETCH_TIMEOUT_SECONDS_DEFAULT: u64 = 10;

/// ================================
/// Provider-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SettingsConfig {
    /// replace the token this long before it expires
    pub refresh_buffer_seconds: Option<u64>,
    /// bound on a single token fetch
    pub fetch_timeout_seconds: Option<u64>,
    pub logging: Option<LoggingConfig>,
}

impl SettingsConfig {
    pub fn refresh_buffer_seconds(&self) -> u64 {
        self.refresh_buffer_seconds.unwrap_or(REFRESH_BUFFER_SECONDS_DEFAULT)
    }

    pub fn fetch_timeout_seconds(&self) -> u64 {
        self.fetch_timeout_seconds.unwrap_or(FETCH_TIMEOUT_SECONDS_DEFAULT)
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new("info".to_owned(), LogFormat::Compact)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}
