//! # SASL Token Provider Library
//!
//! Supplies bearer tokens to SASL/OAUTHBEARER broker clients,
//! caching each token and refreshing it lazily before it expires,
//! with at most one fetch in flight at a time.
//!
//! Modules:
//! - `provider`: token provider core and the run-once bootstrap slot
//! - `sources`: static, cloud IAM and OAuth2 client credentials token sources
//! - `cache`: cached token record and expiry metadata
//! - `config`: YAML configuration, defaults and validation
//! - `parser`: token endpoint responses and JWT expirations

pub mod cache;
pub mod config;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod parser;
pub mod provider;
pub mod sources;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::config::sasl::ServiceConfig;
pub use crate::error::{ProviderError, ProviderResult};
pub use crate::provider::{global_provider, AccessToken, ProviderOptions, ProviderSlot, TokenProvider};
