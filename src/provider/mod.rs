pub mod bootstrap;
pub mod token_provider;

pub use bootstrap::{global_provider, ProviderSlot};
pub use token_provider::{AccessToken, ProviderOptions, TokenProvider};
