//! Remote rule sources

pub mod rules_api;
pub mod source;

#[cfg(test)]
pub mod mock;

pub use rules_api::{HttpClientConfig, RulesApiClient};
pub use source::{FetchError, RuleSource};
