//! Rule Source Interface
//!
//! Abstraction over where detection rules come from, so the refresh path can
//! be driven by the real HTTP client or by a test double.

use async_trait::async_trait;
use thiserror::Error;

use crate::rules::RuleSet;

/// Trait for remote rule sources
#[async_trait]
pub trait RuleSource {
    /// Perform one round trip and return the full rule set
    async fn fetch_rules(&self) -> Result<RuleSet, FetchError>;

    /// Name of this source for logging
    fn source_name(&self) -> &str;
}

/// Errors from a rule source, tagged with the stage that failed
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("url join: {0}")]
    Url(#[from] url::ParseError),

    #[error("new request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("http do: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected http status {status}")]
    Status { status: u16 },

    #[error("json decode: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{message}")]
    Unavailable { message: String },
}

impl FetchError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }
}
