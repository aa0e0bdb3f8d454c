use thiserror::Error;

use crate::rules::CompileError;
use crate::services::FetchError;
use crate::store::StoreError;

/// Failure of a refresh cycle, a startup restore, or the refresh loop.
///
/// Each variant names the stage that failed, so a logged error reads like
/// `store set: database: ...`.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("fetch: {0}")]
    Fetch(#[from] FetchError),

    #[error("convert rules to detectors: {0}")]
    Compile(#[from] CompileError),

    #[error("encode rules: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("decode stored rules: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("store get: {0}")]
    StoreRead(#[source] StoreError),

    #[error("store set: {0}")]
    StoreWrite(#[source] StoreError),

    #[error("get last updated: {0}")]
    LastUpdated(#[source] StoreError),

    #[error("refresh loop cancelled")]
    Cancelled,
}

/// Unified application error.
///
/// Everything the binary can fail on before or while serving, so `main`
/// has a single place to log and exit.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Rules client error: {0}")]
    Client(#[from] FetchError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Refresh error: {0}")]
    Refresh(#[from] RefreshError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
