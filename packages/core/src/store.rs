//! Durable rule store.
//!
//! [`RuleStore`] is the persistence boundary of the detector cache: it holds
//! the last successfully compiled rule set as raw JSON together with the time
//! it was written, so a restarted process can restore its detectors without a
//! network round trip and knows when the next refresh is due.
//!
//! [`crate::repository::SqliteRuleStore`] is the production implementation.
//! [`MemoryRuleStore`] keeps everything in process and can be told to fail,
//! which is what the refresh tests use.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors from a rule store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid last updated timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("{message}")]
    Unavailable { message: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }
}

/// Persistence for the raw rule set and its last update time.
///
/// `set` must advance the last-updated time atomically with the value: a
/// `get_last_updated` issued after a successful `set` observes the new time.
#[async_trait]
pub trait RuleStore {
    /// Raw stored rule set, or `None` when nothing was ever stored.
    async fn get(&self) -> Result<Option<String>, StoreError>;

    /// Replace the stored rule set and advance the last-updated time.
    async fn set(&self, raw: &str) -> Result<(), StoreError>;

    /// Time of the last successful `set`, or the Unix epoch if there was none.
    async fn get_last_updated(&self) -> Result<DateTime<Utc>, StoreError>;
}

#[derive(Debug)]
struct MemoryState {
    value: Option<String>,
    last_updated: DateTime<Utc>,
}

/// In-process [`RuleStore`] with switchable failures.
#[derive(Debug)]
pub struct MemoryRuleStore {
    state: RwLock<MemoryState>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_last_updated: AtomicBool,
}

impl MemoryRuleStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::from_state(None, DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Create a store that already holds `raw`, written at `last_updated`.
    pub fn with_value(raw: impl Into<String>, last_updated: DateTime<Utc>) -> Self {
        Self::from_state(Some(raw.into()), last_updated)
    }

    /// Create an empty store whose last update was at `last_updated`.
    pub fn with_last_updated(last_updated: DateTime<Utc>) -> Self {
        Self::from_state(None, last_updated)
    }

    fn from_state(value: Option<String>, last_updated: DateTime<Utc>) -> Self {
        Self {
            state: RwLock::new(MemoryState { value, last_updated }),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_last_updated: AtomicBool::new(false),
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_last_updated(&self, fail: bool) {
        self.fail_last_updated.store(fail, Ordering::SeqCst);
    }
}

impl Default for MemoryRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn get(&self) -> Result<Option<String>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("memory store: reads disabled"));
        }
        Ok(self.state.read().await.value.clone())
    }

    async fn set(&self, raw: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("memory store: writes disabled"));
        }
        let mut state = self.state.write().await;
        state.value = Some(raw.to_string());
        state.last_updated = Utc::now();
        Ok(())
    }

    async fn get_last_updated(&self) -> Result<DateTime<Utc>, StoreError> {
        if self.fail_last_updated.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("memory store: last updated disabled"));
        }
        Ok(self.state.read().await.last_updated)
    }
}
