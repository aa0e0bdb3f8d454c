//! SQLite-backed rule store.
//!
//! Rules live in the generic `kv_store` table under the
//! `plugin.angularpatterns` namespace: the raw rule set JSON under
//! [`RULES_KEY`] and the RFC 3339 time of the last write under
//! [`LAST_UPDATED_KEY`]. [`SqliteRuleStore::set`] writes both rows in one
//! transaction so a reader of the timestamp never sees it out of step with
//! the value.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::store::{RuleStore, StoreError};

pub const NAMESPACE: &str = "plugin.angularpatterns";
pub const RULES_KEY: &str = "angular_patterns";
pub const LAST_UPDATED_KEY: &str = "last_updated";

/// [`RuleStore`] on top of a SQLite pool.
#[derive(Clone)]
pub struct SqliteRuleStore {
    pool: SqlitePool,
}

impl SqliteRuleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn get_key(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE namespace = ? AND key = ?")
            .bind(NAMESPACE)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| row.try_get::<String, _>("value")).transpose()
    }
}

const UPSERT: &str = "INSERT INTO kv_store (namespace, key, value, updated_at)
     VALUES (?, ?, ?, ?)
     ON CONFLICT (namespace, key) DO UPDATE SET
         value = excluded.value,
         updated_at = excluded.updated_at";

#[async_trait]
impl RuleStore for SqliteRuleStore {
    async fn get(&self) -> Result<Option<String>, StoreError> {
        Ok(self.get_key(RULES_KEY).await?)
    }

    async fn set(&self, raw: &str) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for (key, value) in [(RULES_KEY, raw), (LAST_UPDATED_KEY, now.as_str())] {
            sqlx::query(UPSERT)
                .bind(NAMESPACE)
                .bind(key)
                .bind(value)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_last_updated(&self) -> Result<DateTime<Utc>, StoreError> {
        let Some(value) = self.get_key(LAST_UPDATED_KEY).await? else {
            return Ok(DateTime::<Utc>::UNIX_EPOCH);
        };

        DateTime::parse_from_rfc3339(&value)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|source| StoreError::Timestamp { value, source })
    }
}
