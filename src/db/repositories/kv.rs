use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::db::{helpers::parse_datetime, Database};

/// A raw value from `kv_store` with its last write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

impl Database {
    pub async fn get_value(&self, key: &str) -> Result<Option<StoredValue>> {
        let key = key.to_string();
        self.execute(move |conn| {
            let row = conn
                .query_row(
                    "SELECT value, updated_at FROM kv_store WHERE key = ?1",
                    params![key],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()
                .with_context(|| format!("failed to read key {key}"))?;

            row.map(|(value, updated_at)| -> Result<StoredValue> {
                Ok(StoredValue {
                    value,
                    updated_at: parse_datetime(&updated_at, "updated_at")?,
                })
            })
            .transpose()
        })
        .await
    }

    /// Inserts or replaces the value stored under `key`.
    pub async fn put_value(&self, key: &str, value: String) -> Result<()> {
        let key = key.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("failed to write key {key}"))?;
            Ok(())
        })
        .await
    }

    /// Returns whether a value was present.
    pub async fn remove_value(&self, key: &str) -> Result<bool> {
        let key = key.to_string();
        self.execute(move |conn| {
            let rows_affected = conn
                .execute("DELETE FROM kv_store WHERE key = ?1", params![key])
                .with_context(|| format!("failed to remove key {key}"))?;
            Ok(rows_affected > 0)
        })
        .await
    }
}
