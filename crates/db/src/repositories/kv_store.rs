use async_trait::async_trait;
use chrono::Utc;
use footprint_core::store::{PersistentStore, StoreError};
use serde_json::Value;
use sqlx::Row;

use super::RepositoryError;
use crate::DbPool;

/// SQLite-backed `PersistentStore`. One row per key; values are JSON text.
pub struct SqlKeyValueStore {
    pool: DbPool,
}

impl SqlKeyValueStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn keys(&self) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query("SELECT key FROM kv_store ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| row.try_get::<String, _>("key").map_err(Into::into)).collect()
    }

    async fn read(&self, key: &str) -> Result<Option<Value>, RepositoryError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get("value")?;
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|error| RepositoryError::Decode { key: key.to_string(), message: error.to_string() })
    }

    async fn write(&self, key: &str, value: &Value) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl PersistentStore for SqlKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.read(key).await?)
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        Ok(self.write(key, &value).await?)
    }
}
