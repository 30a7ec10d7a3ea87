//! SQLite-backed byte store (the on-device durable store).

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

use larder_core::{StoreError, StoreResult};

use super::r#trait::ByteStore;

/// Byte store persisted in a single SQLite table (`kv_store`).
///
/// The pool is opened lazily on first use. A single connection is used:
/// writes are serialized by SQLite anyway, and it keeps `sqlite::memory:`
/// databases alive for the lifetime of the store.
///
/// This struct is cheap to clone and is safe to share across threads.
#[derive(Debug, Clone)]
pub struct SqliteByteStore {
    url: String,
    pool: Arc<Mutex<Option<SqlitePool>>>,
}

impl SqliteByteStore {
    /// Store backed by the database at `url` (e.g. `sqlite:///path/larder.db`).
    /// The file is created if missing.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pool: Arc::new(Mutex::new(None)),
        }
    }

    /// Private in-memory database, for tests.
    pub fn in_memory() -> Self {
        Self::new("sqlite::memory:")
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open the pool and create the table (called lazily on first use).
    async fn ensure_initialized(&self) -> anyhow::Result<SqlitePool> {
        let mut pool_guard = self.pool.lock().await;
        if let Some(pool) = pool_guard.as_ref() {
            return Ok(pool.clone());
        }

        let options = SqliteConnectOptions::from_str(&self.url)
            .with_context(|| format!("invalid SQLite URL '{}'", self.url))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open SQLite database at '{}'", self.url))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key         TEXT PRIMARY KEY,
                value       TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create kv_store table")?;

        tracing::debug!(url = %self.url, "sqlite byte store initialized");

        *pool_guard = Some(pool.clone());
        Ok(pool)
    }

    async fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        let pool = self.ensure_initialized().await?;

        let row = sqlx::query(
            r#"
            SELECT value
            FROM kv_store
            WHERE key = ?1
            "#,
        )
        .bind(key)
        .fetch_optional(&pool)
        .await
        .with_context(|| format!("failed to read key '{key}'"))?;

        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    async fn write(&self, key: &str, value: String) -> anyhow::Result<()> {
        let pool = self.ensure_initialized().await?;

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key)
            DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&pool)
        .await
        .with_context(|| format!("failed to write key '{key}'"))?;

        Ok(())
    }
}

fn unavailable(err: anyhow::Error) -> StoreError {
    tracing::error!("sqlite byte store failure: {err:#}");
    StoreError::unavailable(format!("{err:#}"))
}

#[async_trait]
impl ByteStore for SqliteByteStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.read(key).await.map_err(unavailable)
    }

    async fn set(&self, key: &str, value: String) -> StoreResult<()> {
        self.write(key, value).await.map_err(unavailable)
    }
}
