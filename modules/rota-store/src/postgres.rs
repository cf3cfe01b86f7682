//! `Store` backed by Postgres.
//!
//! Values live in a single `kv` table; the pub/sub side-channel rides on
//! `pg_notify`/`LISTEN`, so every process connected to the same database is
//! part of the same broadcast domain.

use anyhow::Result;
use async_trait::async_trait;
use futures::stream;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tracing::warn;

use crate::store::{ByteStream, Store};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Create the backing table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT  PRIMARY KEY,
                value BYTEA NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let row = sqlx::query_as::<_, (Vec<u8>,)>("SELECT value FROM kv WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv (key, value) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kv WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<Vec<u8>>> {
        let rows = sqlx::query_as::<_, (Vec<u8>,)>(
            "SELECT value FROM kv WHERE key LIKE $1 ORDER BY key ASC",
        )
        .bind(format!("{}%", escape_like(prefix)))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(value,)| value).collect())
    }

    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<()> {
        // NOTIFY payloads are text; everything we publish is JSON.
        let text = std::str::from_utf8(payload)?;
        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(channel)
            .bind(text)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<ByteStream> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(channel).await?;

        let stream = stream::unfold(listener, |mut listener| async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        return Some((notification.payload().as_bytes().to_vec(), listener));
                    }
                    Err(e) => {
                        // PgListener reconnects on the next recv; don't spin.
                        warn!(error = %e, "pub/sub listener error, retrying");
                        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                    }
                }
            }
        });
        Ok(Box::pin(stream))
    }
}

/// Escape LIKE wildcards so prefixes such as `user_email:` match literally.
fn escape_like(prefix: &str) -> String {
    prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like("chore:"), "chore:");
        assert_eq!(escape_like("user_email:"), "user\\_email:");
        assert_eq!(escape_like("100%"), "100\\%");
    }
}
