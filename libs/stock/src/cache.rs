use std::{path::Path, time::Duration};

use chrono::Utc;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous},
};
use tracing::{debug, info};

use crate::error::Result;

/// File-backed store of provider response bodies, keyed by request.
///
/// Survives restarts. A `ttl` of `None` keeps entries forever.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    pool: SqlitePool,
    ttl: Option<Duration>,
}

impl ResponseCache {
    pub async fn open(path: &Path, ttl: Option<Duration>) -> Result<Self> {
        info!(path = ?path, ttl_secs = ttl.map(|t| t.as_secs()), "opening response cache");

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(sqlx::Error::Io)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePool::connect_with(options).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS http_cache (
                key TEXT PRIMARY KEY,
                body BLOB NOT NULL,
                stored_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        let cache = Self { pool, ttl };
        let purged = cache.purge_expired().await?;
        if purged > 0 {
            info!(purged, "dropped expired cache entries");
        }

        Ok(cache)
    }

    fn cutoff(&self) -> Option<i64> {
        self.ttl
            .map(|ttl| Utc::now().timestamp() - ttl.as_secs() as i64)
    }

    /// Fresh body for `key`, if any.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>, i64)> =
            sqlx::query_as("SELECT body, stored_at FROM http_cache WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(match (row, self.cutoff()) {
            (Some((_, stored_at)), Some(cutoff)) if stored_at <= cutoff => {
                debug!(key, "cache entry expired");
                None
            }
            (row, _) => row.map(|(body, _)| body),
        })
    }

    pub async fn put(&self, key: &str, body: &[u8]) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO http_cache (key, body, stored_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET body = excluded.body, stored_at = excluded.stored_at
            "#,
        )
        .bind(key)
        .bind(body)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete entries past the TTL. Returns how many rows went away.
    pub async fn purge_expired(&self) -> Result<u64> {
        let Some(cutoff) = self.cutoff() else {
            return Ok(0);
        };

        let done = sqlx::query("DELETE FROM http_cache WHERE stored_at <= ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(done.rows_affected())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Cache key for a GET: URL plus query pairs sorted by name.
pub fn cache_key(url: &str, query: &[(&str, &str)]) -> String {
    let mut pairs: Vec<_> = query.to_vec();
    pairs.sort();

    let query = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!("GET {url}?{query}")
}
