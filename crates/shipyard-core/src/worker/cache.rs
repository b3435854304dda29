//! Named response caches persisted in the shared libSQL database.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use http::StatusCode;
use libsql::{params_from_iter, Value};
use tokio::sync::Mutex;

use super::fetch::FetchResponse;
use crate::db::{format_timestamp, Database};
use crate::error::{Error, Result};

/// Versioned, named response caches.
///
/// A cache exists for as long as it holds at least one entry.
pub trait CacheStorage: Clone + Send + Sync + 'static {
    fn put(
        &self,
        cache: &str,
        key: &str,
        response: &FetchResponse,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Look `key` up in one cache
    fn match_in(
        &self,
        cache: &str,
        key: &str,
    ) -> impl Future<Output = Result<Option<FetchResponse>>> + Send;

    /// Look `key` up across every cache
    fn match_any(&self, key: &str) -> impl Future<Output = Result<Option<FetchResponse>>> + Send;

    fn cache_names(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Drop a whole cache, returning whether it existed
    fn delete_cache(&self, cache: &str) -> impl Future<Output = Result<bool>> + Send;
}

#[derive(Clone)]
pub struct LibSqlCacheStorage {
    db: Arc<Mutex<Database>>,
}

impl LibSqlCacheStorage {
    pub const fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    pub async fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Arc::new(Mutex::new(
            Database::open_in_memory().await?,
        ))))
    }
}

impl CacheStorage for LibSqlCacheStorage {
    async fn put(&self, cache: &str, key: &str, response: &FetchResponse) -> Result<()> {
        let headers = serde_json::to_string(&response.headers)?;
        let db = self.db.lock().await;
        db.connection()
            .execute(
                "INSERT OR REPLACE INTO cache_entries (cache_name, request_key, status, headers, body, stored_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params_from_iter([
                    Value::Text(cache.to_string()),
                    Value::Text(key.to_string()),
                    Value::Integer(i64::from(response.status.as_u16())),
                    Value::Text(headers),
                    Value::Blob(response.body.clone()),
                    Value::Text(format_timestamp(Utc::now())),
                ]),
            )
            .await?;
        Ok(())
    }

    async fn match_in(&self, cache: &str, key: &str) -> Result<Option<FetchResponse>> {
        let db = self.db.lock().await;
        let mut rows = db
            .connection()
            .query(
                "SELECT status, headers, body FROM cache_entries WHERE cache_name = ? AND request_key = ?",
                [cache, key],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(parse_response(&row)?)),
            None => Ok(None),
        }
    }

    async fn match_any(&self, key: &str) -> Result<Option<FetchResponse>> {
        let db = self.db.lock().await;
        let mut rows = db
            .connection()
            .query(
                "SELECT status, headers, body FROM cache_entries WHERE request_key = ?
                 ORDER BY stored_at DESC LIMIT 1",
                [key],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(parse_response(&row)?)),
            None => Ok(None),
        }
    }

    async fn cache_names(&self) -> Result<Vec<String>> {
        let db = self.db.lock().await;
        let mut rows = db
            .connection()
            .query(
                "SELECT DISTINCT cache_name FROM cache_entries ORDER BY cache_name",
                (),
            )
            .await?;

        let mut names = Vec::new();
        while let Some(row) = rows.next().await? {
            names.push(row.get::<String>(0)?);
        }
        Ok(names)
    }

    async fn delete_cache(&self, cache: &str) -> Result<bool> {
        let db = self.db.lock().await;
        let removed = db
            .connection()
            .execute("DELETE FROM cache_entries WHERE cache_name = ?", [cache])
            .await?;
        Ok(removed > 0)
    }
}

fn parse_response(row: &libsql::Row) -> Result<FetchResponse> {
    let status: i64 = row.get(0)?;
    let headers: String = row.get(1)?;
    let body: Vec<u8> = row.get(2)?;

    let status = u16::try_from(status)
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or_else(|| Error::Database(format!("invalid cached status {status}")))?;

    Ok(FetchResponse {
        status,
        headers: serde_json::from_str(&headers)?,
        body,
    })
}
