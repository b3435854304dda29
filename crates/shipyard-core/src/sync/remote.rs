//! Remote store seam and the Supabase (PostgREST) implementation.

use std::future::Future;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::db::RecordFilter;
use crate::models::{Entity, EntityKind};
use crate::util::{compact_text, normalize_base_url, normalize_text_option};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Remote HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote API error: {message}")]
    Api { status: u16, message: String },
    #[error("Remote call timed out after {0:?}")]
    Timeout(Duration),
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid remote payload: {0}")]
    Decode(String),
}

impl RemoteError {
    /// The target row does not exist remotely
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Hosted backend the operation log is replayed against.
///
/// `insert` must be idempotent for an id that already exists so a replayed
/// create does not fail after a partially acknowledged sync.
pub trait RemoteStore: Clone + Send + Sync + 'static {
    fn insert(&self, entity: &Entity) -> impl Future<Output = RemoteResult<()>> + Send;

    fn update(&self, entity: &Entity) -> impl Future<Output = RemoteResult<()>> + Send;

    fn delete(&self, kind: EntityKind, id: &str) -> impl Future<Output = RemoteResult<()>> + Send;

    fn select(
        &self,
        kind: EntityKind,
        filter: &RecordFilter,
    ) -> impl Future<Output = RemoteResult<Vec<Entity>>> + Send;
}

/// Connection settings for [`SupabaseRemoteStore`]
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub url: String,
    pub anon_key: String,
    /// User session token; the anon key is sent as bearer when absent
    pub access_token: Option<String>,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RemoteConfig")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// PostgREST client for the `apps`, `ideas`, `tasks` and `notes` tables
#[derive(Clone)]
pub struct SupabaseRemoteStore {
    rest_url: String,
    anon_key: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for SupabaseRemoteStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SupabaseRemoteStore")
            .field("rest_url", &self.rest_url)
            .finish_non_exhaustive()
    }
}

impl SupabaseRemoteStore {
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        let base_url = normalize_base_url(&config.url).ok_or_else(|| {
            RemoteError::InvalidConfiguration(
                "Supabase URL must include http:// or https://".to_string(),
            )
        })?;
        let anon_key = normalize_text_option(Some(config.anon_key.clone())).ok_or_else(|| {
            RemoteError::InvalidConfiguration("Supabase anon key must not be empty".to_string())
        })?;

        Ok(Self {
            rest_url: format!("{base_url}/rest/v1"),
            anon_key,
            access_token: normalize_text_option(config.access_token.clone()),
            client: reqwest::Client::builder().build()?,
        })
    }

    fn request(&self, method: Method, kind: EntityKind) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        self.client
            .request(method, format!("{}/{}", self.rest_url, kind.table_name()))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
            .header("Accept", "application/json")
    }

    async fn send(request: RequestBuilder) -> RemoteResult<reqwest::Response> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Api {
            status: status.as_u16(),
            message: parse_api_error(status, &body),
        })
    }
}

impl RemoteStore for SupabaseRemoteStore {
    async fn insert(&self, entity: &Entity) -> RemoteResult<()> {
        let row = entity
            .to_remote_row()
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        let request = self
            .request(Method::POST, entity.kind())
            .header("Prefer", "return=minimal,resolution=merge-duplicates")
            .json(&row);
        Self::send(request).await?;
        Ok(())
    }

    async fn update(&self, entity: &Entity) -> RemoteResult<()> {
        let row = entity
            .to_remote_row()
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        let request = self
            .request(Method::PATCH, entity.kind())
            .query(&[("id", format!("eq.{}", entity.id()))])
            .header("Prefer", "return=minimal")
            .json(&row);
        Self::send(request).await?;
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> RemoteResult<()> {
        let request = self
            .request(Method::DELETE, kind)
            .query(&[("id", format!("eq.{id}"))]);
        match Self::send(request).await {
            Ok(_) => Ok(()),
            Err(error) if error.is_not_found() => Ok(()),
            Err(error) => Err(error),
        }
    }

    async fn select(&self, kind: EntityKind, filter: &RecordFilter) -> RemoteResult<Vec<Entity>> {
        let request = self
            .request(Method::GET, kind)
            .query(&select_query(filter));
        let rows = Self::send(request)
            .await?
            .json::<Vec<serde_json::Value>>()
            .await?;

        rows.into_iter()
            .map(|row| {
                let mut entity = Entity::from_payload(kind, row)
                    .map_err(|e| RemoteError::Decode(format!("{kind} row: {e}")))?;
                entity.set_synced(true);
                Ok(entity)
            })
            .collect()
    }
}

/// PostgREST query pairs for `filter`; the local-only `synced` flag is ignored
fn select_query(filter: &RecordFilter) -> Vec<(&'static str, String)> {
    let mut query = vec![("select", "*".to_string())];
    if let Some(user_id) = &filter.user_id {
        query.push(("user_id", format!("eq.{user_id}")));
    }
    if let Some(app_id) = &filter.app_id {
        query.push(("app_id", format!("eq.{app_id}")));
    }
    if let Some(status) = &filter.status {
        query.push(("status", format!("eq.{status}")));
    }
    query.push(("order", "created_at.desc".to_string()));
    query
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    message: Option<String>,
    error: Option<String>,
    hint: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<PostgrestErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return match payload.hint {
                Some(hint) => format!("{} ({}; {})", message.trim(), status.as_u16(), hint.trim()),
                None => format!("{} ({})", message.trim(), status.as_u16()),
            };
        }
    }

    let compact = compact_text(body);
    if compact.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", compact, status.as_u16())
    }
}
