//! Request classification and the caching strategies applied per class.

use http::StatusCode;

use super::cache::CacheStorage;
use super::fetch::{FetchRequest, FetchResponse, Fetcher};
use crate::config::WorkerConfig;

/// Body `error` of the synthesized response for an uncached API request
pub const OFFLINE_API_ERROR: &str = "Offline - data not available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Backend data; network-first
    Api,
    /// Page loads; network-first with the offline page as last resort
    Navigation,
    /// Everything else; cache-first
    Static,
}

pub fn classify(request: &FetchRequest, config: &WorkerConfig) -> RequestClass {
    if config.is_api_url(&request.url) {
        RequestClass::Api
    } else if request.is_navigation() {
        RequestClass::Navigation
    } else {
        RequestClass::Static
    }
}

pub fn offline_api_response() -> FetchResponse {
    FetchResponse::json(
        StatusCode::SERVICE_UNAVAILABLE,
        &serde_json::json!({ "error": OFFLINE_API_ERROR }),
    )
}

pub fn offline_text_response() -> FetchResponse {
    FetchResponse::text(StatusCode::SERVICE_UNAVAILABLE, "Offline")
}

/// Try the network and store successful responses in `cache`; when the
/// network fails fall back to any cached copy of the request.
///
/// `None` means neither the network nor the caches could answer.
pub async fn network_first<F: Fetcher, C: CacheStorage>(
    fetcher: &F,
    caches: &C,
    cache: &str,
    request: &FetchRequest,
) -> Option<FetchResponse> {
    let key = request.cache_key();
    match fetcher.fetch(request).await {
        Ok(response) => {
            if response.is_success() {
                store(caches, cache, &key, &response).await;
            }
            Some(response)
        }
        Err(e) => {
            tracing::debug!("Network failed for {}: {}; trying cache", request.url, e);
            lookup(caches, &key).await
        }
    }
}

/// Serve from any cache without touching the network; on a miss fetch and
/// store successful responses in `cache`.
pub async fn cache_first<F: Fetcher, C: CacheStorage>(
    fetcher: &F,
    caches: &C,
    cache: &str,
    request: &FetchRequest,
) -> Option<FetchResponse> {
    let key = request.cache_key();
    if let Some(hit) = lookup(caches, &key).await {
        tracing::debug!("Cache hit for {}", request.url);
        return Some(hit);
    }

    tracing::debug!("Cache miss for {}", request.url);
    match fetcher.fetch(request).await {
        Ok(response) => {
            if response.is_success() {
                store(caches, cache, &key, &response).await;
            }
            Some(response)
        }
        Err(e) => {
            tracing::debug!("Network failed for {}: {}", request.url, e);
            None
        }
    }
}

/// Cache lookups never fail a request; storage errors count as a miss.
pub(super) async fn lookup<C: CacheStorage>(caches: &C, key: &str) -> Option<FetchResponse> {
    caches.match_any(key).await.unwrap_or_else(|e| {
        tracing::warn!("Cache lookup for {} failed: {}", key, e);
        None
    })
}

async fn store<C: CacheStorage>(caches: &C, cache: &str, key: &str, response: &FetchResponse) {
    if let Err(e) = caches.put(cache, key, response).await {
        tracing::warn!("Failed to cache {} in {}: {}", key, cache, e);
    }
}
