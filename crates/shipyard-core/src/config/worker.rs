//! Cache worker settings.

use std::time::Duration;

use super::DEFAULT_BACKGROUND_SYNC_INTERVAL;
use crate::util::is_http_url;

/// Tag of the one-off and periodic background sync registrations
pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

/// The three cache names owned by one worker version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
    pub main: String,
    pub static_assets: String,
    pub dynamic: String,
}

impl CacheNames {
    pub fn for_version(version: &str) -> Self {
        Self {
            main: format!("shipyard-{version}"),
            static_assets: format!("shipyard-static-{version}"),
            dynamic: format!("shipyard-dynamic-{version}"),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        name == self.main || name == self.static_assets || name == self.dynamic
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Origin the asset manifest is fetched from, without trailing slash
    pub origin: String,
    /// Bumped on every release; old caches are dropped on activation
    pub cache_version: String,
    /// Paths pre-cached on install
    pub static_assets: Vec<String>,
    /// URL substrings that mark a request as an API call
    pub api_patterns: Vec<String>,
    pub offline_page: String,
    pub sync_tag: String,
    /// Periodic background sync interval; `None` skips registration
    pub periodic_sync_interval: Option<Duration>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:5173".to_string(),
            cache_version: "v1".to_string(),
            static_assets: ["/", "/index.html", "/offline.html", "/manifest.json", "/favicon.ico"]
                .map(str::to_string)
                .to_vec(),
            api_patterns: vec!["/api/".to_string(), "/rest/v1/".to_string()],
            offline_page: "/offline.html".to_string(),
            sync_tag: BACKGROUND_SYNC_TAG.to_string(),
            periodic_sync_interval: Some(DEFAULT_BACKGROUND_SYNC_INTERVAL),
        }
    }
}

impl WorkerConfig {
    pub fn cache_names(&self) -> CacheNames {
        CacheNames::for_version(&self.cache_version)
    }

    /// Absolute URL for a manifest path
    pub fn asset_url(&self, path: &str) -> String {
        if is_http_url(path) {
            path.to_string()
        } else {
            format!("{}{}", self.origin.trim_end_matches('/'), path)
        }
    }

    pub fn is_api_url(&self, url: &str) -> bool {
        self.api_patterns
            .iter()
            .any(|pattern| url.contains(pattern.as_str()))
    }
}
