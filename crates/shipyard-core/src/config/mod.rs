//! Runtime configuration for the sync layer and the cache worker.

mod worker;

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::sync::{RemoteConfig, SyncOptions, SyncedFlagPolicy, DEFAULT_REMOTE_TIMEOUT};
use crate::util::{is_http_url, normalize_text_option};

pub use worker::{CacheNames, WorkerConfig, BACKGROUND_SYNC_TAG};

/// Default interval of the periodic background sync signal
pub const DEFAULT_BACKGROUND_SYNC_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings read from the environment.
///
/// Remote credentials are optional: without them the local store and the
/// writer still work, and only push/pull are unavailable.
#[derive(Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub access_token: Option<String>,
    pub user_id: Option<String>,
    pub remote_timeout: Duration,
    pub synced_policy: SyncedFlagPolicy,
    pub background_sync_interval: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_anon_key: None,
            access_token: None,
            user_id: None,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            synced_policy: SyncedFlagPolicy::default(),
            background_sync_interval: DEFAULT_BACKGROUND_SYNC_INTERVAL,
        }
    }
}

impl fmt::Debug for SyncSettings {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SyncSettings")
            .field("supabase_url", &self.supabase_url)
            .field(
                "supabase_anon_key",
                &self.supabase_anon_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("user_id", &self.user_id)
            .field("remote_timeout", &self.remote_timeout)
            .field("synced_policy", &self.synced_policy)
            .field("background_sync_interval", &self.background_sync_interval)
            .finish()
    }
}

impl SyncSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let supabase_url = optional_trimmed(&lookup, "SUPABASE_URL");
        if let Some(url) = &supabase_url {
            if !is_http_url(url) {
                return Err(ConfigError::Invalid(
                    "SUPABASE_URL must start with http:// or https://".to_string(),
                ));
            }
        }

        let remote_timeout = parse_secs(
            &lookup,
            "SHIPYARD_REMOTE_TIMEOUT_SECS",
            DEFAULT_REMOTE_TIMEOUT,
        )?;
        let background_sync_interval = parse_secs(
            &lookup,
            "SHIPYARD_BACKGROUND_SYNC_SECS",
            DEFAULT_BACKGROUND_SYNC_INTERVAL,
        )?;

        let synced_policy = match optional_trimmed(&lookup, "SHIPYARD_SYNCED_POLICY") {
            Some(value) => value.parse().map_err(|_| {
                ConfigError::Invalid(format!(
                    "SHIPYARD_SYNCED_POLICY must be pull-only or on-push, got {value:?}"
                ))
            })?,
            None => SyncedFlagPolicy::default(),
        };

        Ok(Self {
            supabase_url,
            supabase_anon_key: optional_trimmed(&lookup, "SUPABASE_ANON_KEY"),
            access_token: optional_trimmed(&lookup, "SHIPYARD_ACCESS_TOKEN"),
            user_id: optional_trimmed(&lookup, "SHIPYARD_USER_ID"),
            remote_timeout,
            synced_policy,
            background_sync_interval,
        })
    }

    /// Remote connection settings, when both URL and anon key are present
    pub fn remote_config(&self) -> Option<RemoteConfig> {
        Some(RemoteConfig {
            url: self.supabase_url.clone()?,
            anon_key: self.supabase_anon_key.clone()?,
            access_token: self.access_token.clone(),
        })
    }

    /// Like [`Self::remote_config`], naming the first missing variable
    pub fn require_remote_config(&self) -> Result<RemoteConfig, ConfigError> {
        if self.supabase_url.is_none() {
            return Err(ConfigError::MissingVar("SUPABASE_URL"));
        }
        self.remote_config()
            .ok_or(ConfigError::MissingVar("SUPABASE_ANON_KEY"))
    }

    pub const fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            remote_timeout: self.remote_timeout,
            synced_policy: self.synced_policy,
        }
    }

    /// Cache worker settings with the configured background sync interval.
    /// A zero interval disables periodic sync.
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            periodic_sync_interval: Some(self.background_sync_interval)
                .filter(|interval| !interval.is_zero()),
            ..WorkerConfig::default()
        }
    }
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    normalize_text_option(lookup(name))
}

fn parse_secs(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let Some(raw) = optional_trimmed(lookup, name) else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(ConfigError::Invalid(format!(
            "{name} must be a positive whole number of seconds"
        ))),
        Ok(secs) => Ok(Duration::from_secs(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |name| values.get(name).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let settings = SyncSettings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings, SyncSettings::default());
        assert!(settings.remote_config().is_none());
        assert_eq!(settings.sync_options(), SyncOptions::default());
    }

    #[test]
    fn reads_remote_and_sync_settings() {
        let settings = SyncSettings::from_lookup(lookup_from(&[
            ("SUPABASE_URL", " https://example.supabase.co "),
            ("SUPABASE_ANON_KEY", "anon"),
            ("SHIPYARD_ACCESS_TOKEN", "session"),
            ("SHIPYARD_USER_ID", "user-1"),
            ("SHIPYARD_REMOTE_TIMEOUT_SECS", "3"),
            ("SHIPYARD_SYNCED_POLICY", "on-push"),
        ]))
        .unwrap();

        let remote = settings.require_remote_config().unwrap();
        assert_eq!(remote.url, "https://example.supabase.co");
        assert_eq!(remote.access_token.as_deref(), Some("session"));
        assert_eq!(settings.user_id.as_deref(), Some("user-1"));
        assert_eq!(settings.remote_timeout, Duration::from_secs(3));
        assert_eq!(settings.synced_policy, SyncedFlagPolicy::OnPush);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(SyncSettings::from_lookup(lookup_from(&[("SUPABASE_URL", "example.com")])).is_err());
        assert!(SyncSettings::from_lookup(lookup_from(&[(
            "SHIPYARD_REMOTE_TIMEOUT_SECS",
            "0"
        )]))
        .is_err());
        assert!(SyncSettings::from_lookup(lookup_from(&[(
            "SHIPYARD_SYNCED_POLICY",
            "always"
        )]))
        .is_err());
    }

    #[test]
    fn missing_anon_key_is_named() {
        let settings = SyncSettings::from_lookup(lookup_from(&[(
            "SUPABASE_URL",
            "https://example.supabase.co",
        )]))
        .unwrap();
        assert!(matches!(
            settings.require_remote_config(),
            Err(ConfigError::MissingVar("SUPABASE_ANON_KEY"))
        ));
    }

    #[test]
    fn debug_redacts_secrets() {
        let settings = SyncSettings::from_lookup(lookup_from(&[
            ("SUPABASE_ANON_KEY", "anon-secret"),
            ("SHIPYARD_ACCESS_TOKEN", "token-secret"),
        ]))
        .unwrap();
        let debug = format!("{settings:?}");
        assert!(!debug.contains("anon-secret"));
        assert!(!debug.contains("token-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn worker_config_follows_background_interval() {
        let settings =
            SyncSettings::from_lookup(lookup_from(&[("SHIPYARD_BACKGROUND_SYNC_SECS", "60")]))
                .unwrap();
        assert_eq!(
            settings.worker_config().periodic_sync_interval,
            Some(Duration::from_secs(60))
        );

        let disabled = SyncSettings {
            background_sync_interval: Duration::ZERO,
            ..SyncSettings::default()
        };
        assert_eq!(disabled.worker_config().periodic_sync_interval, None);
    }
}
