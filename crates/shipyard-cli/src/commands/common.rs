use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shipyard_core::clock::SystemClock;
use shipyard_core::config::SyncSettings;
use shipyard_core::db::{LibSqlLocalStore, LocalStore, RecordFilter};
use shipyard_core::sync::{SupabaseRemoteStore, SyncQueueWriter};
use shipyard_core::{ConnectivityObserver, OfflineSyncService, Record};

use crate::error::CliError;

/// Owner recorded on new rows when no user is configured
pub const LOCAL_USER_ID: &str = "local";

pub type CliService = OfflineSyncService<LibSqlLocalStore, SupabaseRemoteStore>;

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("SHIPYARD_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shipyard")
        .join("shipyard.db")
}

pub fn resolve_user_id(cli_user: Option<String>, settings: &SyncSettings) -> String {
    cli_user
        .and_then(|user| normalize_text(&user))
        .or_else(|| settings.user_id.clone())
        .unwrap_or_else(|| LOCAL_USER_ID.to_string())
}

pub async fn open_store(db_path: &Path) -> Result<LibSqlLocalStore, CliError> {
    Ok(LibSqlLocalStore::open_path(db_path).await?)
}

pub async fn open_writer(db_path: &Path) -> Result<SyncQueueWriter<LibSqlLocalStore>, CliError> {
    Ok(SyncQueueWriter::with_system_clock(open_store(db_path).await?))
}

/// Full sync stack; requires remote credentials.
pub async fn open_service(
    db_path: &Path,
    settings: &SyncSettings,
    offline: bool,
) -> Result<CliService, CliError> {
    let remote_config = settings
        .remote_config()
        .ok_or(CliError::SyncNotConfigured)?;
    let remote = SupabaseRemoteStore::new(&remote_config)?;
    let store = open_store(db_path).await?;

    let connectivity = ConnectivityObserver::new();
    connectivity.set_online(!offline);

    Ok(OfflineSyncService::new(
        store,
        remote,
        connectivity,
        Arc::new(SystemClock),
        settings.sync_options(),
    ))
}

pub fn normalize_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Join positional words into one value, rejecting blank input
pub fn join_words(parts: &[String], what: &'static str) -> Result<String, CliError> {
    normalize_text(&parts.join(" ")).ok_or(CliError::EmptyValue(what))
}

pub async fn list_records<T: Record>(
    db_path: &Path,
    filter: &RecordFilter,
    limit: usize,
) -> Result<Vec<T>, CliError> {
    let store = open_store(db_path).await?;
    let records = store.query(T::KIND, filter).await?;
    Ok(records
        .into_iter()
        .filter_map(T::from_entity)
        .take(limit)
        .collect())
}

/// Find a record by exact id, falling back to a unique id prefix.
pub async fn resolve_record<T: Record, S: LocalStore>(
    store: &S,
    query: &str,
) -> Result<T, CliError> {
    let query = normalize_text(query).ok_or(CliError::EmptyValue("ID"))?;
    if let Some(entity) = store.get(T::KIND, &query).await? {
        if let Some(record) = T::from_entity(entity) {
            return Ok(record);
        }
    }

    let mut matches: Vec<T> = store
        .query(T::KIND, &RecordFilter::default())
        .await?
        .into_iter()
        .filter(|entity| entity.id().starts_with(&query))
        .filter_map(T::from_entity)
        .collect();

    match matches.len() {
        0 => Err(CliError::NotFound {
            kind: T::KIND,
            query,
        }),
        1 => Ok(matches.remove(0)),
        _ => {
            let options = matches
                .iter()
                .take(3)
                .map(|record| short_id(record.id()))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousId(format!(
                "ID prefix '{query}' matches multiple {}: {options}",
                T::KIND
            )))
        }
    }
}

pub fn short_id(id: &str) -> String {
    id.chars().take(13).collect()
}

pub fn sync_marker(synced: bool) -> &'static str {
    if synced {
        " "
    } else {
        "*"
    }
}

pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - timestamp).num_milliseconds().max(0);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
