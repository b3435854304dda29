use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shipyard_core::db::LocalStore;
use shipyard_core::{EntityKind, SyncAction, SyncEntry};

use crate::commands::common::{format_relative_time, open_store, print_json, short_id};
use crate::error::CliError;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct QueueItem {
    pub log_id: i64,
    pub action: SyncAction,
    pub kind: EntityKind,
    pub entity_id: String,
    pub queued_at: DateTime<Utc>,
}

pub fn sync_entry_to_item(entry: &SyncEntry) -> QueueItem {
    QueueItem {
        log_id: entry.id,
        action: entry.action,
        kind: entry.kind(),
        entity_id: entry.entity_id().to_string(),
        queued_at: entry.timestamp,
    }
}

pub async fn list_queue(db_path: &Path) -> Result<Vec<QueueItem>, CliError> {
    let store = open_store(db_path).await?;
    let entries = store.drain_log().await?;
    Ok(entries.iter().map(sync_entry_to_item).collect())
}

pub fn format_queue_lines(items: &[QueueItem], now: DateTime<Utc>) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            format!(
                "#{:<4} {:<6} {:<5} {} ({})",
                item.log_id,
                item.action,
                item.kind,
                short_id(&item.entity_id),
                format_relative_time(item.queued_at, now)
            )
        })
        .collect()
}

pub async fn run_queue(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let items = list_queue(db_path).await?;

    if as_json {
        return print_json(&items);
    }
    if items.is_empty() {
        println!("Nothing queued. Local data matches the server.");
        return Ok(());
    }

    println!("{} change(s) waiting to sync:", items.len());
    for line in format_queue_lines(&items, Utc::now()) {
        println!("{line}");
    }
    Ok(())
}
