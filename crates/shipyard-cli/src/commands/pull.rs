use std::path::Path;

use shipyard_core::config::SyncSettings;
use shipyard_core::db::RecordFilter;
use shipyard_core::sync::PullSummary;
use shipyard_core::EntityKind;

use crate::commands::common::open_service;
use crate::error::CliError;

pub async fn run_pull(
    kind: Option<EntityKind>,
    user_id: &str,
    offline: bool,
    settings: &SyncSettings,
    db_path: &Path,
) -> Result<(), CliError> {
    let service = open_service(db_path, settings, offline).await?;
    let filter = RecordFilter::default().for_user(user_id);
    let reconciler = service.reconciler();
    let summary = match kind {
        None => reconciler.pull_all_from_server(&filter).await?,
        Some(EntityKind::Apps) => PullSummary {
            apps: reconciler.pull_apps_from_server(&filter).await?.len(),
            ..PullSummary::default()
        },
        Some(EntityKind::Ideas) => PullSummary {
            ideas: reconciler.pull_ideas_from_server(&filter).await?.len(),
            ..PullSummary::default()
        },
        Some(EntityKind::Tasks) => PullSummary {
            tasks: reconciler.pull_tasks_from_server(&filter).await?.len(),
            ..PullSummary::default()
        },
        Some(EntityKind::Notes) => PullSummary {
            notes: reconciler.pull_notes_from_server(&filter).await?.len(),
            ..PullSummary::default()
        },
    };

    println!(
        "Pulled {} record(s): {} apps, {} ideas, {} tasks, {} notes",
        summary.total(),
        summary.apps,
        summary.ideas,
        summary.tasks,
        summary.notes
    );
    Ok(())
}
