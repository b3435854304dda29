use std::path::Path;

use shipyard_core::config::SyncSettings;
use shipyard_core::sync::SyncReport;

use crate::commands::common::{open_service, print_json};
use crate::error::CliError;

pub fn format_sync_report(report: &SyncReport) -> Vec<String> {
    let mut lines = Vec::with_capacity(report.failed.len() + 2);
    if report.attempted == 0 {
        lines.push("Nothing to sync.".to_string());
        return lines;
    }

    lines.push(format!(
        "Pushed {} of {} queued change(s)",
        report.applied, report.attempted
    ));
    for failed in &report.failed {
        lines.push(format!(
            "  failed #{} {} {} {}: {}",
            failed.log_id, failed.action, failed.kind, failed.entity_id, failed.error
        ));
    }
    if report.remaining > 0 {
        lines.push(format!(
            "{} change(s) remain queued; run `shipyard sync` again later",
            report.remaining
        ));
    }
    lines
}

pub async fn run_sync(
    as_json: bool,
    offline: bool,
    settings: &SyncSettings,
    db_path: &Path,
) -> Result<(), CliError> {
    let service = open_service(db_path, settings, offline).await?;
    let report = service.sync_now().await?;

    if as_json {
        return print_json(&report);
    }
    for line in format_sync_report(&report) {
        println!("{line}");
    }
    Ok(())
}
