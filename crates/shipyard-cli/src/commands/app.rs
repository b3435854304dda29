use std::path::Path;

use chrono::Utc;
use shipyard_core::db::RecordFilter;
use shipyard_core::models::AppStatus;
use shipyard_core::util::is_http_url;
use shipyard_core::App;

use crate::commands::common::{
    format_relative_time, join_words, list_records, normalize_text, open_writer, print_json,
    resolve_record, short_id, sync_marker,
};
use crate::error::CliError;

pub async fn add_app(
    name_parts: &[String],
    description: Option<&str>,
    url: Option<&str>,
    user_id: &str,
    db_path: &Path,
) -> Result<App, CliError> {
    let name = join_words(name_parts, "App name")?;
    let mut app = App::new(user_id, name);
    app.description = description.and_then(normalize_text);
    app.url = url.and_then(normalize_text);
    if let Some(url) = app.url.as_deref() {
        if !is_http_url(url) {
            return Err(shipyard_core::Error::InvalidInput(format!(
                "App URL must start with http:// or https://: {url}"
            ))
            .into());
        }
    }

    let writer = open_writer(db_path).await?;
    Ok(writer.create_app(app).await?)
}

pub async fn run_add(
    name_parts: &[String],
    description: Option<&str>,
    url: Option<&str>,
    user_id: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let app = add_app(name_parts, description, url, user_id, db_path).await?;
    println!("{}", app.id);
    Ok(())
}

pub async fn list_apps(
    status: Option<AppStatus>,
    limit: usize,
    user_id: &str,
    db_path: &Path,
) -> Result<Vec<App>, CliError> {
    let mut filter = RecordFilter::default().for_user(user_id);
    if let Some(status) = status {
        filter = filter.with_status(status.as_str());
    }
    list_records(db_path, &filter, limit).await
}

pub fn format_app_lines(apps: &[App]) -> Vec<String> {
    let now = Utc::now();
    apps.iter()
        .map(|app| {
            format!(
                "{} {} [{:<10}] {} ({})",
                sync_marker(app.synced),
                short_id(&app.id),
                app.status,
                app.name,
                format_relative_time(app.updated_at, now)
            )
        })
        .collect()
}

pub async fn run_list(
    status: Option<AppStatus>,
    limit: usize,
    as_json: bool,
    user_id: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let apps = list_apps(status, limit, user_id, db_path).await?;

    if as_json {
        return print_json(&apps);
    }
    if apps.is_empty() {
        println!("No apps yet.");
        return Ok(());
    }
    for line in format_app_lines(&apps) {
        println!("{line}");
    }
    Ok(())
}

pub async fn set_app_status(id: &str, status: AppStatus, db_path: &Path) -> Result<App, CliError> {
    let writer = open_writer(db_path).await?;
    let mut app: App = resolve_record(writer.store(), id).await?;
    app.status = status;
    Ok(writer.update_app(app).await?)
}

pub async fn run_status(id: &str, status: AppStatus, db_path: &Path) -> Result<(), CliError> {
    let app = set_app_status(id, status, db_path).await?;
    println!("{} {}", app.id, app.status);
    Ok(())
}

pub async fn run_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let writer = open_writer(db_path).await?;
    let app: App = resolve_record(writer.store(), id).await?;
    writer.delete_app(&app.id).await?;
    println!("{}", app.id);
    Ok(())
}
