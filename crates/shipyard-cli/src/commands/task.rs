use std::path::Path;

use chrono::NaiveDate;
use shipyard_core::db::RecordFilter;
use shipyard_core::models::{TaskPriority, TaskStatus};
use shipyard_core::{App, Task};

use crate::commands::common::{
    join_words, list_records, open_writer, print_json, resolve_record, short_id, sync_marker,
};
use crate::error::CliError;

pub async fn add_task(
    app_query: &str,
    title_parts: &[String],
    priority: Option<TaskPriority>,
    due: Option<NaiveDate>,
    user_id: &str,
    db_path: &Path,
) -> Result<Task, CliError> {
    let title = join_words(title_parts, "Task title")?;
    let writer = open_writer(db_path).await?;
    let app: App = resolve_record(writer.store(), app_query).await?;

    let mut task = Task::new(user_id, app.id, title);
    if let Some(priority) = priority {
        task.priority = priority;
    }
    task.due_date = due;
    Ok(writer.create_task(task).await?)
}

pub async fn run_add(
    app_query: &str,
    title_parts: &[String],
    priority: Option<TaskPriority>,
    due: Option<NaiveDate>,
    user_id: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let task = add_task(app_query, title_parts, priority, due, user_id, db_path).await?;
    println!("{}", task.id);
    Ok(())
}

pub async fn list_tasks(
    app_query: Option<&str>,
    status: Option<TaskStatus>,
    limit: usize,
    user_id: &str,
    db_path: &Path,
) -> Result<Vec<Task>, CliError> {
    let mut filter = RecordFilter::default().for_user(user_id);
    if let Some(query) = app_query {
        let writer = open_writer(db_path).await?;
        let app: App = resolve_record(writer.store(), query).await?;
        filter = filter.for_app(app.id);
    }
    if let Some(status) = status {
        filter = filter.with_status(status.as_str());
    }
    list_records(db_path, &filter, limit).await
}

pub fn format_task_line(task: &Task) -> String {
    let check = if task.is_done() { "x" } else { " " };
    let due = task
        .due_date
        .map(|date| format!(" due {date}"))
        .unwrap_or_default();
    format!(
        "{} {} [{check}] {} ({}){due}",
        sync_marker(task.synced),
        short_id(&task.id),
        task.title,
        task.priority
    )
}

pub async fn run_list(
    app_query: Option<&str>,
    status: Option<TaskStatus>,
    limit: usize,
    as_json: bool,
    user_id: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let tasks = list_tasks(app_query, status, limit, user_id, db_path).await?;

    if as_json {
        return print_json(&tasks);
    }
    if tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    for task in &tasks {
        println!("{}", format_task_line(task));
    }
    Ok(())
}

pub async fn complete_task(id: &str, db_path: &Path) -> Result<Task, CliError> {
    let writer = open_writer(db_path).await?;
    let mut task: Task = resolve_record(writer.store(), id).await?;
    task.status = TaskStatus::Done;
    Ok(writer.update_task(task).await?)
}

pub async fn run_done(id: &str, db_path: &Path) -> Result<(), CliError> {
    let task = complete_task(id, db_path).await?;
    println!("{}", task.id);
    Ok(())
}

pub async fn run_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let writer = open_writer(db_path).await?;
    let task: Task = resolve_record(writer.store(), id).await?;
    writer.delete_task(&task.id).await?;
    println!("{}", task.id);
    Ok(())
}
