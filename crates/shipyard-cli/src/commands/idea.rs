use std::path::Path;

use chrono::Utc;
use shipyard_core::db::RecordFilter;
use shipyard_core::models::IdeaStatus;
use shipyard_core::Idea;

use crate::commands::common::{
    format_relative_time, join_words, list_records, normalize_text, open_writer, print_json,
    resolve_record, short_id, sync_marker,
};
use crate::error::CliError;

pub async fn add_idea(
    title_parts: &[String],
    description: Option<&str>,
    user_id: &str,
    db_path: &Path,
) -> Result<Idea, CliError> {
    let title = join_words(title_parts, "Idea title")?;
    let mut idea = Idea::new(user_id, title);
    idea.description = description.and_then(normalize_text);

    let writer = open_writer(db_path).await?;
    Ok(writer.create_idea(idea).await?)
}

pub async fn run_add(
    title_parts: &[String],
    description: Option<&str>,
    user_id: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let idea = add_idea(title_parts, description, user_id, db_path).await?;
    println!("{}", idea.id);
    Ok(())
}

pub async fn list_ideas(
    status: Option<IdeaStatus>,
    limit: usize,
    user_id: &str,
    db_path: &Path,
) -> Result<Vec<Idea>, CliError> {
    let mut filter = RecordFilter::default().for_user(user_id);
    if let Some(status) = status {
        filter = filter.with_status(status.as_str());
    }
    list_records(db_path, &filter, limit).await
}

pub async fn run_list(
    status: Option<IdeaStatus>,
    limit: usize,
    as_json: bool,
    user_id: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let ideas = list_ideas(status, limit, user_id, db_path).await?;

    if as_json {
        return print_json(&ideas);
    }
    if ideas.is_empty() {
        println!("No ideas yet.");
        return Ok(());
    }

    let now = Utc::now();
    for idea in &ideas {
        println!(
            "{} {} [{}] {} ({})",
            sync_marker(idea.synced),
            short_id(&idea.id),
            idea.status,
            idea.title,
            format_relative_time(idea.updated_at, now)
        );
    }
    Ok(())
}

pub async fn run_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let writer = open_writer(db_path).await?;
    let idea: Idea = resolve_record(writer.store(), id).await?;
    writer.delete_idea(&idea.id).await?;
    println!("{}", idea.id);
    Ok(())
}
