use std::path::Path;

use shipyard_core::db::RecordFilter;
use shipyard_core::{App, Note};

use crate::commands::common::{
    join_words, list_records, open_writer, print_json, resolve_record, short_id, sync_marker,
};
use crate::error::CliError;

const PREVIEW_LEN: usize = 60;

pub async fn add_note(
    title_parts: &[String],
    content: &str,
    app_query: Option<&str>,
    pinned: bool,
    user_id: &str,
    db_path: &Path,
) -> Result<Note, CliError> {
    let title = join_words(title_parts, "Note title")?;
    let writer = open_writer(db_path).await?;

    let mut note = Note::new(user_id, title);
    note.content = content.trim().to_string();
    note.pinned = pinned;
    if let Some(query) = app_query {
        let app: App = resolve_record(writer.store(), query).await?;
        note = note.for_app(app.id);
    }
    Ok(writer.create_note(note).await?)
}

pub async fn run_add(
    title_parts: &[String],
    content: &str,
    app_query: Option<&str>,
    pinned: bool,
    user_id: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let note = add_note(title_parts, content, app_query, pinned, user_id, db_path).await?;
    println!("{}", note.id);
    Ok(())
}

/// Pinned notes first, then most recent.
pub async fn list_notes(
    app_query: Option<&str>,
    limit: usize,
    user_id: &str,
    db_path: &Path,
) -> Result<Vec<Note>, CliError> {
    let mut filter = RecordFilter::default().for_user(user_id);
    if let Some(query) = app_query {
        let writer = open_writer(db_path).await?;
        let app: App = resolve_record(writer.store(), query).await?;
        filter = filter.for_app(app.id);
    }
    let mut notes: Vec<Note> = list_records(db_path, &filter, usize::MAX).await?;
    notes.sort_by(|a, b| {
        b.pinned
            .cmp(&a.pinned)
            .then_with(|| b.updated_at.cmp(&a.updated_at))
    });
    notes.truncate(limit);
    Ok(notes)
}

pub fn format_note_line(note: &Note) -> String {
    let pin = if note.pinned { "^" } else { " " };
    let preview = note.preview(PREVIEW_LEN);
    if preview.is_empty() {
        format!("{} {} {pin} {}", sync_marker(note.synced), short_id(&note.id), note.title)
    } else {
        format!(
            "{} {} {pin} {} - {preview}",
            sync_marker(note.synced),
            short_id(&note.id),
            note.title
        )
    }
}

pub async fn run_list(
    app_query: Option<&str>,
    limit: usize,
    as_json: bool,
    user_id: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let notes = list_notes(app_query, limit, user_id, db_path).await?;

    if as_json {
        return print_json(&notes);
    }
    if notes.is_empty() {
        println!("No notes.");
        return Ok(());
    }
    for note in &notes {
        println!("{}", format_note_line(note));
    }
    Ok(())
}

pub async fn run_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let writer = open_writer(db_path).await?;
    let note: Note = resolve_record(writer.store(), id).await?;
    writer.delete_note(&note.id).await?;
    println!("{}", note.id);
    Ok(())
}
