//! Shipyard CLI - track side projects from the terminal
//!
//! Every write lands in the local store first and is queued for the server;
//! `shipyard sync` pushes the queue and `shipyard pull` refreshes the local copy.

mod cli;
mod commands;
mod error;

use clap::Parser;
use shipyard_core::config::SyncSettings;

use crate::cli::{AppCommand, Cli, Commands, IdeaCommand, NoteCommand, TaskCommand};
use crate::commands::common::{resolve_db_path, resolve_user_id};
use crate::commands::{app, idea, note, pull, queue, sync, task, watch};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("shipyard=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let settings = SyncSettings::from_env()?;
    let db_path = resolve_db_path(cli.db_path);
    let user_id = resolve_user_id(cli.user, &settings);

    match cli.command {
        Commands::App { command } => match command {
            AppCommand::Add {
                name,
                description,
                url,
            } => {
                app::run_add(
                    &name,
                    description.as_deref(),
                    url.as_deref(),
                    &user_id,
                    &db_path,
                )
                .await?;
            }
            AppCommand::List {
                status,
                limit,
                json,
            } => app::run_list(status, limit, json, &user_id, &db_path).await?,
            AppCommand::Status { id, status } => app::run_status(&id, status, &db_path).await?,
            AppCommand::Delete { id } => app::run_delete(&id, &db_path).await?,
        },
        Commands::Idea { command } => match command {
            IdeaCommand::Add { title, description } => {
                idea::run_add(&title, description.as_deref(), &user_id, &db_path).await?;
            }
            IdeaCommand::List {
                status,
                limit,
                json,
            } => idea::run_list(status, limit, json, &user_id, &db_path).await?,
            IdeaCommand::Delete { id } => idea::run_delete(&id, &db_path).await?,
        },
        Commands::Task { command } => match command {
            TaskCommand::Add {
                app,
                title,
                priority,
                due,
            } => task::run_add(&app, &title, priority, due, &user_id, &db_path).await?,
            TaskCommand::List {
                app,
                status,
                limit,
                json,
            } => {
                task::run_list(app.as_deref(), status, limit, json, &user_id, &db_path).await?;
            }
            TaskCommand::Done { id } => task::run_done(&id, &db_path).await?,
            TaskCommand::Delete { id } => task::run_delete(&id, &db_path).await?,
        },
        Commands::Note { command } => match command {
            NoteCommand::Add {
                title,
                content,
                app,
                pin,
            } => {
                note::run_add(&title, &content, app.as_deref(), pin, &user_id, &db_path).await?;
            }
            NoteCommand::List { app, limit, json } => {
                note::run_list(app.as_deref(), limit, json, &user_id, &db_path).await?;
            }
            NoteCommand::Delete { id } => note::run_delete(&id, &db_path).await?,
        },
        Commands::Queue { json } => queue::run_queue(json, &db_path).await?,
        Commands::Sync { json } => sync::run_sync(json, cli.offline, &settings, &db_path).await?,
        Commands::Watch => watch::run_watch(cli.offline, &settings, &db_path).await?,
        Commands::Pull { kind } => {
            pull::run_pull(kind.map(Into::into), &user_id, cli.offline, &settings, &db_path)
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
