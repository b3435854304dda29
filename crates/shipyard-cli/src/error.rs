use std::io;

use shipyard_core::config::ConfigError;
use shipyard_core::sync::RemoteError;
use shipyard_core::worker::WorkerError;
use shipyard_core::EntityKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] shipyard_core::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Worker(#[from] WorkerError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid log filter: {0}")]
    LogFilter(#[from] tracing_subscriber::filter::ParseError),
    #[error("{0} cannot be empty")]
    EmptyValue(&'static str),
    #[error("No {kind} found for id/prefix: {query}")]
    NotFound { kind: EntityKind, query: String },
    #[error("{0}")]
    AmbiguousId(String),
    #[error(
        "Sync is not configured. Set SUPABASE_URL and SUPABASE_ANON_KEY, plus SHIPYARD_ACCESS_TOKEN for a signed-in user."
    )]
    SyncNotConfigured,
}
