//! Error types for shipyard-core

use thiserror::Error;

use crate::sync::RemoteError;

/// Result type alias using shipyard-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in shipyard-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Sync was requested while the connectivity observer reports offline
    #[error("Cannot sync while offline")]
    Offline,

    /// Remote store error outside the per-entry replay loop (e.g. pulls)
    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),
}
