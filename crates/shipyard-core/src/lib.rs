//! shipyard-core - Core library for Shipyard
//!
//! This crate contains the offline-first data layer shared by every Shipyard
//! client: entity models, the libSQL-backed local store and its operation log,
//! the sync queue writer, the reconciler that replays queued mutations against
//! the hosted backend, the connectivity observer, and the cache worker that
//! serves requests while the network is away.

pub mod clock;
pub mod config;
pub mod connectivity;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod sync;
pub mod util;
pub mod worker;

pub use connectivity::{Connectivity, ConnectivityObserver};
pub use error::{Error, Result};
pub use models::{App, Entity, EntityKind, Idea, Note, Record, SyncAction, SyncEntry, Task};
pub use services::OfflineSyncService;
