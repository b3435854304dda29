//! Database layer for Shipyard

mod connection;
mod migrations;
mod store;

pub use connection::Database;
pub(crate) use store::{format_timestamp, parse_timestamp};
pub use store::{LibSqlLocalStore, LocalMutation, LocalStore, RecordFilter};
