//! Entity kinds and the tagged union carried through the operation log

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{App, Idea, Note, Task};
use crate::error::Error;

/// Generate a client-side record id (UUID v7, time-sortable)
#[must_use]
pub fn new_record_id() -> String {
    Uuid::now_v7().to_string()
}

/// The collections mirrored locally and replayed remotely
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Apps,
    Ideas,
    Tasks,
    Notes,
}

impl EntityKind {
    /// Every kind, in pull order (owners before dependents)
    pub const ALL: [Self; 4] = [Self::Apps, Self::Ideas, Self::Tasks, Self::Notes];

    /// Table name used by both the local schema and the remote store
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Apps => "apps",
            Self::Ideas => "ideas",
            Self::Tasks => "tasks",
            Self::Notes => "notes",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apps" | "app" => Ok(Self::Apps),
            "ideas" | "idea" => Ok(Self::Ideas),
            "tasks" | "task" => Ok(Self::Tasks),
            "notes" | "note" => Ok(Self::Notes),
            other => Err(Error::InvalidInput(format!("unknown entity kind: {other}"))),
        }
    }
}

/// Behaviour shared by every mirrored entity type.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Collection this record lives in
    const KIND: EntityKind;

    fn id(&self) -> &str;
    fn user_id(&self) -> &str;

    /// Owning app, for records that reference one
    fn app_id(&self) -> Option<&str> {
        None
    }

    /// Indexed status column, for records that have one
    fn status(&self) -> Option<&'static str> {
        None
    }

    fn synced(&self) -> bool;
    fn set_synced(&mut self, synced: bool);
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;

    /// Set `updated_at` (and `created_at` when `created`) to `now`
    fn stamp(&mut self, now: DateTime<Utc>, created: bool);

    fn into_entity(self) -> Entity;
    fn from_entity(entity: Entity) -> Option<Self>;
}

/// A record of any kind.
///
/// Serialized as `{"kind": "apps", "payload": {...}}` so log entries stay
/// self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum Entity {
    #[serde(rename = "apps")]
    App(App),
    #[serde(rename = "ideas")]
    Idea(Idea),
    #[serde(rename = "tasks")]
    Task(Task),
    #[serde(rename = "notes")]
    Note(Note),
}

macro_rules! with_record {
    ($entity:expr, $record:ident => $body:expr) => {
        match $entity {
            Entity::App($record) => $body,
            Entity::Idea($record) => $body,
            Entity::Task($record) => $body,
            Entity::Note($record) => $body,
        }
    };
}

impl Entity {
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::App(_) => EntityKind::Apps,
            Self::Idea(_) => EntityKind::Ideas,
            Self::Task(_) => EntityKind::Tasks,
            Self::Note(_) => EntityKind::Notes,
        }
    }

    pub fn id(&self) -> &str {
        with_record!(self, record => record.id())
    }

    pub fn user_id(&self) -> &str {
        with_record!(self, record => record.user_id())
    }

    pub fn app_id(&self) -> Option<&str> {
        with_record!(self, record => record.app_id())
    }

    pub fn status(&self) -> Option<&'static str> {
        with_record!(self, record => record.status())
    }

    pub fn synced(&self) -> bool {
        with_record!(self, record => record.synced())
    }

    pub fn set_synced(&mut self, synced: bool) {
        with_record!(self, record => record.set_synced(synced));
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        with_record!(self, record => record.created_at())
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        with_record!(self, record => record.updated_at())
    }

    /// Serialize the bare record (no kind tag), as stored in local rows.
    pub fn to_payload(&self) -> serde_json::Result<serde_json::Value> {
        with_record!(self, record => serde_json::to_value(record))
    }

    /// Serialize the record as a remote row. The local-only `synced` flag is
    /// never sent to the backend.
    pub fn to_remote_row(&self) -> serde_json::Result<serde_json::Value> {
        let mut row = self.to_payload()?;
        if let Some(object) = row.as_object_mut() {
            object.remove("synced");
        }
        Ok(row)
    }

    /// Rebuild an entity of `kind` from a bare record payload.
    pub fn from_payload(kind: EntityKind, payload: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match kind {
            EntityKind::Apps => Self::App(serde_json::from_value(payload)?),
            EntityKind::Ideas => Self::Idea(serde_json::from_value(payload)?),
            EntityKind::Tasks => Self::Task(serde_json::from_value(payload)?),
            EntityKind::Notes => Self::Note(serde_json::from_value(payload)?),
        })
    }
}
