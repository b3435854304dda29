//! Operation log entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, EntityKind};

string_enum! {
    /// Mutation recorded in the operation log
    pub enum SyncAction {
        Create => "create",
        Update => "update",
        Delete => "delete",
    }
}

/// An intent about to be appended to the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSyncEntry {
    pub action: SyncAction,
    pub entity: Entity,
    pub timestamp: DateTime<Utc>,
}

impl NewSyncEntry {
    pub const fn new(action: SyncAction, entity: Entity, timestamp: DateTime<Utc>) -> Self {
        Self {
            action,
            entity,
            timestamp,
        }
    }

    pub const fn kind(&self) -> EntityKind {
        self.entity.kind()
    }
}

/// A persisted log entry, replayed in ascending `id` order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEntry {
    /// Autoincrement log id; defines FIFO order
    pub id: i64,
    pub action: SyncAction,
    /// Full entity payload at the time of the mutation
    pub entity: Entity,
    pub timestamp: DateTime<Utc>,
}

impl SyncEntry {
    pub const fn kind(&self) -> EntityKind {
        self.entity.kind()
    }

    /// Id of the entity this entry mutates
    pub fn entity_id(&self) -> &str {
        self.entity.id()
    }
}
