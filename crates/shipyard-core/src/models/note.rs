//! Note model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_record_id, Entity, EntityKind, Record};

/// A free-form note, optionally attached to an app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub app_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub synced: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    #[must_use]
    pub fn new(user_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_record_id(),
            user_id: user_id.into(),
            app_id: None,
            title: title.into(),
            content: String::new(),
            pinned: false,
            synced: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach the note to an app
    #[must_use]
    pub fn for_app(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    /// Get first line of content as a preview, truncated to `max_len` characters
    #[must_use]
    pub fn preview(&self, max_len: usize) -> String {
        self.content
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }
}

impl Record for Note {
    const KIND: EntityKind = EntityKind::Notes;

    record_accessors!();

    fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    fn into_entity(self) -> Entity {
        Entity::Note(self)
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Note(note) => Some(note),
            _ => None,
        }
    }
}
