//! Idea model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_record_id, Entity, EntityKind, Record};

string_enum! {
    /// Where an idea sits in validation
    #[derive(Default)]
    pub enum IdeaStatus {
        #[default]
        New => "new",
        Researching => "researching",
        Validated => "validated",
        Discarded => "discarded",
        /// Turned into an app
        Promoted => "promoted",
    }
}

/// A product idea that may later become an app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: IdeaStatus,
    /// Maker's own 0-10 rating
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub synced: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Idea {
    #[must_use]
    pub fn new(user_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_record_id(),
            user_id: user_id.into(),
            title: title.into(),
            description: None,
            status: IdeaStatus::New,
            score: 0,
            synced: false,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for Idea {
    const KIND: EntityKind = EntityKind::Ideas;

    record_accessors!();

    fn status(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }

    fn into_entity(self) -> Entity {
        Entity::Idea(self)
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Idea(idea) => Some(idea),
            _ => None,
        }
    }
}
