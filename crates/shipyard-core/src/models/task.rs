//! Task model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{new_record_id, Entity, EntityKind, Record};

string_enum! {
    #[derive(Default)]
    pub enum TaskStatus {
        #[default]
        Todo => "todo",
        InProgress => "in_progress",
        Done => "done",
    }
}

string_enum! {
    #[derive(Default, PartialOrd, Ord)]
    pub enum TaskPriority {
        Low => "low",
        #[default]
        Medium => "medium",
        High => "high",
    }
}

/// A unit of work belonging to an app
///
/// `app_id` is not checked locally; a task may be queued before its app has
/// reached the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub app_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub synced: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        app_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_record_id(),
            user_id: user_id.into(),
            app_id: app_id.into(),
            title: title.into(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            synced: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub const fn is_done(&self) -> bool {
        matches!(self.status, TaskStatus::Done)
    }
}

impl Record for Task {
    const KIND: EntityKind = EntityKind::Tasks;

    record_accessors!();

    fn app_id(&self) -> Option<&str> {
        Some(&self.app_id)
    }

    fn status(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }

    fn into_entity(self) -> Entity {
        Entity::Task(self)
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Task(task) => Some(task),
            _ => None,
        }
    }
}
