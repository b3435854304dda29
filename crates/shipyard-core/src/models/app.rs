//! App model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_record_id, Entity, EntityKind, Record};

string_enum! {
    /// Lifecycle stage of an app
    #[derive(Default)]
    pub enum AppStatus {
        #[default]
        Idea => "idea",
        Building => "building",
        Deployed => "deployed",
        Launched => "launched",
        Monetized => "monetized",
    }
}

/// A SaaS side-project tracked through its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: AppStatus,
    /// Public URL once deployed
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    /// Monthly recurring revenue in cents
    #[serde(default)]
    pub mrr_cents: i64,
    /// True when the local copy matches the remote store
    #[serde(default)]
    pub synced: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl App {
    /// Create a new, unsynced app in the `idea` stage
    #[must_use]
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_record_id(),
            user_id: user_id.into(),
            name: name.into(),
            description: None,
            status: AppStatus::Idea,
            url: None,
            repo_url: None,
            tech_stack: Vec::new(),
            mrr_cents: 0,
            synced: false,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for App {
    const KIND: EntityKind = EntityKind::Apps;

    record_accessors!();

    fn status(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }

    fn into_entity(self) -> Entity {
        Entity::App(self)
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::App(app) => Some(app),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_app_starts_as_unsynced_idea() {
        let app = App::new("user-1", "Launchpad");
        assert_eq!(app.status, AppStatus::Idea);
        assert!(!app.synced);
        assert_eq!(app.created_at, app.updated_at);
    }

    #[test]
    fn app_status_parses_case_insensitively() {
        assert_eq!("Launched".parse::<AppStatus>().unwrap(), AppStatus::Launched);
        assert!("shipped".parse::<AppStatus>().is_err());
    }
}
