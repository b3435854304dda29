//! Data models for Shipyard

// Macros must precede the module declarations that use them.

/// Declares a unit-only enum stored as a lowercase string in both the local
/// schema and remote rows.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            /// Storage representation
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $text ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $( $text => Ok(Self::$variant), )+
                    other => Err(crate::Error::InvalidInput(format!(
                        "unknown {}: {other}",
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

/// Implements the [`Record`] accessors every entity shares.
macro_rules! record_accessors {
    () => {
        fn id(&self) -> &str {
            &self.id
        }

        fn user_id(&self) -> &str {
            &self.user_id
        }

        fn synced(&self) -> bool {
            self.synced
        }

        fn set_synced(&mut self, synced: bool) {
            self.synced = synced;
        }

        fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
            self.created_at
        }

        fn updated_at(&self) -> chrono::DateTime<chrono::Utc> {
            self.updated_at
        }

        fn stamp(&mut self, now: chrono::DateTime<chrono::Utc>, created: bool) {
            if created {
                self.created_at = now;
            }
            self.updated_at = now;
        }
    };
}

mod app;
mod entity;
mod idea;
mod note;
mod sync_entry;
mod task;

pub use app::{App, AppStatus};
pub use entity::{new_record_id, Entity, EntityKind, Record};
pub use idea::{Idea, IdeaStatus};
pub use note::Note;
pub use sync_entry::{NewSyncEntry, SyncAction, SyncEntry};
pub use task::{Task, TaskPriority, TaskStatus};
