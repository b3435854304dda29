//! Optimistic local writes that enqueue their remote replay.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::db::{LocalMutation, LocalStore};
use crate::error::{Error, Result};
use crate::models::{App, Idea, NewSyncEntry, Note, Record, SyncAction, Task};

/// Applies mutations to the local store and appends the matching log entry
/// in the same transaction. Never touches the network, so every call
/// succeeds offline.
#[derive(Clone)]
pub struct SyncQueueWriter<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: LocalStore> SyncQueueWriter<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn with_system_clock(store: S) -> Self {
        Self::new(store, Arc::new(SystemClock))
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Stamp `record` as new, store it unsynced, and queue a create.
    pub async fn create<T: Record>(&self, mut record: T) -> Result<T> {
        validate(&record)?;
        let now = self.clock.now();
        record.stamp(now, true);
        record.set_synced(false);

        self.commit(SyncAction::Create, &record).await?;
        Ok(record)
    }

    /// Store a modified record unsynced and queue an update.
    ///
    /// The record must already exist locally; `created_at` is kept from the
    /// stored copy.
    pub async fn update<T: Record>(&self, record: T) -> Result<T> {
        validate(&record)?;
        let existing = self.existing::<T>(record.id()).await?;

        let mut record = record;
        let now = self.clock.now();
        record.stamp(existing.created_at(), true);
        record.stamp(now, false);
        record.set_synced(false);

        self.commit(SyncAction::Update, &record).await?;
        Ok(record)
    }

    /// Tombstone a record locally and queue its remote delete.
    ///
    /// Returns the record as it was before deletion.
    pub async fn delete<T: Record>(&self, id: &str) -> Result<T> {
        let mut record = self.existing::<T>(id).await?;
        record.stamp(self.clock.now(), false);
        record.set_synced(false);

        let entry = NewSyncEntry::new(
            SyncAction::Delete,
            record.clone().into_entity(),
            record.updated_at(),
        );
        let mutation = LocalMutation::Tombstone {
            kind: T::KIND,
            id: id.to_string(),
        };
        let log_id = self.store.commit_mutation(&mutation, &entry).await?;
        tracing::debug!("Queued delete of {} {} as log entry {}", T::KIND, id, log_id);
        Ok(record)
    }

    pub async fn create_app(&self, app: App) -> Result<App> {
        self.create(app).await
    }

    pub async fn update_app(&self, app: App) -> Result<App> {
        self.update(app).await
    }

    pub async fn delete_app(&self, id: &str) -> Result<App> {
        self.delete(id).await
    }

    pub async fn create_idea(&self, idea: Idea) -> Result<Idea> {
        self.create(idea).await
    }

    pub async fn update_idea(&self, idea: Idea) -> Result<Idea> {
        self.update(idea).await
    }

    pub async fn delete_idea(&self, id: &str) -> Result<Idea> {
        self.delete(id).await
    }

    pub async fn create_task(&self, task: Task) -> Result<Task> {
        self.create(task).await
    }

    pub async fn update_task(&self, task: Task) -> Result<Task> {
        self.update(task).await
    }

    pub async fn delete_task(&self, id: &str) -> Result<Task> {
        self.delete(id).await
    }

    pub async fn create_note(&self, note: Note) -> Result<Note> {
        self.create(note).await
    }

    pub async fn update_note(&self, note: Note) -> Result<Note> {
        self.update(note).await
    }

    pub async fn delete_note(&self, id: &str) -> Result<Note> {
        self.delete(id).await
    }

    async fn existing<T: Record>(&self, id: &str) -> Result<T> {
        let entity = self
            .store
            .get(T::KIND, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("{} {id}", T::KIND)))?;
        T::from_entity(entity)
            .ok_or_else(|| Error::Database(format!("{} {id} has an unexpected kind", T::KIND)))
    }

    async fn commit<T: Record>(&self, action: SyncAction, record: &T) -> Result<()> {
        let entity = record.clone().into_entity();
        let entry = NewSyncEntry::new(action, entity.clone(), record.updated_at());
        let log_id = self
            .store
            .commit_mutation(&LocalMutation::Put(entity), &entry)
            .await?;
        tracing::debug!(
            "Queued {} of {} {} as log entry {}",
            action,
            T::KIND,
            record.id(),
            log_id
        );
        Ok(())
    }
}

fn validate<T: Record>(record: &T) -> Result<()> {
    if record.id().trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} id must not be empty", T::KIND)));
    }
    if record.user_id().trim().is_empty() {
        return Err(Error::InvalidInput(format!(
            "{} user_id must not be empty",
            T::KIND
        )));
    }
    Ok(())
}
