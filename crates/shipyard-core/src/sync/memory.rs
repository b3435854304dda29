//! In-process remote store with fault injection, for tests and local demos.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::remote::{RemoteError, RemoteResult, RemoteStore};
use crate::db::RecordFilter;
use crate::models::{Entity, EntityKind};

/// A call observed by [`MemoryRemoteStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Insert { kind: EntityKind, id: String },
    Update { kind: EntityKind, id: String },
    Delete { kind: EntityKind, id: String },
    Select { kind: EntityKind },
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<EntityKind, BTreeMap<String, Entity>>,
    calls: Vec<RemoteCall>,
    failing_calls: HashSet<usize>,
    failing_ids: HashSet<String>,
    unavailable: bool,
    latency: Option<Duration>,
}

/// Remote store that keeps rows in memory.
///
/// Cloning shares the same rows, call log and faults.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemoteStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Fail the `n`-th call (1-based, counting every call kind)
    pub fn fail_call(&self, n: usize) {
        self.lock().failing_calls.insert(n);
    }

    /// Fail every write targeting `id`
    pub fn fail_id(&self, id: impl Into<String>) {
        self.lock().failing_ids.insert(id.into());
    }

    /// Reject every call until cleared
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.lock().latency = latency;
    }

    pub fn clear_faults(&self) {
        let mut state = self.lock();
        state.failing_calls.clear();
        state.failing_ids.clear();
        state.unavailable = false;
        state.latency = None;
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Put a row directly, bypassing the call log
    pub fn seed(&self, entity: Entity) {
        let mut entity = entity;
        entity.set_synced(true);
        self.lock()
            .tables
            .entry(entity.kind())
            .or_default()
            .insert(entity.id().to_string(), entity);
    }

    pub fn row(&self, kind: EntityKind, id: &str) -> Option<Entity> {
        self.lock()
            .tables
            .get(&kind)
            .and_then(|rows| rows.get(id).cloned())
    }

    pub fn rows(&self, kind: EntityKind) -> Vec<Entity> {
        self.lock()
            .tables
            .get(&kind)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Log `call` and decide whether it fails. Returns the latency to apply.
    fn begin(&self, call: RemoteCall) -> RemoteResult<Option<Duration>> {
        let mut state = self.lock();
        let target = match &call {
            RemoteCall::Insert { id, .. }
            | RemoteCall::Update { id, .. }
            | RemoteCall::Delete { id, .. } => Some(id.clone()),
            RemoteCall::Select { .. } => None,
        };
        state.calls.push(call);
        let number = state.calls.len();

        if state.unavailable {
            return Err(RemoteError::Unavailable("remote store is down".to_string()));
        }
        if state.failing_calls.contains(&number) {
            return Err(RemoteError::Api {
                status: 500,
                message: format!("injected failure on call {number}"),
            });
        }
        if target.is_some_and(|id| state.failing_ids.contains(&id)) {
            return Err(RemoteError::Api {
                status: 500,
                message: "injected failure for record".to_string(),
            });
        }
        Ok(state.latency)
    }

    async fn settle(&self, call: RemoteCall) -> RemoteResult<()> {
        if let Some(latency) = self.begin(call)? {
            tokio::time::sleep(latency).await;
        }
        Ok(())
    }
}

impl RemoteStore for MemoryRemoteStore {
    async fn insert(&self, entity: &Entity) -> RemoteResult<()> {
        self.settle(RemoteCall::Insert {
            kind: entity.kind(),
            id: entity.id().to_string(),
        })
        .await?;
        self.seed(entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &Entity) -> RemoteResult<()> {
        self.settle(RemoteCall::Update {
            kind: entity.kind(),
            id: entity.id().to_string(),
        })
        .await?;

        // PATCH on a missing row matches nothing and still succeeds
        let mut state = self.lock();
        if let Some(row) = state
            .tables
            .get_mut(&entity.kind())
            .and_then(|rows| rows.get_mut(entity.id()))
        {
            let mut updated = entity.clone();
            updated.set_synced(true);
            *row = updated;
        }
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> RemoteResult<()> {
        self.settle(RemoteCall::Delete {
            kind,
            id: id.to_string(),
        })
        .await?;
        if let Some(rows) = self.lock().tables.get_mut(&kind) {
            rows.remove(id);
        }
        Ok(())
    }

    async fn select(&self, kind: EntityKind, filter: &RecordFilter) -> RemoteResult<Vec<Entity>> {
        self.settle(RemoteCall::Select { kind }).await?;
        let rows = self
            .rows(kind)
            .into_iter()
            .filter(|entity| {
                filter
                    .user_id
                    .as_deref()
                    .is_none_or(|user_id| entity.user_id() == user_id)
                    && filter
                        .app_id
                        .as_deref()
                        .is_none_or(|app_id| entity.app_id() == Some(app_id))
                    && filter
                        .status
                        .as_deref()
                        .is_none_or(|status| entity.status() == Some(status))
            })
            .collect();
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{App, Record, Task};
    use pretty_assertions::assert_eq;

    #[tokio::test(flavor = "multi_thread")]
    async fn insert_is_idempotent() {
        let remote = MemoryRemoteStore::new();
        let app = App::new("user-1", "Launchpad").into_entity();

        remote.insert(&app).await.unwrap();
        remote.insert(&app).await.unwrap();

        assert_eq!(remote.rows(EntityKind::Apps).len(), 1);
        assert_eq!(remote.call_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_of_missing_row_succeeds() {
        let remote = MemoryRemoteStore::new();
        remote.delete(EntityKind::Notes, "missing").await.unwrap();
        assert_eq!(
            remote.calls(),
            vec![RemoteCall::Delete {
                kind: EntityKind::Notes,
                id: "missing".to_string()
            }]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn injected_call_failure_hits_only_that_call() {
        let remote = MemoryRemoteStore::new();
        remote.fail_call(2);
        let first = App::new("user-1", "One").into_entity();
        let second = App::new("user-1", "Two").into_entity();
        let third = App::new("user-1", "Three").into_entity();

        remote.insert(&first).await.unwrap();
        assert!(remote.insert(&second).await.is_err());
        remote.insert(&third).await.unwrap();

        assert!(remote.row(EntityKind::Apps, second.id()).is_none());
        assert_eq!(remote.rows(EntityKind::Apps).len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn select_applies_filter() {
        let remote = MemoryRemoteStore::new();
        remote.seed(Task::new("user-1", "app-1", "Ship it").into_entity());
        remote.seed(Task::new("user-1", "app-2", "Write docs").into_entity());
        remote.seed(Task::new("user-2", "app-1", "Not mine").into_entity());

        let filter = RecordFilter::default().for_user("user-1").for_app("app-1");
        let rows = remote.select(EntityKind::Tasks, &filter).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert!(rows[0].synced());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unavailable_rejects_everything() {
        let remote = MemoryRemoteStore::new();
        remote.set_unavailable(true);
        let result = remote
            .select(EntityKind::Apps, &RecordFilter::default())
            .await;
        assert!(matches!(result, Err(RemoteError::Unavailable(_))));

        remote.clear_faults();
        assert!(remote
            .select(EntityKind::Apps, &RecordFilter::default())
            .await
            .is_ok());
    }
}
