//! Replays the operation log against the remote store and refreshes local
//! mirrors from it.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;

use super::remote::{RemoteError, RemoteResult, RemoteStore};
use crate::connectivity::ConnectivityObserver;
use crate::db::{LocalStore, RecordFilter};
use crate::error::{Error, Result};
use crate::models::{App, EntityKind, Idea, Note, Record, SyncAction, SyncEntry, Task};

/// Default bound on a single remote call
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(8);

/// When a record's `synced` flag flips back to true
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncedFlagPolicy {
    /// Only records written by a pull are marked synced
    #[default]
    PullOnly,
    /// A successful push also marks the record synced, unless newer
    /// mutations for it are still queued
    OnPush,
}

impl fmt::Display for SyncedFlagPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PullOnly => write!(f, "pull-only"),
            Self::OnPush => write!(f, "on-push"),
        }
    }
}

impl FromStr for SyncedFlagPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "pull-only" | "pull" => Ok(Self::PullOnly),
            "on-push" | "push" => Ok(Self::OnPush),
            other => Err(Error::InvalidInput(format!(
                "unknown synced flag policy: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub remote_timeout: Duration,
    pub synced_policy: SyncedFlagPolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            synced_policy: SyncedFlagPolicy::default(),
        }
    }
}

/// A log entry whose replay failed and stays queued
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedEntry {
    pub log_id: i64,
    pub kind: EntityKind,
    pub action: SyncAction,
    pub entity_id: String,
    pub error: String,
}

/// Outcome of one [`Reconciler::sync_all`] pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Entries present at the start of the pass
    pub attempted: usize,
    /// Entries replayed and removed from the log
    pub applied: usize,
    pub failed: Vec<FailedEntry>,
    /// Entries still queued once the pass finished
    pub remaining: usize,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Records written locally per kind by [`Reconciler::pull_all_from_server`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullSummary {
    pub apps: usize,
    pub ideas: usize,
    pub tasks: usize,
    pub notes: usize,
}

impl PullSummary {
    pub const fn total(&self) -> usize {
        self.apps + self.ideas + self.tasks + self.notes
    }

    fn record(&mut self, kind: EntityKind, written: usize) {
        match kind {
            EntityKind::Apps => self.apps = written,
            EntityKind::Ideas => self.ideas = written,
            EntityKind::Tasks => self.tasks = written,
            EntityKind::Notes => self.notes = written,
        }
    }
}

/// Clones share one in-flight guard, so at most one replay or pull runs at
/// a time no matter which trigger started it.
#[derive(Clone)]
pub struct Reconciler<S, R> {
    store: S,
    remote: R,
    connectivity: ConnectivityObserver,
    options: SyncOptions,
    in_flight: Arc<Mutex<()>>,
}

impl<S: LocalStore, R: RemoteStore> Reconciler<S, R> {
    pub fn new(
        store: S,
        remote: R,
        connectivity: ConnectivityObserver,
        options: SyncOptions,
    ) -> Self {
        Self {
            store,
            remote,
            connectivity,
            options,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    pub const fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Replay every queued entry in FIFO order.
    ///
    /// Each entry is removed only after the remote store acknowledged it. A
    /// failed entry is logged and left queued, and the pass moves on to the
    /// next one. Local storage errors abort the pass. A pass started while
    /// another is running waits for it and then drains what is left.
    pub async fn sync_all(&self) -> Result<SyncReport> {
        self.ensure_online()?;
        let _pass = self.in_flight.lock().await;

        let entries = self.store.drain_log().await?;
        let mut report = SyncReport {
            attempted: entries.len(),
            ..SyncReport::default()
        };
        if entries.is_empty() {
            tracing::debug!("Sync queue empty, nothing to replay");
            return Ok(report);
        }
        tracing::info!("Replaying {} queued change(s)", entries.len());

        for entry in &entries {
            match self.replay(entry).await {
                Ok(()) => {
                    self.store.remove_log_entry(entry.id).await?;
                    self.settle(entry).await?;
                    report.applied += 1;
                }
                Err(error) => {
                    tracing::warn!(
                        "Failed to sync {} {} {} (log entry {}): {}",
                        entry.action,
                        entry.kind(),
                        entry.entity_id(),
                        entry.id,
                        error
                    );
                    report.failed.push(FailedEntry {
                        log_id: entry.id,
                        kind: entry.kind(),
                        action: entry.action,
                        entity_id: entry.entity_id().to_string(),
                        error: error.to_string(),
                    });
                }
            }
        }

        report.remaining = self.store.count_log().await?;
        tracing::info!(
            "Sync finished: {} applied, {} failed, {} remaining",
            report.applied,
            report.failed.len(),
            report.remaining
        );
        Ok(report)
    }

    /// Fetch `T` rows matching `filter`, replace the locally cached synced
    /// subset with them and return the refreshed local view.
    pub async fn pull<T: Record>(&self, filter: &RecordFilter) -> Result<Vec<T>> {
        let _pass = self.in_flight.lock().await;
        self.pull_kind(T::KIND, filter).await?;

        let local = self.store.query(T::KIND, filter).await?;
        Ok(local.into_iter().filter_map(T::from_entity).collect())
    }

    pub async fn pull_apps_from_server(&self, filter: &RecordFilter) -> Result<Vec<App>> {
        self.pull(filter).await
    }

    pub async fn pull_ideas_from_server(&self, filter: &RecordFilter) -> Result<Vec<Idea>> {
        self.pull(filter).await
    }

    pub async fn pull_tasks_from_server(&self, filter: &RecordFilter) -> Result<Vec<Task>> {
        self.pull(filter).await
    }

    pub async fn pull_notes_from_server(&self, filter: &RecordFilter) -> Result<Vec<Note>> {
        self.pull(filter).await
    }

    /// Pull every collection, owners first
    pub async fn pull_all_from_server(&self, filter: &RecordFilter) -> Result<PullSummary> {
        let _pass = self.in_flight.lock().await;
        let mut summary = PullSummary::default();
        for kind in EntityKind::ALL {
            let written = self.pull_kind(kind, filter).await?;
            summary.record(kind, written);
        }
        Ok(summary)
    }

    async fn pull_kind(&self, kind: EntityKind, filter: &RecordFilter) -> Result<usize> {
        self.ensure_online()?;

        let rows = self.bounded(self.remote.select(kind, filter)).await?;
        let fetched = rows.len();
        let written = self.store.replace_synced(kind, filter, &rows).await?;
        tracing::info!(
            "Pulled {} {} from server ({} kept local changes)",
            fetched,
            kind,
            fetched.saturating_sub(written)
        );
        Ok(written)
    }

    fn ensure_online(&self) -> Result<()> {
        if self.connectivity.is_online() {
            Ok(())
        } else {
            Err(Error::Offline)
        }
    }

    async fn replay(&self, entry: &SyncEntry) -> RemoteResult<()> {
        let result = match entry.action {
            SyncAction::Create => self.bounded(self.remote.insert(&entry.entity)).await,
            SyncAction::Update => self.bounded(self.remote.update(&entry.entity)).await,
            SyncAction::Delete => {
                self.bounded(self.remote.delete(entry.kind(), entry.entity_id()))
                    .await
            }
        };

        match result {
            Err(error) if entry.action == SyncAction::Delete && error.is_not_found() => Ok(()),
            other => other,
        }
    }

    /// Local bookkeeping once `entry` is confirmed remotely
    async fn settle(&self, entry: &SyncEntry) -> Result<()> {
        let kind = entry.kind();
        let id = entry.entity_id();
        if self.store.has_pending(kind, id).await? {
            return Ok(());
        }

        match (entry.action, self.options.synced_policy) {
            (SyncAction::Delete, _) => self.store.purge_tombstone(kind, id).await,
            (_, SyncedFlagPolicy::OnPush) => self.store.mark_synced(kind, id).await,
            (_, SyncedFlagPolicy::PullOnly) => Ok(()),
        }
    }

    async fn bounded<T>(&self, call: impl Future<Output = RemoteResult<T>>) -> RemoteResult<T> {
        let limit = self.options.remote_timeout;
        tokio::time::timeout(limit, call)
            .await
            .map_err(|_| RemoteError::Timeout(limit))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::connectivity::Connectivity;
    use crate::db::LibSqlLocalStore;
    use crate::models::{Entity, NewSyncEntry, TaskStatus};
    use crate::sync::{MemoryRemoteStore, RemoteCall, SyncQueueWriter};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    struct Harness {
        writer: SyncQueueWriter<LibSqlLocalStore>,
        reconciler: Reconciler<LibSqlLocalStore, MemoryRemoteStore>,
        store: LibSqlLocalStore,
        remote: MemoryRemoteStore,
        connectivity: ConnectivityObserver,
    }

    async fn harness(options: SyncOptions) -> Harness {
        let store = LibSqlLocalStore::open_in_memory().await.unwrap();
        let remote = MemoryRemoteStore::new();
        let connectivity = ConnectivityObserver::new();
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        ));
        Harness {
            writer: SyncQueueWriter::new(store.clone(), clock),
            reconciler: Reconciler::new(
                store.clone(),
                remote.clone(),
                connectivity.clone(),
                options,
            ),
            store,
            remote,
            connectivity,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn replays_queue_in_fifo_order_and_empties_it() {
        let h = harness(SyncOptions::default()).await;
        let app = h.writer.create_app(App::new("user-1", "Launchpad")).await.unwrap();
        let task = h
            .writer
            .create_task(Task::new("user-1", &app.id, "Landing page"))
            .await
            .unwrap();
        let mut done = task.clone();
        done.status = TaskStatus::Done;
        h.writer.update_task(done).await.unwrap();

        let report = h.reconciler.sync_all().await.unwrap();

        assert_eq!(report.attempted, 3);
        assert_eq!(report.applied, 3);
        assert_eq!(report.remaining, 0);
        assert!(report.is_clean());
        assert_eq!(
            h.remote.calls(),
            vec![
                RemoteCall::Insert {
                    kind: EntityKind::Apps,
                    id: app.id.clone()
                },
                RemoteCall::Insert {
                    kind: EntityKind::Tasks,
                    id: task.id.clone()
                },
                RemoteCall::Update {
                    kind: EntityKind::Tasks,
                    id: task.id.clone()
                },
            ]
        );
        let remote_task = h.remote.row(EntityKind::Tasks, &task.id).unwrap();
        assert_eq!(remote_task.status(), Some("done"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn repeated_updates_to_one_record_land_in_order() {
        let h = harness(SyncOptions::default()).await;
        let mut app = h.writer.create_app(App::new("user-1", "v0")).await.unwrap();
        app.name = "v1".to_string();
        h.writer.update_app(app.clone()).await.unwrap();
        app.name = "v2".to_string();
        h.writer.update_app(app.clone()).await.unwrap();

        let report = h.reconciler.sync_all().await.unwrap();

        assert_eq!(report.applied, 3);
        assert_eq!(report.remaining, 0);
        let remote = App::from_entity(h.remote.row(EntityKind::Apps, &app.id).unwrap()).unwrap();
        assert_eq!(remote.name, "v2");
        assert_eq!(
            h.remote.calls(),
            vec![
                RemoteCall::Insert {
                    kind: EntityKind::Apps,
                    id: app.id.clone()
                },
                RemoteCall::Update {
                    kind: EntityKind::Apps,
                    id: app.id.clone()
                },
                RemoteCall::Update {
                    kind: EntityKind::Apps,
                    id: app.id.clone()
                },
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn overlapping_passes_replay_each_entry_once() {
        let h = harness(SyncOptions::default()).await;
        let mut app = h.writer.create_app(App::new("user-1", "v0")).await.unwrap();
        h.reconciler.sync_all().await.unwrap();
        let calls_before = h.remote.call_count();

        app.name = "one".to_string();
        h.writer.update_app(app.clone()).await.unwrap();
        h.remote.set_latency(Some(Duration::from_millis(200)));
        let first = tokio::spawn({
            let reconciler = h.reconciler.clone();
            async move { reconciler.sync_all().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        app.name = "two".to_string();
        h.writer.update_app(app.clone()).await.unwrap();
        let second = tokio::spawn({
            let reconciler = h.reconciler.clone();
            async move { reconciler.sync_all().await }
        });

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();

        assert_eq!(first.attempted, 1);
        assert_eq!(second.attempted, 1);
        assert_eq!(h.remote.call_count() - calls_before, 2);
        assert_eq!(h.store.count_log().await.unwrap(), 0);
        let remote = App::from_entity(h.remote.row(EntityKind::Apps, &app.id).unwrap()).unwrap();
        assert_eq!(remote.name, "two");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_entry_stays_queued_while_later_entries_proceed() {
        let h = harness(SyncOptions::default()).await;
        let first = h.writer.create_idea(Idea::new("user-1", "One")).await.unwrap();
        let second = h.writer.create_idea(Idea::new("user-1", "Two")).await.unwrap();
        let third = h.writer.create_idea(Idea::new("user-1", "Three")).await.unwrap();
        h.remote.fail_call(2);

        let report = h.reconciler.sync_all().await.unwrap();

        assert_eq!(report.applied, 2);
        assert_eq!(report.remaining, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].entity_id, second.id);

        let queued = h.store.drain_log().await.unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].entity_id(), second.id);
        assert!(h.remote.row(EntityKind::Ideas, &first.id).is_some());
        assert!(h.remote.row(EntityKind::Ideas, &third.id).is_some());

        h.remote.clear_faults();
        let retry = h.reconciler.sync_all().await.unwrap();
        assert_eq!(retry.applied, 1);
        assert_eq!(retry.remaining, 0);
        assert!(h.remote.row(EntityKind::Ideas, &second.id).is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_sync_is_rejected_without_remote_calls() {
        let h = harness(SyncOptions::default()).await;
        h.writer.create_note(Note::new("user-1", "Draft")).await.unwrap();
        h.connectivity.set_online(false);

        let result = h.reconciler.sync_all().await;

        assert!(matches!(result, Err(Error::Offline)));
        assert_eq!(h.remote.call_count(), 0);
        assert_eq!(h.store.count_log().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn replay_after_partial_success_does_not_duplicate() {
        let h = harness(SyncOptions::default()).await;
        let app = h.writer.create_app(App::new("user-1", "Launchpad")).await.unwrap();
        // The row reached the server but the acknowledgement was lost
        h.remote.seed(app.clone().into_entity());

        let report = h.reconciler.sync_all().await.unwrap();

        assert_eq!(report.applied, 1);
        assert_eq!(h.remote.rows(EntityKind::Apps).len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn confirmed_delete_purges_tombstone() {
        let h = harness(SyncOptions::default()).await;
        let note = h.writer.create_note(Note::new("user-1", "Scratch")).await.unwrap();
        h.writer.delete_note(&note.id).await.unwrap();

        h.reconciler.sync_all().await.unwrap();

        assert!(h.remote.row(EntityKind::Notes, &note.id).is_none());
        assert!(h.store.list_tombstones(EntityKind::Notes).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn deleting_the_same_record_twice_succeeds() {
        let h = harness(SyncOptions::default()).await;
        let note = h.writer.create_note(Note::new("user-1", "Scratch")).await.unwrap();
        h.reconciler.sync_all().await.unwrap();
        let deleted = h.writer.delete_note(&note.id).await.unwrap();
        h.store
            .append_log(&NewSyncEntry::new(
                SyncAction::Delete,
                deleted.clone().into_entity(),
                deleted.updated_at,
            ))
            .await
            .unwrap();

        let report = h.reconciler.sync_all().await.unwrap();

        assert_eq!(report.attempted, 2);
        assert_eq!(report.applied, 2);
        assert_eq!(report.remaining, 0);
        assert!(h.remote.row(EntityKind::Notes, &note.id).is_none());
        assert!(h.store.list_tombstones(EntityKind::Notes).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_delete_keeps_tombstone() {
        let h = harness(SyncOptions::default()).await;
        let note = h.writer.create_note(Note::new("user-1", "Scratch")).await.unwrap();
        h.reconciler.sync_all().await.unwrap();
        h.writer.delete_note(&note.id).await.unwrap();
        h.remote.fail_id(&note.id);

        let report = h.reconciler.sync_all().await.unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(h.store.list_tombstones(EntityKind::Notes).await.unwrap().len(), 1);
        assert!(h.store.get(EntityKind::Notes, &note.id).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn push_leaves_synced_flag_alone_by_default() {
        let h = harness(SyncOptions::default()).await;
        let app = h.writer.create_app(App::new("user-1", "Launchpad")).await.unwrap();

        h.reconciler.sync_all().await.unwrap();

        let stored = h.store.get(EntityKind::Apps, &app.id).await.unwrap().unwrap();
        assert!(!stored.synced());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn on_push_policy_marks_confirmed_records_synced() {
        let h = harness(SyncOptions {
            synced_policy: SyncedFlagPolicy::OnPush,
            ..SyncOptions::default()
        })
        .await;
        let app = h.writer.create_app(App::new("user-1", "Launchpad")).await.unwrap();
        let idea = h.writer.create_idea(Idea::new("user-1", "Pet CRM")).await.unwrap();
        h.writer.update_idea(idea.clone()).await.unwrap();
        h.remote.fail_call(3);

        h.reconciler.sync_all().await.unwrap();

        let stored_app = h.store.get(EntityKind::Apps, &app.id).await.unwrap().unwrap();
        assert!(stored_app.synced());
        // The update is still queued, so the create alone does not settle it
        let stored_idea = h.store.get(EntityKind::Ideas, &idea.id).await.unwrap().unwrap();
        assert!(!stored_idea.synced());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn slow_remote_call_times_out_and_stays_queued() {
        let h = harness(SyncOptions {
            remote_timeout: Duration::from_millis(50),
            ..SyncOptions::default()
        })
        .await;
        h.writer.create_app(App::new("user-1", "Launchpad")).await.unwrap();
        h.remote.set_latency(Some(Duration::from_secs(5)));

        let report = h.reconciler.sync_all().await.unwrap();

        assert_eq!(report.applied, 0);
        assert_eq!(report.remaining, 1);
        assert!(report.failed[0].error.contains("timed out"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pull_replaces_synced_rows_and_keeps_pending_ones() {
        let h = harness(SyncOptions::default()).await;
        let stale = App::new("user-1", "Stale");
        let mut stale_synced = stale.clone();
        stale_synced.synced = true;
        h.store.put(&stale_synced.into_entity()).await.unwrap();
        let local = h.writer.create_app(App::new("user-1", "Local only")).await.unwrap();
        let server = App::new("user-1", "From server");
        h.remote.seed(server.clone().into_entity());

        let apps = h
            .reconciler
            .pull_apps_from_server(&RecordFilter::default().for_user("user-1"))
            .await
            .unwrap();

        let mut names: Vec<_> = apps.iter().map(|app| app.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["From server", "Local only"]);
        assert!(apps.iter().any(|app| app.id == local.id && !app.synced));
        assert!(apps.iter().any(|app| app.id == server.id && app.synced));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn status_filtered_pull_refreshes_rows_that_moved_into_scope() {
        let h = harness(SyncOptions::default()).await;
        let mut task = Task::new("user-1", "app-1", "Pricing page");
        task.synced = true;
        h.store.put(&task.clone().into_entity()).await.unwrap();
        let mut finished = task.clone();
        finished.status = TaskStatus::Done;
        h.remote.seed(finished.into_entity());

        let pulled = h
            .reconciler
            .pull_tasks_from_server(&RecordFilter::default().with_status("done"))
            .await
            .unwrap();

        assert_eq!(pulled.len(), 1);
        assert_eq!(pulled[0].status, TaskStatus::Done);
        assert!(pulled[0].synced);
        let stored = h.store.get(EntityKind::Tasks, &task.id).await.unwrap().unwrap();
        assert_eq!(stored.status(), Some("done"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn filtered_pull_keeps_unsynced_rows_outside_scope() {
        let h = harness(SyncOptions::default()).await;
        let mut task = h
            .writer
            .create_task(Task::new("user-1", "app-1", "Pricing page"))
            .await
            .unwrap();
        task.title = "Pricing page v2".to_string();
        let edited = h.writer.update_task(task.clone()).await.unwrap();
        let mut server = edited.clone();
        server.status = TaskStatus::Done;
        server.title = "Pricing page (server)".to_string();
        h.remote.seed(server.into_entity());

        h.reconciler
            .pull_tasks_from_server(&RecordFilter::default().with_status("done"))
            .await
            .unwrap();

        let stored = Task::from_entity(h.store.get(EntityKind::Tasks, &task.id).await.unwrap().unwrap())
            .unwrap();
        assert_eq!(stored.title, "Pricing page v2");
        assert!(!stored.synced);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pull_all_reports_per_kind_counts() {
        let h = harness(SyncOptions::default()).await;
        let app = App::new("user-1", "Launchpad");
        h.remote.seed(Entity::App(app.clone()));
        h.remote.seed(Task::new("user-1", &app.id, "One").into_entity());
        h.remote.seed(Task::new("user-1", &app.id, "Two").into_entity());

        let summary = h
            .reconciler
            .pull_all_from_server(&RecordFilter::default())
            .await
            .unwrap();

        assert_eq!(
            summary,
            PullSummary {
                apps: 1,
                ideas: 0,
                tasks: 2,
                notes: 0
            }
        );
        assert_eq!(summary.total(), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pull_while_offline_is_rejected() {
        let h = harness(SyncOptions::default()).await;
        h.connectivity.set_online(false);
        assert_eq!(h.connectivity.state(), Connectivity::Offline);

        let result = h.reconciler.pull_notes_from_server(&RecordFilter::default()).await;
        assert!(matches!(result, Err(Error::Offline)));
        assert_eq!(h.remote.call_count(), 0);
    }

    #[test]
    fn policy_parses_from_config_values() {
        assert_eq!("on-push".parse::<SyncedFlagPolicy>().unwrap(), SyncedFlagPolicy::OnPush);
        assert_eq!("PULL_ONLY".parse::<SyncedFlagPolicy>().unwrap(), SyncedFlagPolicy::PullOnly);
        assert!("sometimes".parse::<SyncedFlagPolicy>().is_err());
    }
}
