//! Explicitly wired offline sync stack.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::connectivity::ConnectivityObserver;
use crate::db::{LocalStore, RecordFilter};
use crate::error::Result;
use crate::models::Record;
use crate::sync::{Reconciler, RemoteStore, SyncOptions, SyncQueueWriter, SyncReport};
use crate::worker::{ClientMessage, FetchRequest, Fetcher};

/// The writer, the reconciler and the connectivity observer over one local
/// store and one remote store.
#[derive(Clone)]
pub struct OfflineSyncService<S, R> {
    store: S,
    writer: SyncQueueWriter<S>,
    reconciler: Reconciler<S, R>,
    connectivity: ConnectivityObserver,
}

impl<S: LocalStore, R: RemoteStore> OfflineSyncService<S, R> {
    pub fn new(
        store: S,
        remote: R,
        connectivity: ConnectivityObserver,
        clock: Arc<dyn Clock>,
        options: SyncOptions,
    ) -> Self {
        Self {
            writer: SyncQueueWriter::new(store.clone(), clock),
            reconciler: Reconciler::new(store.clone(), remote, connectivity.clone(), options),
            store,
            connectivity,
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn writer(&self) -> &SyncQueueWriter<S> {
        &self.writer
    }

    pub const fn reconciler(&self) -> &Reconciler<S, R> {
        &self.reconciler
    }

    pub const fn connectivity(&self) -> &ConnectivityObserver {
        &self.connectivity
    }

    /// Locally visible records of type `T`
    pub async fn list<T: Record>(&self, filter: &RecordFilter) -> Result<Vec<T>> {
        let entities = self.store.query(T::KIND, filter).await.inspect_err(|e| {
            tracing::error!("Failed to read {} from local store: {}", T::KIND, e);
        })?;
        Ok(entities.into_iter().filter_map(T::from_entity).collect())
    }

    pub async fn pending_count(&self) -> Result<usize> {
        self.store.count_log().await
    }

    /// Replay the queue now. Failures are logged here and still returned.
    pub async fn sync_now(&self) -> Result<SyncReport> {
        self.reconciler.sync_all().await.inspect_err(|e| {
            tracing::error!("Sync failed: {}", e);
        })
    }
}

/// Replay the queue every time connectivity comes back.
pub fn spawn_sync_on_reconnect<S: LocalStore, R: RemoteStore>(
    service: Arc<OfflineSyncService<S, R>>,
) -> JoinHandle<()> {
    let mut changes = service.connectivity().subscribe();
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let state = *changes.borrow_and_update();
            if !state.is_online() {
                continue;
            }
            tracing::info!("Back online, replaying queued changes");
            service.sync_now().await.ok();
        }
    })
}

/// Run the reconciler whenever the cache worker reports queued changes.
pub fn spawn_worker_relay<S: LocalStore, R: RemoteStore>(
    service: Arc<OfflineSyncService<S, R>>,
    mut clients: broadcast::Receiver<ClientMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match clients.recv().await {
                Ok(ClientMessage::SyncComplete { count }) => {
                    if count == 0 || !service.connectivity().is_online() {
                        continue;
                    }
                    tracing::debug!("Worker reported {} queued change(s)", count);
                    service.sync_now().await.ok();
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {} worker message(s)", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Poll `target` every `interval` and publish the outcome to `connectivity`.
///
/// Any HTTP response counts as online; only transport failures count as
/// offline.
pub fn spawn_connectivity_heartbeat<F: Fetcher>(
    connectivity: ConnectivityObserver,
    fetcher: F,
    target: FetchRequest,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let online = match fetcher.fetch(&target).await {
                Ok(_) => true,
                Err(e) => {
                    tracing::debug!("Connectivity check against {} failed: {}", target.url, e);
                    false
                }
            };
            connectivity.set_online(online);
        }
    })
}
