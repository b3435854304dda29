use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use shipyard_core::config::SyncSettings;
use shipyard_core::services::{
    spawn_connectivity_heartbeat, spawn_sync_on_reconnect, spawn_worker_relay,
};
use shipyard_core::worker::{
    CacheWorker, FetchRequest, LibSqlCacheStorage, ReqwestFetcher, WorkerError,
};

use crate::commands::common::open_service;
use crate::error::CliError;

const CONNECTIVITY_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Keep the cache worker and both sync triggers running until Ctrl-C.
pub async fn run_watch(
    offline: bool,
    settings: &SyncSettings,
    db_path: &Path,
) -> Result<(), CliError> {
    let service = Arc::new(open_service(db_path, settings, offline).await?);
    let store = service.store().clone();
    let worker_config = settings.worker_config();
    let sync_tag = worker_config.sync_tag.clone();

    let fetcher = ReqwestFetcher::new(settings.remote_timeout).map_err(WorkerError::from)?;
    // --offline pins the observer offline for the whole session
    let heartbeat = (!offline)
        .then(|| settings.remote_config())
        .flatten()
        .map(|remote| {
            let url = format!("{}/rest/v1/", remote.url.trim_end_matches('/'));
            spawn_connectivity_heartbeat(
                service.connectivity().clone(),
                fetcher.clone(),
                FetchRequest::get(url),
                CONNECTIVITY_HEARTBEAT_INTERVAL,
            )
        });

    let worker = CacheWorker::new(
        worker_config,
        fetcher,
        LibSqlCacheStorage::new(store.shared()),
        store,
    );
    let (handle, worker_task) = worker.spawn();
    let relay = spawn_worker_relay(Arc::clone(&service), handle.subscribe());
    let reconnect = spawn_sync_on_reconnect(Arc::clone(&service));

    let activation = handle.activate().await?;
    if !activation.deleted_caches.is_empty() {
        tracing::info!("Dropped stale caches: {:?}", activation.deleted_caches);
    }
    handle.sync(sync_tag).await?;

    let pending = service.pending_count().await?;
    println!("Watching {pending} queued change(s); press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    relay.abort();
    reconnect.abort();
    if let Some(heartbeat) = heartbeat {
        heartbeat.abort();
    }
    drop(handle);
    worker_task.await.ok();
    println!("Stopped");
    Ok(())
}
