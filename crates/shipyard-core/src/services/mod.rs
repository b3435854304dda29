//! Service layer wiring the sync components together.

mod offline_sync;

pub use offline_sync::{
    spawn_connectivity_heartbeat, spawn_sync_on_reconnect, spawn_worker_relay, OfflineSyncService,
};
