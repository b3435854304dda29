//! Offline sync: the queue writer, the reconciler and the remote stores
//! they replay against.

mod memory;
mod reconciler;
mod remote;
mod writer;

pub use memory::{MemoryRemoteStore, RemoteCall};
pub use reconciler::{
    FailedEntry, PullSummary, Reconciler, SyncOptions, SyncReport, SyncedFlagPolicy,
    DEFAULT_REMOTE_TIMEOUT,
};
pub use remote::{RemoteConfig, RemoteError, RemoteResult, RemoteStore, SupabaseRemoteStore};
pub use writer::SyncQueueWriter;
