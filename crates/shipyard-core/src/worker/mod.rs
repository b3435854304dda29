//! Cache worker: a separately scheduled actor that answers fetches from
//! versioned caches while the network is away and relays background sync
//! signals to its clients.
//!
//! The worker shares nothing with the sync service except the durable
//! store. All interaction goes through a [`WorkerHandle`] mailbox and the
//! client broadcast channel.

mod cache;
mod fetch;
mod messages;
mod strategy;

use http::Method;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::{CacheNames, WorkerConfig};
use crate::db::LocalStore;

pub use cache::{CacheStorage, LibSqlCacheStorage};
pub use fetch::{FetchError, FetchRequest, FetchResponse, Fetcher, ReqwestFetcher, RequestMode};
pub use messages::{ClientMessage, PushPayload, SyncReply, WorkerMessage};
pub use strategy::{
    cache_first, classify, network_first, offline_api_response, offline_text_response,
    RequestClass, OFFLINE_API_ERROR,
};

const MAILBOX_CAPACITY: usize = 64;
const CLIENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Storage(#[from] crate::Error),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Failed to pre-cache {url}: HTTP {status}")]
    Install { url: String, status: u16 },
    #[error("Cache worker is not running")]
    Stopped,
}

/// Lifecycle position of the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installed,
    Active,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Caches from other versions that were dropped
    pub deleted_caches: Vec<String>,
    pub periodic_sync_registered: bool,
}

/// Events delivered to the worker mailbox, handled one at a time
#[derive(Debug)]
pub enum WorkerEvent {
    Install {
        done: oneshot::Sender<Result<ActivationReport, WorkerError>>,
    },
    Activate {
        done: oneshot::Sender<Result<ActivationReport, WorkerError>>,
    },
    Fetch {
        request: FetchRequest,
        respond: oneshot::Sender<FetchResponse>,
    },
    Message {
        message: WorkerMessage,
        reply: oneshot::Sender<SyncReply>,
    },
    Sync {
        tag: String,
    },
}

pub struct CacheWorker<F, C, S> {
    config: WorkerConfig,
    names: CacheNames,
    fetcher: F,
    caches: C,
    queue: S,
    clients: broadcast::Sender<ClientMessage>,
    state: WorkerState,
    mailbox: Option<mpsc::WeakSender<WorkerEvent>>,
    periodic_sync: Option<JoinHandle<()>>,
}

impl<F: Fetcher, C: CacheStorage, S: LocalStore> CacheWorker<F, C, S> {
    /// `queue` must read the same durable store the sync service writes to.
    pub fn new(config: WorkerConfig, fetcher: F, caches: C, queue: S) -> Self {
        let (clients, _) = broadcast::channel(CLIENT_CHANNEL_CAPACITY);
        Self {
            names: config.cache_names(),
            config,
            fetcher,
            caches,
            queue,
            clients,
            state: WorkerState::Parsed,
            mailbox: None,
            periodic_sync: None,
        }
    }

    pub const fn state(&self) -> WorkerState {
        self.state
    }

    pub const fn cache_names(&self) -> &CacheNames {
        &self.names
    }

    pub fn subscribe_clients(&self) -> broadcast::Receiver<ClientMessage> {
        self.clients.subscribe()
    }

    /// Move the worker onto its own task.
    pub fn spawn(mut self) -> (WorkerHandle, JoinHandle<()>) {
        let (events, mut inbox) = mpsc::channel(MAILBOX_CAPACITY);
        self.mailbox = Some(events.downgrade());
        let handle = WorkerHandle {
            events,
            clients: self.clients.clone(),
        };

        let task = tokio::spawn(async move {
            while let Some(event) = inbox.recv().await {
                self.dispatch(event).await;
            }
            if let Some(periodic) = self.periodic_sync.take() {
                periodic.abort();
            }
            tracing::debug!("Cache worker mailbox closed");
        });

        (handle, task)
    }

    async fn dispatch(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Install { done } => {
                let result = self.install().await;
                done.send(result).ok();
            }
            WorkerEvent::Activate { done } => {
                let result = self.activate().await;
                done.send(result).ok();
            }
            WorkerEvent::Fetch { request, respond } => {
                let response = self.handle_fetch(&request).await;
                respond.send(response).ok();
            }
            WorkerEvent::Message { message, reply } => {
                let response = self.handle_message(message).await;
                reply.send(response).ok();
            }
            WorkerEvent::Sync { tag } => self.handle_sync(&tag).await,
        }
    }

    /// Pre-cache the asset manifest, then activate right away without
    /// waiting for clients of an older version to go away.
    ///
    /// Any asset that fails to load fails the whole install and nothing is
    /// cached.
    pub async fn install(&mut self) -> Result<ActivationReport, WorkerError> {
        tracing::info!("Installing cache worker {}", self.config.cache_version);

        let mut fetched = Vec::with_capacity(self.config.static_assets.len());
        for path in &self.config.static_assets {
            let request = FetchRequest::get(self.config.asset_url(path));
            let response = self.fetcher.fetch(&request).await?;
            if !response.is_success() {
                return Err(WorkerError::Install {
                    url: request.url,
                    status: response.status.as_u16(),
                });
            }
            // The offline fallback lives in the main cache, the rest of the shell in static
            let cache = if *path == self.config.offline_page {
                &self.names.main
            } else {
                &self.names.static_assets
            };
            fetched.push((cache, request.cache_key(), response));
        }
        for (cache, key, response) in &fetched {
            self.caches.put(cache, key, response).await?;
        }

        self.state = WorkerState::Installed;
        tracing::info!(
            "Pre-cached {} static asset(s), skipping waiting",
            fetched.len()
        );
        self.activate().await
    }

    /// Drop caches from other versions, take control of clients and
    /// register the periodic background sync.
    pub async fn activate(&mut self) -> Result<ActivationReport, WorkerError> {
        let mut report = ActivationReport::default();
        for name in self.caches.cache_names().await? {
            if self.names.contains(&name) {
                continue;
            }
            if self.caches.delete_cache(&name).await? {
                tracing::info!("Deleted stale cache {}", name);
                report.deleted_caches.push(name);
            }
        }

        self.state = WorkerState::Active;
        tracing::info!(
            "Cache worker {} active, claiming clients",
            self.config.cache_version
        );
        report.periodic_sync_registered = self.register_periodic_sync();
        Ok(report)
    }

    /// Best effort; failure only disables the periodic signal.
    fn register_periodic_sync(&mut self) -> bool {
        let Some(interval) = self
            .config
            .periodic_sync_interval
            .filter(|interval| !interval.is_zero())
        else {
            tracing::warn!("Periodic background sync not registered: no interval configured");
            return false;
        };
        let Some(mailbox) = self.mailbox.clone() else {
            tracing::warn!("Periodic background sync not registered: worker is not running");
            return false;
        };

        if let Some(previous) = self.periodic_sync.take() {
            previous.abort();
        }
        let tag = self.config.sync_tag.clone();
        self.periodic_sync = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(events) = mailbox.upgrade() else {
                    break;
                };
                if events.send(WorkerEvent::Sync { tag: tag.clone() }).await.is_err() {
                    break;
                }
            }
        }));
        tracing::info!("Registered periodic background sync every {:?}", interval);
        true
    }

    /// Answer a fetch. Always produces a response; offline failures become
    /// synthesized 503s.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> FetchResponse {
        let class = classify(request, &self.config);

        if request.method != Method::GET {
            return match self.fetcher.fetch(request).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!("{} {} failed: {}", request.method, request.url, e);
                    match class {
                        RequestClass::Api => offline_api_response(),
                        RequestClass::Navigation | RequestClass::Static => offline_text_response(),
                    }
                }
            };
        }

        match class {
            RequestClass::Api => {
                network_first(&self.fetcher, &self.caches, &self.names.dynamic, request)
                    .await
                    .unwrap_or_else(offline_api_response)
            }
            RequestClass::Navigation => {
                match network_first(&self.fetcher, &self.caches, &self.names.dynamic, request).await
                {
                    Some(response) => response,
                    None => self.offline_page().await,
                }
            }
            RequestClass::Static => {
                cache_first(&self.fetcher, &self.caches, &self.names.dynamic, request)
                    .await
                    .unwrap_or_else(offline_text_response)
            }
        }
    }

    async fn offline_page(&self) -> FetchResponse {
        let key = FetchRequest::get(self.config.asset_url(&self.config.offline_page)).cache_key();
        match self.caches.match_in(&self.names.main, &key).await {
            Ok(Some(page)) => page,
            Ok(None) => offline_text_response(),
            Err(e) => {
                tracing::warn!("Offline page lookup failed: {}", e);
                offline_text_response()
            }
        }
    }

    pub async fn handle_message(&mut self, message: WorkerMessage) -> SyncReply {
        match message {
            WorkerMessage::SyncNow => match self.run_sync().await {
                Ok(_) => SyncReply::ok(),
                Err(e) => {
                    tracing::warn!("Requested sync failed: {}", e);
                    SyncReply::failed(e)
                }
            },
            WorkerMessage::SkipWaiting => match self.state {
                WorkerState::Active => SyncReply::ok(),
                WorkerState::Parsed | WorkerState::Installed => match self.activate().await {
                    Ok(_) => SyncReply::ok(),
                    Err(e) => SyncReply::failed(e),
                },
            },
        }
    }

    /// Background sync signal. Errors are logged, never propagated.
    pub async fn handle_sync(&self, tag: &str) {
        if tag != self.config.sync_tag {
            tracing::debug!("Ignoring sync event with unknown tag {}", tag);
            return;
        }
        if let Err(e) = self.run_sync().await {
            tracing::error!("Background sync failed: {}", e);
        }
    }

    /// Count queued changes and tell every client how many are pending.
    async fn run_sync(&self) -> Result<usize, WorkerError> {
        let count = self.queue.count_log().await?;
        let delivered = self
            .clients
            .send(ClientMessage::SyncComplete { count })
            .unwrap_or(0);
        tracing::debug!(
            "Sync routine found {} queued change(s), notified {} client(s)",
            count,
            delivered
        );
        Ok(count)
    }
}

/// Cloneable handle to a spawned [`CacheWorker`]
#[derive(Clone)]
pub struct WorkerHandle {
    events: mpsc::Sender<WorkerEvent>,
    clients: broadcast::Sender<ClientMessage>,
}

impl WorkerHandle {
    async fn request<T>(
        &self,
        event: impl FnOnce(oneshot::Sender<T>) -> WorkerEvent,
    ) -> Result<T, WorkerError> {
        let (tx, rx) = oneshot::channel();
        self.events
            .send(event(tx))
            .await
            .map_err(|_| WorkerError::Stopped)?;
        rx.await.map_err(|_| WorkerError::Stopped)
    }

    pub async fn install(&self) -> Result<ActivationReport, WorkerError> {
        self.request(|done| WorkerEvent::Install { done }).await?
    }

    pub async fn activate(&self) -> Result<ActivationReport, WorkerError> {
        self.request(|done| WorkerEvent::Activate { done }).await?
    }

    pub async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, WorkerError> {
        self.request(|respond| WorkerEvent::Fetch { request, respond })
            .await
    }

    /// Post a message and wait for the reply on its port
    pub async fn post_message(&self, message: WorkerMessage) -> Result<SyncReply, WorkerError> {
        self.request(|reply| WorkerEvent::Message { message, reply })
            .await
    }

    /// Queue a background sync event without waiting for it to run
    pub async fn sync(&self, tag: impl Into<String>) -> Result<(), WorkerError> {
        self.events
            .send(WorkerEvent::Sync { tag: tag.into() })
            .await
            .map_err(|_| WorkerError::Stopped)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientMessage> {
        self.clients.subscribe()
    }
}
