//! Online/offline signal shared by the sync layer and its callers.
//!
//! The observer never polls. The host environment reports transitions with
//! [`ConnectivityObserver::set_online`] and dependents react through
//! [`ConnectivityObserver::subscribe`].

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}

impl Connectivity {
    pub const fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

impl From<bool> for Connectivity {
    fn from(online: bool) -> Self {
        if online {
            Self::Online
        } else {
            Self::Offline
        }
    }
}

/// Cloneable handle to the current connectivity state.
#[derive(Clone, Debug)]
pub struct ConnectivityObserver {
    state: Arc<watch::Sender<Connectivity>>,
}

impl Default for ConnectivityObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityObserver {
    /// Starts out `Online` until the host reports otherwise, so nothing is
    /// blocked before the first status event arrives.
    pub fn new() -> Self {
        Self::with_state(Connectivity::Online)
    }

    pub fn with_state(initial: Connectivity) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> Connectivity {
        *self.state.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.state().is_online()
    }

    /// Record a status event from the host. Subscribers are only woken on an
    /// actual transition. Returns whether the state changed.
    pub fn set_online(&self, online: bool) -> bool {
        let next = Connectivity::from(online);
        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        if changed {
            tracing::info!("Connectivity changed: {:?}", next);
        }
        changed
    }

    /// Receiver that resolves `changed()` on every transition
    pub fn subscribe(&self) -> watch::Receiver<Connectivity> {
        self.state.subscribe()
    }
}
