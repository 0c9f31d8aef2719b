use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 16;

/// Host application visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    Active,
    Inactive,
    Background,
}

impl AppState {
    pub fn is_active(&self) -> bool {
        matches!(self, AppState::Active)
    }
}

/// Source of foreground/background transitions.
///
/// Dropping the receiver returned by `subscribe` unsubscribes.
pub trait AppLifecycle: Send + Sync {
    fn current(&self) -> AppState;

    fn subscribe(&self) -> broadcast::Receiver<AppState>;
}

/// Broadcast-backed lifecycle source. The host calls [`AppStateChannel::set`]
/// from its platform hook.
pub struct AppStateChannel {
    current: Mutex<AppState>,
    sender: broadcast::Sender<AppState>,
}

impl AppStateChannel {
    pub fn new(initial: AppState) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            current: Mutex::new(initial),
            sender,
        }
    }

    /// Records the new state and notifies subscribers. Repeats of the current state are dropped.
    pub fn set(&self, state: AppState) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if *current == state {
            return;
        }
        debug!(from = ?*current, to = ?state, "App state changed");
        *current = state;
        // no subscribers is fine
        let _ = self.sender.send(state);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for AppStateChannel {
    fn default() -> Self {
        Self::new(AppState::Active)
    }
}

impl AppLifecycle for AppStateChannel {
    fn current(&self) -> AppState {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribe(&self) -> broadcast::Receiver<AppState> {
        self.sender.subscribe()
    }
}
