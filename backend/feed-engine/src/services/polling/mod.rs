// ============================================
// Adaptive Polling Module
// ============================================
//
// Refreshes the feed on a timer whose period follows realtime channel health:
// slow while the push channel delivers, fast while it does not. A foreground
// resume after the background grace period triggers one extra refresh.
//
// The poller never looks at fetch results. Overlapping fetches are allowed.

pub mod lifecycle;
pub mod scheduler;

pub use lifecycle::{AppLifecycle, AppState, AppStateChannel};
pub use scheduler::{AdaptivePoller, PollerState};

use async_trait::async_trait;
use std::future::Future;

/// Refresh callback invoked by the poller.
///
/// Implemented for any `Fn() -> impl Future<Output = ()>` closure as well.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self);
}

#[async_trait]
impl<F, Fut> FeedFetcher for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn fetch(&self) {
        (self)().await
    }
}
