pub mod polling;
pub mod presence;
pub mod ranking;

pub use polling::{
    AdaptivePoller, AppLifecycle, AppState, AppStateChannel, FeedFetcher, PollerState,
};
pub use presence::{online_status, OnlineStatus};
pub use ranking::{PostScorer, RankingError};
