pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use config::{Config, PollingConfig, ScoringWeights};
pub use models::{
    FeedItem, PostKind, PriorityBucket, PriorityBuckets, ShowFilter, ViewRecord, ViewStateMap,
};
pub use services::ranking::{
    calculate_post_score, filter_and_rank, group_posts_by_priority, parse_feed, rank_posts,
    should_show_post,
};
pub use services::{
    AdaptivePoller, AppLifecycle, AppState, AppStateChannel, FeedFetcher, PollerState, PostScorer,
    RankingError,
};
