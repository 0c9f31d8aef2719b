/// Ranking Module
///
/// Client-side feed prioritization.
///
/// # Workflow
/// 1. Decode the backend payload into [`FeedItem`]s (`parse_feed`)
/// 2. Optionally narrow it with a [`ShowFilter`]
/// 3. Score every item against the viewer's [`ViewStateMap`] and sort
/// 4. Split into priority buckets or category sections for sectioned lists
pub mod category;
pub mod filter;
pub mod scorer;

pub use category::{group_by_category, group_by_category_at, CategorySection, FeedCategory};
pub use filter::should_show_post;
pub use scorer::{priority_bucket, PostScorer, ScoreBreakdown, ScoredPost};

use crate::models::{FeedItem, PriorityBuckets, ShowFilter, ViewStateMap};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RankingError {
    #[error("Invalid feed payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RankingError>;

/// Priority score of one item with the default weights.
pub fn calculate_post_score(item: &FeedItem, view_state: &ViewStateMap) -> f64 {
    PostScorer::new().score(item, view_state)
}

pub fn rank_posts(items: &[FeedItem], view_state: &ViewStateMap) -> Vec<FeedItem> {
    PostScorer::new().rank(items, view_state)
}

pub fn group_posts_by_priority(items: &[FeedItem], view_state: &ViewStateMap) -> PriorityBuckets {
    PostScorer::new().group_by_priority_at(items, view_state, chrono::Utc::now())
}

/// Applies `filter`, then ranks what is left.
pub fn filter_and_rank(
    items: &[FeedItem],
    view_state: &ViewStateMap,
    filter: &ShowFilter,
) -> Vec<FeedItem> {
    let visible: Vec<FeedItem> = items
        .iter()
        .filter(|item| should_show_post(item, filter))
        .cloned()
        .collect();

    debug!(
        input_count = items.len(),
        visible_count = visible.len(),
        "Feed filtered"
    );

    rank_posts(&visible, view_state)
}

/// Decodes a JSON array of feed items.
///
/// Only structural problems fail; bad timestamps, unknown kinds and missing
/// fields inside an item degrade to defaults.
pub fn parse_feed(payload: &str) -> Result<Vec<FeedItem>> {
    let items: Vec<FeedItem> = serde_json::from_str(payload)?;
    debug!(item_count = items.len(), "Feed payload decoded");
    Ok(items)
}
