/// Post Scoring Module
///
/// Scores feed items from independent non-negative contributions and orders
/// them for display. Everything here is pure: the caller's items and view
/// state are only read, and a fixed `now` yields a fixed result.
use crate::config::ScoringWeights;
use crate::models::{is_unseen, FeedItem, PriorityBucket, PriorityBuckets, ViewStateMap};
use crate::utils::{exponential_decay, log_damped};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// Per-contribution view of a score, mostly for debugging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub recency: f64,
    pub pin: f64,
    pub unanswered: f64,
    pub unseen: f64,
    pub engagement: f64,
}

impl ScoreBreakdown {
    /// Sum of all contributions, never below zero.
    pub fn total(&self) -> f64 {
        let sum = self.recency + self.pin + self.unanswered + self.unseen + self.engagement;
        // NaN.max(0.0) is 0.0
        sum.max(0.0)
    }
}

/// An item paired with the score it was ranked by.
#[derive(Debug, Clone, Copy)]
pub struct ScoredPost<'a> {
    pub item: &'a FeedItem,
    pub score: f64,
}

pub struct PostScorer {
    weights: ScoringWeights,
}

impl Default for PostScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl PostScorer {
    pub fn new() -> Self {
        Self {
            weights: ScoringWeights::default(),
        }
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn breakdown(
        &self,
        item: &FeedItem,
        view_state: &ViewStateMap,
        now: DateTime<Utc>,
    ) -> ScoreBreakdown {
        let w = &self.weights;

        ScoreBreakdown {
            recency: w.recency_max
                * exponential_decay(item.age_hours(now), w.recency_half_life_hours),
            pin: if item.is_pinned { w.pin_bonus } else { 0.0 },
            unanswered: if item.is_unanswered_question() {
                w.unanswered_bonus
            } else {
                0.0
            },
            unseen: if is_unseen(item, view_state) {
                w.unseen_bonus
            } else {
                0.0
            },
            engagement: w.like_weight * log_damped(item.like_count)
                + w.reply_weight * log_damped(item.reply_count),
        }
    }

    pub fn score_at(&self, item: &FeedItem, view_state: &ViewStateMap, now: DateTime<Utc>) -> f64 {
        self.breakdown(item, view_state, now).total()
    }

    pub fn score(&self, item: &FeedItem, view_state: &ViewStateMap) -> f64 {
        self.score_at(item, view_state, Utc::now())
    }

    /// Scores every item once against the same `now` and sorts descending.
    /// The sort is stable, so equal scores keep their input order.
    pub fn rank_scored<'a>(
        &self,
        items: &'a [FeedItem],
        view_state: &ViewStateMap,
        now: DateTime<Utc>,
    ) -> Vec<ScoredPost<'a>> {
        let mut scored: Vec<ScoredPost<'a>> = items
            .iter()
            .map(|item| ScoredPost {
                item,
                score: self.score_at(item, view_state, now),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        debug!(
            item_count = scored.len(),
            top_score = scored.first().map(|p| p.score),
            "Feed ranked"
        );

        scored
    }

    pub fn rank_at(
        &self,
        items: &[FeedItem],
        view_state: &ViewStateMap,
        now: DateTime<Utc>,
    ) -> Vec<FeedItem> {
        self.rank_scored(items, view_state, now)
            .into_iter()
            .map(|p| p.item.clone())
            .collect()
    }

    pub fn rank(&self, items: &[FeedItem], view_state: &ViewStateMap) -> Vec<FeedItem> {
        self.rank_at(items, view_state, Utc::now())
    }

    /// Partitions items into priority sections, each kept in rank order.
    pub fn group_by_priority_at(
        &self,
        items: &[FeedItem],
        view_state: &ViewStateMap,
        now: DateTime<Utc>,
    ) -> PriorityBuckets {
        let mut buckets = PriorityBuckets::default();
        for scored in self.rank_scored(items, view_state, now) {
            let bucket = priority_bucket(scored.item, view_state);
            buckets.push(bucket, scored.item.clone());
        }

        let counts = buckets.counts();
        debug!(
            pinned = counts.pinned,
            unseen_unanswered = counts.unseen_unanswered,
            seen_other = counts.seen_other,
            "Feed grouped by priority"
        );

        buckets
    }
}

/// Bucket precedence: pinned, then unseen unresolved question, then everything else.
pub fn priority_bucket(item: &FeedItem, view_state: &ViewStateMap) -> PriorityBucket {
    if item.is_pinned {
        PriorityBucket::Pinned
    } else if item.is_unresolved_question() && is_unseen(item, view_state) {
        PriorityBucket::UnseenUnanswered
    } else {
        PriorityBucket::SeenOther
    }
}
