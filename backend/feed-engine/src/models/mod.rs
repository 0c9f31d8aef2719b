use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// A rankable feed entry (post or message) as delivered by the backend.
///
/// The engine only ever reads these; view tracking lives outside the item in
/// a [`ViewStateMap`] so one collection can be ranked for many viewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    #[serde(default)]
    pub id: String,
    /// `None` when the backend omitted the field or sent an unparsable value.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub kind: PostKind,
    #[serde(default)]
    pub reply_count: u32,
    #[serde(default)]
    pub has_accepted_answer: bool,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
}

impl FeedItem {
    pub fn new(id: impl Into<String>, kind: PostKind, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_at: Some(created_at),
            kind,
            reply_count: 0,
            has_accepted_answer: false,
            like_count: 0,
            is_pinned: false,
            author_id: None,
        }
    }

    /// Open question: no accepted answer and nobody has replied yet.
    pub fn is_unanswered_question(&self) -> bool {
        self.kind == PostKind::Question && !self.has_accepted_answer && self.reply_count == 0
    }

    /// Question without an accepted answer, replies or not.
    pub fn is_unresolved_question(&self) -> bool {
        self.kind == PostKind::Question && !self.has_accepted_answer
    }

    /// Age in hours at `now`. Future timestamps count as fresh, unknown ones as infinitely old.
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        match self.created_at {
            Some(created_at) => {
                let age_seconds = (now - created_at).num_seconds().max(0) as f64;
                age_seconds / 3600.0
            }
            None => f64::INFINITY,
        }
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok(),
        // epoch milliseconds
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Question,
    #[default]
    Discussion,
    Announcement,
    #[serde(other)]
    Other,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Question => "question",
            PostKind::Discussion => "discussion",
            PostKind::Announcement => "announcement",
            PostKind::Other => "other",
        }
    }
}

/// Per-viewer record of whether an item was opened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRecord {
    #[serde(default)]
    pub viewed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewed_at: Option<DateTime<Utc>>,
}

/// Item id -> view record. Missing keys mean "not seen".
pub type ViewStateMap = HashMap<String, ViewRecord>;

pub fn is_unseen(item: &FeedItem, view_state: &ViewStateMap) -> bool {
    !view_state.get(&item.id).is_some_and(|record| record.viewed)
}

/// Declarative feed query. Unset options never exclude anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowFilter {
    #[serde(default)]
    pub only_unanswered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_type: Option<PostKind>,
}

impl ShowFilter {
    pub fn only_unanswered() -> Self {
        Self {
            only_unanswered: true,
            post_type: None,
        }
    }

    pub fn post_type(kind: PostKind) -> Self {
        Self {
            only_unanswered: false,
            post_type: Some(kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriorityBucket {
    Pinned,
    UnseenUnanswered,
    SeenOther,
}

impl PriorityBucket {
    /// Render order for sectioned lists.
    pub const ALL: [PriorityBucket; 3] = [
        PriorityBucket::Pinned,
        PriorityBucket::UnseenUnanswered,
        PriorityBucket::SeenOther,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityBucket::Pinned => "pinned",
            PriorityBucket::UnseenUnanswered => "unseenUnanswered",
            PriorityBucket::SeenOther => "seenOther",
        }
    }
}

/// Items partitioned into the three priority sections, each in rank order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityBuckets {
    pub pinned: Vec<FeedItem>,
    pub unseen_unanswered: Vec<FeedItem>,
    pub seen_other: Vec<FeedItem>,
}

impl PriorityBuckets {
    pub fn get(&self, bucket: PriorityBucket) -> &[FeedItem] {
        match bucket {
            PriorityBucket::Pinned => &self.pinned,
            PriorityBucket::UnseenUnanswered => &self.unseen_unanswered,
            PriorityBucket::SeenOther => &self.seen_other,
        }
    }

    pub(crate) fn push(&mut self, bucket: PriorityBucket, item: FeedItem) {
        match bucket {
            PriorityBucket::Pinned => self.pinned.push(item),
            PriorityBucket::UnseenUnanswered => self.unseen_unanswered.push(item),
            PriorityBucket::SeenOther => self.seen_other.push(item),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PriorityBucket, &[FeedItem])> {
        PriorityBucket::ALL
            .into_iter()
            .map(move |bucket| (bucket, self.get(bucket)))
    }

    pub fn len(&self) -> usize {
        self.pinned.len() + self.unseen_unanswered.len() + self.seen_other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> BucketCounts {
        BucketCounts {
            pinned: self.pinned.len(),
            unseen_unanswered: self.unseen_unanswered.len(),
            seen_other: self.seen_other.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCounts {
    pub pinned: usize,
    pub unseen_unanswered: usize,
    pub seen_other: usize,
}
