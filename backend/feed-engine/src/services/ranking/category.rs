use super::PostScorer;
use crate::models::{FeedItem, PostKind, ViewStateMap};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Display grouping for a feed tab or section header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedCategory {
    Questions,
    Discussions,
    Announcements,
    General,
}

impl FeedCategory {
    pub const ALL: [FeedCategory; 4] = [
        FeedCategory::Questions,
        FeedCategory::Discussions,
        FeedCategory::Announcements,
        FeedCategory::General,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FeedCategory::Questions => "Questions",
            FeedCategory::Discussions => "Discussions",
            FeedCategory::Announcements => "Announcements",
            FeedCategory::General => "General",
        }
    }
}

impl From<PostKind> for FeedCategory {
    fn from(kind: PostKind) -> Self {
        match kind {
            PostKind::Question => FeedCategory::Questions,
            PostKind::Discussion => FeedCategory::Discussions,
            PostKind::Announcement => FeedCategory::Announcements,
            PostKind::Other => FeedCategory::General,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySection {
    pub category: FeedCategory,
    pub items: Vec<FeedItem>,
}

/// Ranks `items` for the viewer, then splits them into category sections.
/// Sections come out in [`FeedCategory::ALL`] order, each in rank order, and
/// empty ones are skipped.
pub fn group_by_category(items: &[FeedItem], view_state: &ViewStateMap) -> Vec<CategorySection> {
    group_by_category_at(items, view_state, Utc::now())
}

pub fn group_by_category_at(
    items: &[FeedItem],
    view_state: &ViewStateMap,
    now: DateTime<Utc>,
) -> Vec<CategorySection> {
    let mut sections: Vec<CategorySection> = FeedCategory::ALL
        .into_iter()
        .map(|category| CategorySection {
            category,
            items: Vec::new(),
        })
        .collect();

    for item in PostScorer::new().rank_at(items, view_state, now) {
        let category = FeedCategory::from(item.kind);
        if let Some(section) = sections.iter_mut().find(|s| s.category == category) {
            section.items.push(item);
        }
    }

    sections.retain(|s| !s.items.is_empty());
    sections
}
