use crate::models::{FeedItem, ShowFilter};

/// Every option that is set must hold; unset options always pass.
pub fn should_show_post(item: &FeedItem, filter: &ShowFilter) -> bool {
    if filter.only_unanswered && !item.is_unanswered_question() {
        return false;
    }

    match filter.post_type {
        Some(kind) => item.kind == kind,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostKind;
    use chrono::Utc;

    fn sample_items() -> Vec<FeedItem> {
        let now = Utc::now();
        let open = FeedItem::new("open", PostKind::Question, now);

        let mut replied = FeedItem::new("replied", PostKind::Question, now);
        replied.reply_count = 2;

        let mut solved = FeedItem::new("solved", PostKind::Question, now);
        solved.has_accepted_answer = true;

        let discussion = FeedItem::new("discussion", PostKind::Discussion, now);
        let announcement = FeedItem::new("announcement", PostKind::Announcement, now);

        vec![open, replied, solved, discussion, announcement]
    }

    #[test]
    fn test_empty_filter_shows_everything() {
        let filter = ShowFilter::default();
        assert!(sample_items().iter().all(|item| should_show_post(item, &filter)));
    }

    #[test]
    fn test_only_unanswered() {
        let filter = ShowFilter::only_unanswered();
        let shown: Vec<_> = sample_items()
            .into_iter()
            .filter(|item| should_show_post(item, &filter))
            .map(|item| item.id)
            .collect();

        assert_eq!(shown, vec!["open".to_string()]);
    }

    #[test]
    fn test_post_type() {
        let filter = ShowFilter::post_type(PostKind::Question);
        let shown = sample_items()
            .iter()
            .filter(|item| should_show_post(item, &filter))
            .count();
        assert_eq!(shown, 3);

        let filter = ShowFilter::post_type(PostKind::Announcement);
        for item in sample_items() {
            assert_eq!(
                should_show_post(&item, &filter),
                item.kind == PostKind::Announcement
            );
        }
    }

    #[test]
    fn test_options_combine_with_and() {
        let filter = ShowFilter {
            only_unanswered: true,
            post_type: Some(PostKind::Discussion),
        };
        assert!(!sample_items().iter().any(|item| should_show_post(item, &filter)));
    }

    #[test]
    fn test_filter_from_json() {
        let filter: ShowFilter = serde_json::from_str(r#"{"postType":"question"}"#).unwrap();
        assert_eq!(filter, ShowFilter::post_type(PostKind::Question));

        let filter: ShowFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter, ShowFilter::default());
    }
}
