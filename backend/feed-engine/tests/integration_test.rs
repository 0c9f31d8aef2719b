use chrono::{Duration as ChronoDuration, Utc};
use feed_engine::{
    calculate_post_score, group_posts_by_priority, rank_posts, should_show_post, AdaptivePoller,
    AppState, AppStateChannel, FeedItem, PollingConfig, PostKind, PostScorer, PriorityBucket,
    ShowFilter, ViewRecord, ViewStateMap,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn mixed_feed() -> Vec<FeedItem> {
    let now = Utc::now();
    let mut items = Vec::new();

    for i in 0..24u32 {
        let kind = match i % 4 {
            0 | 1 => PostKind::Question,
            2 => PostKind::Discussion,
            _ => PostKind::Announcement,
        };
        let mut item = FeedItem::new(
            format!("post{}", i),
            kind,
            now - ChronoDuration::hours(i as i64 * 7),
        );
        item.like_count = (i * 37) % 120;
        item.reply_count = i % 3;
        item.has_accepted_answer = i % 5 == 0;
        item.is_pinned = i % 9 == 4;
        items.push(item);
    }

    items
}

fn viewed_every_third(items: &[FeedItem]) -> ViewStateMap {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            (
                item.id.clone(),
                ViewRecord {
                    viewed: i % 3 == 0,
                    viewed_at: None,
                },
            )
        })
        .collect()
}

#[test]
fn test_scores_are_never_negative() {
    let items = mixed_feed();
    let view_state = viewed_every_third(&items);

    for item in &items {
        assert!(calculate_post_score(item, &view_state) >= 0.0);
    }

    let mut broken = FeedItem::new("", PostKind::Other, Utc::now());
    broken.created_at = None;
    assert!(calculate_post_score(&broken, &view_state) >= 0.0);
}

#[test]
fn test_rank_posts_is_sorted_permutation() {
    let items = mixed_feed();
    let view_state = viewed_every_third(&items);
    let now = Utc::now();
    let scorer = PostScorer::new();

    let snapshot = items.clone();
    let ranked = scorer.rank_at(&items, &view_state, now);
    assert_eq!(ranked.len(), items.len());
    assert_eq!(items, snapshot);

    let input_ids: HashSet<_> = items.iter().map(|i| i.id.clone()).collect();
    let output_ids: HashSet<_> = ranked.iter().map(|i| i.id.clone()).collect();
    assert_eq!(input_ids, output_ids);

    for pair in ranked.windows(2) {
        let first = scorer.score_at(&pair[0], &view_state, now);
        let second = scorer.score_at(&pair[1], &view_state, now);
        assert!(first >= second);
    }

    // pinned items lead the feed
    let pinned_count = items.iter().filter(|i| i.is_pinned).count();
    assert!(pinned_count > 0);
    assert!(ranked[..pinned_count].iter().all(|i| i.is_pinned));

    assert_eq!(rank_posts(&items, &view_state).len(), items.len());
}

#[test]
fn test_groups_partition_input() {
    let items = mixed_feed();
    let view_state = viewed_every_third(&items);

    let buckets = group_posts_by_priority(&items, &view_state);
    assert_eq!(buckets.len(), items.len());

    let mut seen = HashSet::new();
    for (bucket, members) in buckets.iter() {
        for item in members {
            assert!(seen.insert(item.id.clone()), "{} in two buckets", item.id);
            match bucket {
                PriorityBucket::Pinned => assert!(item.is_pinned),
                PriorityBucket::UnseenUnanswered => {
                    assert!(!item.is_pinned);
                    assert_eq!(item.kind, PostKind::Question);
                    assert!(!item.has_accepted_answer);
                    assert!(!view_state[&item.id].viewed);
                }
                PriorityBucket::SeenOther => assert!(!item.is_pinned),
            }
        }
    }
    assert_eq!(seen.len(), items.len());
}

#[test]
fn test_bucket_order_follows_rank_order() {
    let items = mixed_feed();
    let view_state = viewed_every_third(&items);
    let now = Utc::now();
    let scorer = PostScorer::new();

    let ranked: Vec<String> = scorer
        .rank_at(&items, &view_state, now)
        .into_iter()
        .map(|i| i.id)
        .collect();
    let buckets = scorer.group_by_priority_at(&items, &view_state, now);

    for (_, members) in buckets.iter() {
        let positions: Vec<usize> = members
            .iter()
            .map(|m| ranked.iter().position(|id| *id == m.id).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_empty_feed() {
    let buckets = group_posts_by_priority(&[], &ViewStateMap::new());
    assert!(buckets.is_empty());
    assert!(rank_posts(&[], &ViewStateMap::new()).is_empty());
}

#[test]
fn test_filters_match_definition() {
    let items = mixed_feed();

    for item in &items {
        let unanswered = item.kind == PostKind::Question
            && item.reply_count == 0
            && !item.has_accepted_answer;
        assert_eq!(
            should_show_post(item, &ShowFilter::only_unanswered()),
            unanswered
        );

        for kind in [PostKind::Question, PostKind::Discussion, PostKind::Announcement] {
            assert_eq!(
                should_show_post(item, &ShowFilter::post_type(kind)),
                item.kind == kind
            );
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_resume_fetch_respects_grace() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let fetcher = Arc::new(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    let lifecycle = Arc::new(AppStateChannel::new(AppState::Active));
    let config = PollingConfig::default()
        .with_realtime_healthy(true)
        .with_intervals(Duration::from_secs(3600), Duration::from_secs(3600))
        .with_background_grace(Duration::from_secs(30));
    let _poller = AdaptivePoller::new(fetcher, lifecycle.clone(), config);

    // resume at 20s: inside the grace window
    sleep(Duration::from_secs(10)).await;
    lifecycle.set(AppState::Background);
    sleep(Duration::from_secs(10)).await;
    lifecycle.set(AppState::Active);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // resume at ~45s: past the grace window
    sleep(Duration::from_secs(20)).await;
    lifecycle.set(AppState::Inactive);
    sleep(Duration::from_secs(5)).await;
    lifecycle.set(AppState::Active);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // resume 10s after the last resume fetch
    lifecycle.set(AppState::Background);
    sleep(Duration::from_secs(10)).await;
    lifecycle.set(AppState::Active);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // background to inactive is not a resume
    sleep(Duration::from_secs(60)).await;
    lifecycle.set(AppState::Background);
    lifecycle.set(AppState::Inactive);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    lifecycle.set(AppState::Active);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_poller_ignores_resume() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let fetcher = Arc::new(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    let lifecycle = Arc::new(AppStateChannel::new(AppState::Active));
    let config = PollingConfig::default()
        .with_enabled(false)
        .with_intervals(Duration::from_secs(1), Duration::from_secs(1))
        .with_background_grace(Duration::from_secs(1));
    let _poller = AdaptivePoller::new(fetcher, lifecycle.clone(), config);

    lifecycle.set(AppState::Background);
    sleep(Duration::from_secs(60)).await;
    lifecycle.set(AppState::Active);
    sleep(Duration::from_secs(5)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_latest_fetcher_is_used() {
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let counter = first.clone();
    let lifecycle = Arc::new(AppStateChannel::default());
    let config = PollingConfig::default()
        .with_intervals(Duration::from_secs(60), Duration::from_secs(1));
    let poller = AdaptivePoller::new(
        Arc::new(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }),
        lifecycle,
        config,
    );

    sleep(Duration::from_millis(1_500)).await;
    assert_eq!(first.load(Ordering::SeqCst), 1);

    let counter = second.clone();
    poller.set_fetcher(Arc::new(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }));

    sleep(Duration::from_secs(2)).await; // ticks at 2s and 3s
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_slow_fetches_overlap() {
    let started = Arc::new(AtomicUsize::new(0));
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));

    let (s, f, m) = (started.clone(), in_flight.clone(), max_in_flight.clone());
    let fetcher = Arc::new(move || {
        let (s, f, m) = (s.clone(), f.clone(), m.clone());
        async move {
            s.fetch_add(1, Ordering::SeqCst);
            let now = f.fetch_add(1, Ordering::SeqCst) + 1;
            m.fetch_max(now, Ordering::SeqCst);
            sleep(Duration::from_secs(5)).await;
            f.fetch_sub(1, Ordering::SeqCst);
        }
    });

    let lifecycle = Arc::new(AppStateChannel::default());
    let config = PollingConfig::default()
        .with_intervals(Duration::from_secs(60), Duration::from_secs(1));
    let _poller = AdaptivePoller::new(fetcher, lifecycle, config);

    sleep(Duration::from_millis(3_500)).await;
    assert_eq!(started.load(Ordering::SeqCst), 3);
    assert_eq!(max_in_flight.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_drop_cancels_timer() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let lifecycle = Arc::new(AppStateChannel::default());
    let config = PollingConfig::default()
        .with_intervals(Duration::from_secs(60), Duration::from_secs(1));

    let poller = AdaptivePoller::new(
        Arc::new(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }),
        lifecycle.clone(),
        config,
    );

    sleep(Duration::from_millis(1_500)).await;
    drop(poller);
    sleep(Duration::from_secs(30)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(lifecycle.subscriber_count(), 0);
}
