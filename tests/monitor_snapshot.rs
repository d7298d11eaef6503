// tests/monitor_snapshot.rs
//
// Aggregate health snapshot computed from live store state: error volume,
// mean reliability, and queue/feed breakdowns. Probe routes are left empty
// here (the pure formula has its own unit tests).

use newsgate::config::{HealthThresholds, MonitorCfg};
use newsgate::feed_health::{self, FetchOutcome};
use newsgate::monitor;
use newsgate::store::{FeedKind, LogLevel, NewArticle, NewFeed, Store};

fn cfg() -> MonitorCfg {
    MonitorCfg::default()
}

#[tokio::test]
async fn empty_store_scores_one_hundred() {
    let store = Store::open_in_memory().await.unwrap();
    let snap = monitor::snapshot(&store, &cfg()).await.unwrap();
    assert_eq!(snap.health_score, 100);
    assert_eq!(snap.error_count_1h, 0);
    assert!(snap.route_probes.is_empty());
    assert_eq!(snap.feed_stats.total, 0);
    assert_eq!(snap.feed_stats.mean_reliability, 100.0);
}

#[tokio::test]
async fn recent_errors_lower_the_score() {
    let store = Store::open_in_memory().await.unwrap();
    for i in 0..5 {
        store
            .insert_log(LogLevel::Error, &format!("boom {i}"), None)
            .await
            .unwrap();
    }
    // Non-error levels are ignored by the scorer.
    store.insert_log(LogLevel::Warn, "meh", None).await.unwrap();

    let snap = monitor::snapshot(&store, &cfg()).await.unwrap();
    assert_eq!(snap.error_count_1h, 5);
    assert_eq!(snap.health_score, 95);
}

#[tokio::test]
async fn reliability_shortfall_lowers_the_score() {
    let store = Store::open_in_memory().await.unwrap();
    let feed = store
        .insert_feed(NewFeed {
            url: "https://news.example.com/feed.xml".into(),
            kind: FeedKind::Rss,
            source_id: None,
        })
        .await
        .unwrap();

    // Drive reliability down to 70 (two failures at the default penalty).
    let t = HealthThresholds::default();
    for _ in 0..2 {
        feed_health::record_outcome(&store, feed.id, FetchOutcome::Failure, &t)
            .await
            .unwrap();
    }

    let snap = monitor::snapshot(&store, &cfg()).await.unwrap();
    assert_eq!(snap.feed_stats.mean_reliability, 70.0);
    // 100 - 30 * (1 - 0.7) = 91
    assert_eq!(snap.health_score, 91);
    assert_eq!(snap.feed_stats.by_status.get("healthy"), Some(&1));
}

#[tokio::test]
async fn queue_counts_reflect_lifecycles() {
    let store = Store::open_in_memory().await.unwrap();
    for url in ["https://e.com/1", "https://e.com/2", "https://e.com/3"] {
        store
            .enqueue_article(NewArticle {
                source_id: None,
                url: url.into(),
                title: "t".into(),
                published_at: None,
            })
            .await
            .unwrap();
    }

    let snap = monitor::snapshot(&store, &cfg()).await.unwrap();
    assert_eq!(snap.queue_counts.get("queued"), Some(&3));
}
