// tests/store_roundtrip.rs
//
// Persistence basics: URL-unique article intake, settings upsert, and the
// ops-log window query used by the health scorer.

use newsgate::store::{url_hash, FeedKind, LogLevel, NewArticle, NewFeed, Store};

#[tokio::test]
async fn article_intake_is_url_unique() {
    let store = Store::open_in_memory().await.unwrap();
    let new = NewArticle {
        source_id: Some("example.com".into()),
        url: "https://example.com/story".into(),
        title: "Story".into(),
        published_at: None,
    };

    assert!(store.enqueue_article(new.clone()).await.unwrap());
    assert!(!store.enqueue_article(new).await.unwrap());

    let queued = store.list_queued(10).await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].url_hash, url_hash("https://example.com/story"));
    assert!(queued[0].content.is_none());
    assert!(queued[0].quality_score.is_none());
}

#[tokio::test]
async fn explicit_source_id_overrides_hostname() {
    let store = Store::open_in_memory().await.unwrap();
    let feed = store
        .insert_feed(NewFeed {
            url: "https://cdn.mirror.example.net/feed.xml".into(),
            kind: FeedKind::Sitemap,
            source_id: Some("example.com".into()),
        })
        .await
        .unwrap();
    assert_eq!(feed.source_id, "example.com");
    assert_eq!(feed.kind, FeedKind::Sitemap);
    assert_eq!(feed.health_reliability_score, 100.0);

    let active = store.active_source_ids().await.unwrap();
    assert_eq!(active, vec!["example.com".to_string()]);
}

#[tokio::test]
async fn settings_upsert_overwrites() {
    let store = Store::open_in_memory().await.unwrap();
    assert!(store.get_setting("ingest.interval").await.unwrap().is_none());

    store.set_setting("ingest.interval", "15m").await.unwrap();
    store.set_setting("ingest.interval", "30m").await.unwrap();

    assert_eq!(
        store.get_setting("ingest.interval").await.unwrap().as_deref(),
        Some("30m")
    );
}

#[tokio::test]
async fn error_window_only_counts_error_level() {
    let store = Store::open_in_memory().await.unwrap();
    store.insert_log(LogLevel::Error, "a", None).await.unwrap();
    store.insert_log(LogLevel::Error, "b", None).await.unwrap();
    store.insert_log(LogLevel::Warn, "c", None).await.unwrap();
    store.insert_log(LogLevel::Info, "d", None).await.unwrap();

    let cutoff = chrono::Utc::now() - chrono::Duration::hours(1);
    assert_eq!(store.error_count_since(cutoff).await.unwrap(), 2);

    // A future cutoff excludes everything.
    let future = chrono::Utc::now() + chrono::Duration::hours(1);
    assert_eq!(store.error_count_since(future).await.unwrap(), 0);
}
