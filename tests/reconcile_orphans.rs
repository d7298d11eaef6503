// tests/reconcile_orphans.rs
//
// Orphan reconciliation: deletes exactly the articles owned by inactive
// feeds, and refuses to run against an empty active set unless forced.

use newsgate::reconcile::{self, ReconcileError};
use newsgate::store::{FeedKind, NewArticle, NewFeed, Store};

async fn seed(store: &Store) -> (i64, i64) {
    let a = store
        .insert_feed(NewFeed {
            url: "https://alpha.example.com/feed.xml".into(),
            kind: FeedKind::Rss,
            source_id: None,
        })
        .await
        .unwrap();
    let b = store
        .insert_feed(NewFeed {
            url: "https://beta.example.com/feed.xml".into(),
            kind: FeedKind::Atom,
            source_id: None,
        })
        .await
        .unwrap();

    for (url, source) in [
        ("https://alpha.example.com/a1", Some(a.source_id.clone())),
        ("https://beta.example.com/b1", Some(b.source_id.clone())),
        ("https://nowhere.example.com/x", None),
    ] {
        store
            .enqueue_article(NewArticle {
                source_id: source,
                url: url.into(),
                title: "t".into(),
                published_at: None,
            })
            .await
            .unwrap();
    }

    (a.id, b.id)
}

#[tokio::test]
async fn deletes_exactly_articles_of_inactive_feeds() {
    let store = Store::open_in_memory().await.unwrap();
    let (_a, b) = seed(&store).await;

    store.set_feed_active(b, false).await.unwrap();

    let report = reconcile::reconcile(&store, false).await.unwrap();
    assert_eq!(report.deleted, 1);
    assert_eq!(report.active_sources, 1);

    let remaining: Vec<String> = store
        .list_queued(10)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.url)
        .collect();
    // The active feed's article survives; the null-source article is
    // outside the reconciler's scope entirely.
    assert!(remaining.contains(&"https://alpha.example.com/a1".to_string()));
    assert!(remaining.contains(&"https://nowhere.example.com/x".to_string()));
    assert!(!remaining.contains(&"https://beta.example.com/b1".to_string()));
}

#[tokio::test]
async fn reconcile_is_idempotent() {
    let store = Store::open_in_memory().await.unwrap();
    let (_a, b) = seed(&store).await;
    store.set_feed_active(b, false).await.unwrap();

    assert_eq!(reconcile::reconcile(&store, false).await.unwrap().deleted, 1);
    assert_eq!(reconcile::reconcile(&store, false).await.unwrap().deleted, 0);
}

#[tokio::test]
async fn empty_active_set_refuses_without_force() {
    let store = Store::open_in_memory().await.unwrap();
    let (a, b) = seed(&store).await;
    store.set_feed_active(a, false).await.unwrap();
    store.set_feed_active(b, false).await.unwrap();

    let err = reconcile::reconcile(&store, false).await.unwrap_err();
    assert!(matches!(err, ReconcileError::NoActiveFeeds));

    // Nothing was deleted by the refused run.
    assert_eq!(store.list_queued(10).await.unwrap().len(), 3);

    // Forcing restores the aggressive delete-everything-owned policy.
    let report = reconcile::reconcile(&store, true).await.unwrap();
    assert_eq!(report.deleted, 2);

    let remaining = store.list_queued(10).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(remaining[0].source_id.is_none());
}
