// src/ingest/mod.rs
//! Feed intake: poll active feeds, parse their documents, and enqueue new
//! articles for the extraction pipeline.
//!
//! Every poll is a fetch attempt against the feed, so its outcome also
//! drives the feed's health state and stamps `health_last_check`.

pub mod parsers;

use std::sync::Arc;

use anyhow::{bail, Result};
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::HealthThresholds;
use crate::feed_health::{self, FetchOutcome};
use crate::fetch::PageFetcher;
use crate::store::{Feed, NewArticle, Store};

#[derive(Debug, Clone, Serialize)]
pub struct PollReport {
    pub feed_id: i64,
    pub discovered: usize,
    pub enqueued: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollSummary {
    pub polled: usize,
    pub failed: usize,
    pub enqueued: usize,
    pub reports: Vec<PollReport>,
    pub errors: Vec<String>,
}

/// Normalize feed-item titles: entity decode, tag strip, collapsed
/// whitespace.
pub fn normalize_title(s: &str) -> String {
    static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

    let decoded = html_escape::decode_html_entities(s).to_string();
    let stripped = RE_TAGS.replace_all(&decoded, "");
    RE_WS.replace_all(&stripped, " ").trim().to_string()
}

/// Poll one feed: fetch, parse per `kind`, enqueue unseen items.
/// Inactive (including auto-disabled) feeds are refused.
pub async fn poll_feed(
    store: &Store,
    fetcher: &Arc<dyn PageFetcher>,
    thresholds: &HealthThresholds,
    feed_id: i64,
) -> Result<PollReport> {
    let Some(feed) = store.get_feed(feed_id).await? else {
        bail!("feed {feed_id} not found");
    };
    if !feed.active {
        bail!("feed {feed_id} is inactive; reset it before polling");
    }

    poll_one(store, fetcher, thresholds, &feed).await
}

async fn poll_one(
    store: &Store,
    fetcher: &Arc<dyn PageFetcher>,
    thresholds: &HealthThresholds,
    feed: &Feed,
) -> Result<PollReport> {
    let page = match fetcher.fetch(&feed.url).await {
        Ok(page) => page,
        Err(e) => {
            feed_health::record_outcome(store, feed.id, FetchOutcome::Failure, thresholds).await?;
            counter!("ingest_poll_errors_total").increment(1);
            bail!("fetching feed {}: {e}", feed.id);
        }
    };

    let items = match parsers::parse_feed(feed.kind, &page.body) {
        Ok(items) => items,
        Err(e) => {
            // A feed serving garbage is a failing feed.
            feed_health::record_outcome(store, feed.id, FetchOutcome::Failure, thresholds).await?;
            counter!("ingest_poll_errors_total").increment(1);
            return Err(e);
        }
    };
    feed_health::record_outcome(store, feed.id, FetchOutcome::Success, thresholds).await?;

    let discovered = items.len();
    let mut enqueued = 0usize;
    for item in items {
        let inserted = store
            .enqueue_article(NewArticle {
                source_id: Some(feed.source_id.clone()),
                url: item.url,
                title: normalize_title(&item.title),
                published_at: item.published_at,
            })
            .await?;
        if inserted {
            enqueued += 1;
        }
    }

    counter!("ingest_items_total").increment(discovered as u64);
    counter!("ingest_enqueued_total").increment(enqueued as u64);
    info!(feed_id = feed.id, discovered, enqueued, "feed polled");

    Ok(PollReport {
        feed_id: feed.id,
        discovered,
        enqueued,
    })
}

/// Poll every active feed concurrently, isolating per-feed failures.
pub async fn poll_all(
    store: &Store,
    fetcher: &Arc<dyn PageFetcher>,
    thresholds: &HealthThresholds,
) -> Result<PollSummary> {
    let feeds = store.list_active_feeds().await?;

    let mut set = JoinSet::new();
    for feed in feeds {
        let store = store.clone();
        let fetcher = Arc::clone(fetcher);
        let thresholds = *thresholds;
        set.spawn(async move { poll_one(&store, &fetcher, &thresholds, &feed).await });
    }

    let mut summary = PollSummary {
        polled: 0,
        failed: 0,
        enqueued: 0,
        reports: Vec::new(),
        errors: Vec::new(),
    };
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(report)) => {
                summary.polled += 1;
                summary.enqueued += report.enqueued;
                summary.reports.push(report);
            }
            Ok(Err(e)) => {
                summary.failed += 1;
                summary.errors.push(e.to_string());
            }
            Err(e) => {
                warn!(error = %e, "poll task panicked");
                summary.failed += 1;
                summary.errors.push(e.to_string());
            }
        }
    }
    summary.reports.sort_by_key(|r| r.feed_id);

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_title_strips_tags_and_entities() {
        let s = "  <b>Hello&nbsp;&nbsp;world</b> &amp; more  ";
        assert_eq!(normalize_title(s), "Hello world & more");
    }
}
