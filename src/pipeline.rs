// src/pipeline.rs
//! Extract -> Grade -> Commit orchestration.
//!
//! One ingestion run selects queued articles and fans their extractions out
//! concurrently. Every write targets a single row, so tasks share nothing
//! but the store handle. One article's failure never aborts the batch;
//! each item gets its own report.

use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::{HealthThresholds, QualityCfg};
use crate::extract::{ExtractOutcome, Extractor};
use crate::feed_health::{self, FetchOutcome};
use crate::lifecycle::Lifecycle;
use crate::quality;
use crate::store::{url_hash, Article, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Skipped,
    Processed,
    Blocked,
    Failed,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub article_id: i64,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub processed: usize,
    pub blocked: usize,
    pub skipped: usize,
    pub failed: usize,
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    fn from_items(items: Vec<ItemReport>) -> Self {
        let count = |s: ItemStatus| items.iter().filter(|i| i.status == s).count();
        Self {
            total: items.len(),
            processed: count(ItemStatus::Processed),
            blocked: count(ItemStatus::Blocked),
            skipped: count(ItemStatus::Skipped),
            failed: count(ItemStatus::Failed) + count(ItemStatus::Error),
            items,
        }
    }
}

/// Everything one extraction task needs; cheap to clone into JoinSet tasks.
#[derive(Clone)]
pub struct PipelineCtx {
    pub store: Store,
    pub extractor: Arc<Extractor>,
    pub quality: QualityCfg,
    pub thresholds: HealthThresholds,
}

/// Process every queued article (up to `batch_size`), concurrently.
pub async fn process_queued(ctx: &PipelineCtx, batch_size: u32) -> anyhow::Result<BatchReport> {
    let queued = ctx.store.list_queued(batch_size).await?;
    debug!(count = queued.len(), "processing queued articles");

    let mut set = JoinSet::new();
    for article in queued {
        let ctx = ctx.clone();
        set.spawn(async move { process_article(&ctx, article, false).await });
    }

    let mut items = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(report) => items.push(report),
            Err(e) => warn!(error = %e, "extraction task panicked"),
        }
    }

    counter!("pipeline_runs_total").increment(1);
    Ok(BatchReport::from_items(items))
}

/// Process one article, catching internal failures into an error-annotated
/// report instead of surfacing a bare 500 for the whole batch.
pub async fn process_article(ctx: &PipelineCtx, article: Article, force: bool) -> ItemReport {
    let id = article.id;
    match run_stages(ctx, &article, force).await {
        Ok(report) => report,
        Err(e) => {
            warn!(
                article_id = id,
                url = %url_hash(&article.url),
                error = %e,
                "unexpected pipeline failure"
            );
            // Annotate so the article surfaces in operator queries.
            if let Err(store_err) = ctx
                .store
                .record_fetch_failure(id, &format!("internal: {e}"))
                .await
            {
                warn!(article_id = id, error = %store_err, "failed to annotate article");
            }
            ItemReport {
                article_id: id,
                status: ItemStatus::Error,
                quality_score: None,
                reason: Some(e.to_string()),
            }
        }
    }
}

async fn run_stages(
    ctx: &PipelineCtx,
    article: &Article,
    force: bool,
) -> anyhow::Result<ItemReport> {
    match ctx.extractor.extract(article, force).await {
        Ok(ExtractOutcome::Skipped) => {
            counter!("extract_skipped_total").increment(1);
            Ok(ItemReport {
                article_id: article.id,
                status: ItemStatus::Skipped,
                quality_score: None,
                reason: None,
            })
        }

        Ok(ExtractOutcome::Extracted(extracted)) => {
            let grade = quality::grade(&article.title, &extracted.content, &ctx.quality);
            let target = if grade.is_low_quality {
                Lifecycle::Blocked
            } else {
                Lifecycle::Processed
            };
            // Forward-only: a forced re-extraction of an already-advanced
            // article refreshes content without moving it backward.
            let next = if article.lifecycle.may_advance_to(target) {
                target
            } else {
                article.lifecycle
            };

            ctx.store
                .commit_extraction(
                    article.id,
                    &extracted.content,
                    extracted.image.as_deref(),
                    grade.quality_score,
                    next,
                )
                .await?;
            record_feed_outcome(ctx, article, FetchOutcome::Success).await;

            let status = if grade.is_low_quality {
                counter!("quality_blocked_total").increment(1);
                ItemStatus::Blocked
            } else {
                counter!("extract_processed_total").increment(1);
                ItemStatus::Processed
            };
            Ok(ItemReport {
                article_id: article.id,
                status,
                quality_score: Some(grade.quality_score),
                reason: None,
            })
        }

        Err(e) => {
            ctx.store
                .record_fetch_failure(article.id, &e.to_string())
                .await?;
            // Only transport-level failures count against the feed; a
            // too-short page was still a successful fetch.
            let outcome = if e.is_transient() {
                FetchOutcome::Failure
            } else {
                FetchOutcome::Success
            };
            record_feed_outcome(ctx, article, outcome).await;

            counter!("extract_failed_total").increment(1);
            Ok(ItemReport {
                article_id: article.id,
                status: ItemStatus::Failed,
                quality_score: None,
                reason: Some(e.to_string()),
            })
        }
    }
}

/// Best-effort health bookkeeping against the owning feed. The reference is
/// soft: an article without a resolvable feed just skips this step.
async fn record_feed_outcome(ctx: &PipelineCtx, article: &Article, outcome: FetchOutcome) {
    let Some(source_id) = article.source_id.as_deref() else {
        return;
    };
    let feed = match ctx.store.feed_by_source_id(source_id).await {
        Ok(Some(feed)) => feed,
        Ok(None) => return,
        Err(e) => {
            warn!(source_id, error = %e, "feed lookup failed");
            return;
        }
    };
    if let Err(e) = feed_health::record_outcome(&ctx.store, feed.id, outcome, &ctx.thresholds).await
    {
        warn!(feed_id = feed.id, error = %e, "recording feed outcome failed");
    }
}
