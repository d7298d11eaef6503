// src/lifecycle.rs
//! Article lifecycle: `queued -> {processed|blocked} -> published`.
//!
//! Transitions only ever move forward. A failed fetch is not a state; it
//! annotates a `queued` row via `fetch_error` so the article stays
//! retryable.

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Lifecycle {
    Queued,
    Processed,
    Blocked,
    Published,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Queued => "queued",
            Lifecycle::Processed => "processed",
            Lifecycle::Blocked => "blocked",
            Lifecycle::Published => "published",
        }
    }

    /// Forward-only transition predicate.
    pub fn may_advance_to(&self, next: Lifecycle) -> bool {
        matches!(
            (self, next),
            (Lifecycle::Queued, Lifecycle::Processed)
                | (Lifecycle::Queued, Lifecycle::Blocked)
                | (Lifecycle::Processed, Lifecycle::Published)
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BackfillReport {
    pub advanced: u64,
}

/// Backfill step: advance every `processed` article lacking a publish date
/// to `published` (`published_at` defaults to `created_at`, else now).
/// Running it twice is a no-op.
pub async fn publish_backfill(store: &Store) -> anyhow::Result<BackfillReport> {
    let advanced = store.backfill_published().await?;
    if advanced > 0 {
        counter!("lifecycle_backfilled_total").increment(advanced);
        info!(advanced, "publish backfill advanced articles");
    }
    Ok(BackfillReport { advanced })
}
