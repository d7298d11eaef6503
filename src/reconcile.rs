// src/reconcile.rs
//! Orphan reconciliation: remove articles whose owning feed is no longer
//! active. Destructive and non-reversible, so it only ever runs on an
//! explicit trigger and leaves an audit row behind.

use metrics::counter;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::store::{LogLevel, Store};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReconcileReport {
    pub deleted: u64,
    pub active_sources: usize,
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The active-feed set is empty. Deleting everything here would make a
    /// transient feed-load failure indistinguishable from "no valid
    /// owners", so the default is to refuse; `force` restores the
    /// delete-everything behavior.
    #[error("no active feeds; refusing to delete all owned articles (pass force to override)")]
    NoActiveFeeds,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Delete every article whose `source_id` does not belong to an active
/// feed. With an empty active set this aborts unless `force` is set.
pub async fn reconcile(store: &Store, force: bool) -> Result<ReconcileReport, ReconcileError> {
    let active = store.active_source_ids().await?;
    if active.is_empty() && !force {
        return Err(ReconcileError::NoActiveFeeds);
    }

    let deleted = store.delete_orphaned_articles().await?;

    if deleted > 0 {
        counter!("orphans_deleted_total").increment(deleted);
        warn!(deleted, active_sources = active.len(), "orphan reconciliation deleted articles");
        store
            .insert_log(
                LogLevel::Warn,
                "orphan reconciliation",
                Some(serde_json::json!({
                    "deleted": deleted,
                    "active_sources": active.len(),
                    "forced": force,
                })),
            )
            .await
            .map_err(ReconcileError::Store)?;
    }

    Ok(ReconcileReport {
        deleted,
        active_sources: active.len(),
    })
}
