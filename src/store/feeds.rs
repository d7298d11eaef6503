// src/store/feeds.rs
//! Feed registry: canonical feed records plus their health sub-state.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Store;
use crate::feed_health::{FeedHealth, HealthStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum FeedKind {
    Rss,
    Atom,
    Sitemap,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Feed {
    pub id: i64,
    pub source_id: String,
    pub url: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: FeedKind,
    pub active: bool,
    pub health_status: HealthStatus,
    pub health_reliability_score: f64,
    pub health_consecutive_failures: i64,
    pub health_error_count_24h: i64,
    pub health_last_check: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Feed {
    /// View of the row's health columns as the transition aggregate.
    pub fn health(&self) -> FeedHealth {
        FeedHealth {
            status: self.health_status,
            reliability_score: self.health_reliability_score,
            consecutive_failures: self.health_consecutive_failures.max(0) as u32,
            error_count_24h: self.health_error_count_24h.max(0) as u32,
            last_check: self.health_last_check,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFeed {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: FeedKind,
    /// Logical grouping key; derived from the URL hostname when omitted.
    #[serde(default)]
    pub source_id: Option<String>,
}

/// Derive the logical grouping key from a feed URL's hostname.
pub fn source_id_from_url(raw: &str) -> Option<String> {
    url::Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
}

impl Store {
    pub async fn insert_feed(&self, new: NewFeed) -> Result<Feed> {
        let source_id = new
            .source_id
            .clone()
            .or_else(|| source_id_from_url(&new.url))
            .ok_or_else(|| anyhow::anyhow!("cannot derive source_id from url {}", new.url))?;
        let now = Utc::now();

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO feeds (source_id, url, type, active, created_at, updated_at)
            VALUES (?1, ?2, ?3, TRUE, ?4, ?4)
            RETURNING id
            "#,
        )
        .bind(&source_id)
        .bind(&new.url)
        .bind(new.kind)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .context("inserting feed")?;

        self.get_feed(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("feed {id} vanished after insert"))
    }

    pub async fn get_feed(&self, id: i64) -> Result<Option<Feed>> {
        sqlx::query_as::<_, Feed>("SELECT * FROM feeds WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .context("loading feed")
    }

    pub async fn feed_by_source_id(&self, source_id: &str) -> Result<Option<Feed>> {
        sqlx::query_as::<_, Feed>("SELECT * FROM feeds WHERE source_id = ?1 LIMIT 1")
            .bind(source_id)
            .fetch_optional(self.pool())
            .await
            .context("loading feed by source_id")
    }

    pub async fn list_feeds(&self) -> Result<Vec<Feed>> {
        sqlx::query_as::<_, Feed>("SELECT * FROM feeds ORDER BY id")
            .fetch_all(self.pool())
            .await
            .context("listing feeds")
    }

    pub async fn list_active_feeds(&self) -> Result<Vec<Feed>> {
        sqlx::query_as::<_, Feed>("SELECT * FROM feeds WHERE active = TRUE ORDER BY id")
            .fetch_all(self.pool())
            .await
            .context("listing active feeds")
    }

    /// `source_id`s of currently active feeds: the "valid owners" set the
    /// orphan reconciler works from.
    pub async fn active_source_ids(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT source_id FROM feeds WHERE active = TRUE",
        )
        .fetch_all(self.pool())
        .await
        .context("collecting active source ids")
    }

    /// Write back one feed's health sub-state. `set_active` applies an
    /// activation change in the same row update (used by auto-disable).
    pub async fn update_feed_health(
        &self,
        id: i64,
        health: &FeedHealth,
        set_active: Option<bool>,
    ) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE feeds SET
                health_status = ?2,
                health_reliability_score = ?3,
                health_consecutive_failures = ?4,
                health_error_count_24h = ?5,
                health_last_check = ?6,
                active = COALESCE(?7, active),
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(health.status)
        .bind(health.reliability_score)
        .bind(health.consecutive_failures as i64)
        .bind(health.error_count_24h as i64)
        .bind(health.last_check)
        .bind(set_active)
        .bind(now)
        .execute(self.pool())
        .await
        .context("updating feed health")?;
        Ok(())
    }

    /// Operator on/off switch. Deactivation never deletes the record.
    pub async fn set_feed_active(&self, id: i64, active: bool) -> Result<()> {
        sqlx::query("UPDATE feeds SET active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(Utc::now())
            .execute(self.pool())
            .await
            .context("setting feed active flag")?;
        Ok(())
    }

    /// Repair every disabled/error feed back to healthy + active.
    /// Returns the number of repaired rows.
    pub async fn reset_unhealthy_feeds(&self) -> Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE feeds SET
                health_status = 'healthy',
                health_consecutive_failures = 0,
                health_error_count_24h = 0,
                active = TRUE,
                updated_at = ?1
            WHERE health_status IN ('disabled', 'error')
            "#,
        )
        .bind(Utc::now())
        .execute(self.pool())
        .await
        .context("resetting unhealthy feeds")?;
        Ok(res.rows_affected())
    }

    /// Stuck-counter safety valve: zero the failure streak on all active
    /// feeds regardless of status.
    pub async fn zero_active_failure_streaks(&self) -> Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE feeds SET health_consecutive_failures = 0, updated_at = ?1
            WHERE active = TRUE AND health_consecutive_failures > 0
            "#,
        )
        .bind(Utc::now())
        .execute(self.pool())
        .await
        .context("zeroing active failure streaks")?;
        Ok(res.rows_affected())
    }

    pub async fn mean_reliability(&self) -> Result<Option<f64>> {
        sqlx::query_scalar::<_, Option<f64>>(
            "SELECT AVG(health_reliability_score) FROM feeds",
        )
        .fetch_one(self.pool())
        .await
        .context("averaging feed reliability")
    }

    /// Feed counts by health status, for the monitoring snapshot.
    pub async fn feed_status_counts(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT health_status, COUNT(*) FROM feeds GROUP BY health_status",
        )
        .fetch_all(self.pool())
        .await
        .context("counting feeds by status")?;
        Ok(rows)
    }
}
