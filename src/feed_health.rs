// src/feed_health.rs
//! Per-feed reliability tracking.
//!
//! The transition core is a pure function over an explicit aggregate
//! (`FeedHealth::apply`), so every threshold boundary is unit-testable
//! without a live store. The store-backed wrappers below do the per-feed
//! read-modify-write and the audit logging around it.

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::HealthThresholds;
use crate::store::{LogLevel, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Error,
    Disabled,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Error => "error",
            HealthStatus::Disabled => "disabled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Success,
    Failure,
}

/// Health sub-state of one feed. Reliability is kept as f64 internally and
/// clamped to [0, 100] by every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedHealth {
    pub status: HealthStatus,
    pub reliability_score: f64,
    pub consecutive_failures: u32,
    pub error_count_24h: u32,
    pub last_check: Option<DateTime<Utc>>,
}

impl Default for FeedHealth {
    fn default() -> Self {
        Self {
            status: HealthStatus::Healthy,
            reliability_score: 100.0,
            consecutive_failures: 0,
            error_count_24h: 0,
            last_check: None,
        }
    }
}

impl FeedHealth {
    /// Pure transition: apply one fetch outcome and return the next state.
    ///
    /// `disabled` is sticky; only `reset` leaves it. A disabled feed keeps
    /// accumulating counters so the operator sees the true streak.
    pub fn apply(&self, outcome: FetchOutcome, now: DateTime<Utc>, t: &HealthThresholds) -> Self {
        let mut next = self.clone();
        next.last_check = Some(now);

        match outcome {
            FetchOutcome::Success => {
                next.consecutive_failures = 0;
                next.reliability_score = (next.reliability_score + t.recovery_step).min(100.0);
                if matches!(next.status, HealthStatus::Degraded | HealthStatus::Error) {
                    next.status = HealthStatus::Healthy;
                }
            }
            FetchOutcome::Failure => {
                next.consecutive_failures = next.consecutive_failures.saturating_add(1);
                next.error_count_24h = next.error_count_24h.saturating_add(1);
                next.reliability_score = (next.reliability_score - t.failure_penalty).max(0.0);
                next.status = escalate(next.status, next.consecutive_failures, next.error_count_24h, t);
            }
        }

        next
    }

    /// Administrative repair: back to a clean healthy state.
    pub fn reset(&self) -> Self {
        Self {
            status: HealthStatus::Healthy,
            reliability_score: self.reliability_score,
            consecutive_failures: 0,
            error_count_24h: 0,
            last_check: self.last_check,
        }
    }

    /// Feeds that escalated to `disabled` are also deactivated.
    pub fn is_disabled(&self) -> bool {
        self.status == HealthStatus::Disabled
    }
}

fn escalate(
    current: HealthStatus,
    consecutive: u32,
    errors_24h: u32,
    t: &HealthThresholds,
) -> HealthStatus {
    if current == HealthStatus::Disabled {
        return HealthStatus::Disabled;
    }
    if consecutive >= t.disable_after || errors_24h >= t.max_errors_24h {
        return HealthStatus::Disabled;
    }
    if consecutive >= t.error_after {
        return HealthStatus::Error;
    }
    if consecutive >= t.degraded_after {
        return HealthStatus::Degraded;
    }
    current
}

/// Record one fetch outcome against the owning feed: load, apply the pure
/// transition, write the row back. Auto-disable is logged both to tracing
/// and to the persisted ops log.
pub async fn record_outcome(
    store: &Store,
    feed_id: i64,
    outcome: FetchOutcome,
    thresholds: &HealthThresholds,
) -> anyhow::Result<FeedHealth> {
    let feed = store
        .get_feed(feed_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("feed {feed_id} not found"))?;

    let before = feed.health();
    let next = before.apply(outcome, Utc::now(), thresholds);

    match outcome {
        FetchOutcome::Success => counter!("feed_fetch_success_total").increment(1),
        FetchOutcome::Failure => counter!("feed_fetch_failure_total").increment(1),
    }

    let deactivate = next.is_disabled() && !before.is_disabled();
    store
        .update_feed_health(feed_id, &next, if deactivate { Some(false) } else { None })
        .await?;

    if deactivate {
        counter!("feed_auto_disabled_total").increment(1);
        warn!(
            feed_id,
            url = %feed.url,
            consecutive_failures = next.consecutive_failures,
            error_count_24h = next.error_count_24h,
            "feed auto-disabled after repeated failures"
        );
        store
            .insert_log(
                LogLevel::Warn,
                &format!("feed {} auto-disabled", feed.url),
                Some(serde_json::json!({
                    "feed_id": feed_id,
                    "consecutive_failures": next.consecutive_failures,
                    "error_count_24h": next.error_count_24h,
                })),
            )
            .await?;
    } else if next.status != before.status {
        info!(
            feed_id,
            from = before.status.as_str(),
            to = next.status.as_str(),
            "feed health transition"
        );
    }

    Ok(next)
}

/// Bulk repair for stuck feeds: every `disabled`/`error` feed goes back to
/// healthy + active with zeroed counters, and the failure streak is zeroed
/// on all active feeds as well. Destructive of history, so it is logged.
pub async fn reset_all(store: &Store) -> anyhow::Result<u64> {
    let repaired = store.reset_unhealthy_feeds().await?;
    let unstuck = store.zero_active_failure_streaks().await?;

    warn!(repaired, unstuck, "bulk feed health reset");
    store
        .insert_log(
            LogLevel::Warn,
            "bulk feed health reset",
            Some(serde_json::json!({ "repaired": repaired, "unstuck": unstuck })),
        )
        .await?;
    counter!("feed_health_resets_total").increment(1);

    Ok(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> HealthThresholds {
        HealthThresholds::default()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn fail_n(state: FeedHealth, n: u32) -> FeedHealth {
        (0..n).fold(state, |s, _| s.apply(FetchOutcome::Failure, now(), &t()))
    }

    #[test]
    fn reliability_stays_in_bounds() {
        let mut s = FeedHealth::default();
        for _ in 0..50 {
            s = s.apply(FetchOutcome::Failure, now(), &t());
            assert!((0.0..=100.0).contains(&s.reliability_score));
        }
        for _ in 0..50 {
            s = s.apply(FetchOutcome::Success, now(), &t());
            assert!((0.0..=100.0).contains(&s.reliability_score));
        }
        assert_eq!(s.reliability_score, 100.0);
    }

    #[test]
    fn escalates_through_degraded_error_disabled() {
        let s = fail_n(FeedHealth::default(), t().degraded_after);
        assert_eq!(s.status, HealthStatus::Degraded);

        let s = fail_n(FeedHealth::default(), t().error_after);
        assert_eq!(s.status, HealthStatus::Error);

        let s = fail_n(FeedHealth::default(), t().disable_after);
        assert_eq!(s.status, HealthStatus::Disabled);
        assert!(s.is_disabled());
    }

    #[test]
    fn boundary_below_threshold_does_not_escalate() {
        let s = fail_n(FeedHealth::default(), t().degraded_after - 1);
        assert_eq!(s.status, HealthStatus::Healthy);

        let s = fail_n(FeedHealth::default(), t().disable_after - 1);
        assert_eq!(s.status, HealthStatus::Error);
    }

    #[test]
    fn error_volume_alone_disables() {
        let mut s = FeedHealth::default();
        let th = t();
        // Interleave successes so the streak never reaches disable_after,
        // but 24h error volume keeps growing.
        while s.error_count_24h < th.max_errors_24h {
            s = s.apply(FetchOutcome::Failure, now(), &th);
            if s.is_disabled() {
                break;
            }
            s = s.apply(FetchOutcome::Success, now(), &th);
        }
        assert_eq!(s.status, HealthStatus::Disabled);
    }

    #[test]
    fn success_recovers_degraded_but_not_disabled() {
        let th = t();
        let degraded = fail_n(FeedHealth::default(), th.degraded_after);
        let recovered = degraded.apply(FetchOutcome::Success, now(), &th);
        assert_eq!(recovered.status, HealthStatus::Healthy);
        assert_eq!(recovered.consecutive_failures, 0);

        let disabled = fail_n(FeedHealth::default(), th.disable_after);
        let still = disabled.apply(FetchOutcome::Success, now(), &th);
        assert_eq!(still.status, HealthStatus::Disabled);
    }

    #[test]
    fn reset_restores_healthy_and_zeroes_counters() {
        let disabled = fail_n(FeedHealth::default(), t().disable_after);
        let reset = disabled.reset();
        assert_eq!(reset.status, HealthStatus::Healthy);
        assert_eq!(reset.consecutive_failures, 0);
        assert_eq!(reset.error_count_24h, 0);
    }
}
