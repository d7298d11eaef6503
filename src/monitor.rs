// src/monitor.rs
//! Aggregate health scoring.
//!
//! Combines route-probe results, trailing error volume from the ops
//! log, and mean feed reliability into one 0-100 number. The
//! snapshot is recomputed from current state on every request and never
//! persisted as a source of truth.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::debug;

use crate::config::MonitorCfg;
use crate::store::Store;

#[derive(Debug, Clone, Serialize)]
pub struct RouteProbe {
    pub route: String,
    /// None when the probe timed out or never connected.
    pub status: Option<u16>,
    pub latency_ms: u64,
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedStats {
    pub total: i64,
    pub mean_reliability: f64,
    pub by_status: HashMap<String, i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemSnapshot {
    pub timestamp: DateTime<Utc>,
    pub health_score: i64,
    pub queue_counts: HashMap<String, i64>,
    pub feed_stats: FeedStats,
    pub error_count_1h: i64,
    pub route_probes: Vec<RouteProbe>,
}

/// Pure scoring formula. Start at 100; -10 per failed probe; -1 per recent
/// error capped at 20; up to -30 for the reliability shortfall.
pub fn health_score(failed_probes: usize, error_count_1h: i64, mean_reliability: f64) -> i64 {
    let mut score = 100.0;
    score -= 10.0 * failed_probes as f64;
    score -= error_count_1h.clamp(0, 20) as f64;
    score -= 30.0 * (1.0 - mean_reliability / 100.0);
    score.clamp(0.0, 100.0).round() as i64
}

/// Probe every configured route concurrently, each with its own timeout.
pub async fn probe_routes(cfg: &MonitorCfg) -> Vec<RouteProbe> {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.probe_timeout_secs))
        .build()
    {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    let mut set = JoinSet::new();
    for route in cfg.probe_routes.clone() {
        let client = client.clone();
        set.spawn(async move {
            let started = Instant::now();
            let result = client.get(&route).send().await;
            let latency_ms = started.elapsed().as_millis() as u64;
            match result {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    RouteProbe {
                        route,
                        status: Some(status),
                        latency_ms,
                        ok: (200..300).contains(&status),
                    }
                }
                Err(_) => RouteProbe {
                    route,
                    status: None,
                    latency_ms,
                    ok: false,
                },
            }
        });
    }

    let mut probes = Vec::new();
    while let Some(joined) = set.join_next().await {
        if let Ok(probe) = joined {
            probes.push(probe);
        }
    }
    probes.sort_by(|a, b| a.route.cmp(&b.route));
    probes
}

/// Compute the full monitoring snapshot on demand.
pub async fn snapshot(store: &Store, cfg: &MonitorCfg) -> anyhow::Result<SystemSnapshot> {
    let now = Utc::now();
    let probes = probe_routes(cfg).await;
    let failed_probes = probes.iter().filter(|p| !p.ok).count();

    let cutoff = now - chrono::Duration::seconds(cfg.error_window_secs as i64);
    let error_count_1h = store.error_count_since(cutoff).await?;

    // An empty registry has nothing to be unhealthy about.
    let mean_reliability = store.mean_reliability().await?.unwrap_or(100.0);

    let queue_counts: HashMap<String, i64> =
        store.lifecycle_counts().await?.into_iter().collect();
    let by_status: HashMap<String, i64> =
        store.feed_status_counts().await?.into_iter().collect();
    let total: i64 = by_status.values().sum();

    let score = health_score(failed_probes, error_count_1h, mean_reliability);
    debug!(score, failed_probes, error_count_1h, mean_reliability, "health snapshot");

    Ok(SystemSnapshot {
        timestamp: now,
        health_score: score,
        queue_counts,
        feed_stats: FeedStats {
            total,
            mean_reliability,
            by_status,
        },
        error_count_1h,
        route_probes: probes,
    })
}
