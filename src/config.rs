// src/config.rs
//! Runtime configuration, loaded from TOML with serde defaults.
//!
//! Lookup order mirrors the relevance-config pattern:
//! 1) $NEWSGATE_CONFIG_PATH
//! 2) config/newsgate.toml
//! 3) built-in defaults (every section is optional)

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/newsgate.toml";
pub const ENV_CONFIG_PATH: &str = "NEWSGATE_CONFIG_PATH";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerCfg,
    pub health: HealthThresholds,
    pub fetch: FetchCfg,
    pub extract: ExtractCfg,
    pub quality: QualityCfg,
    pub monitor: MonitorCfg,
    pub ingest: IngestCfg,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerCfg {
    pub bind_addr: String,
    pub db_path: String,
}

impl Default for ServerCfg {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            db_path: "newsgate.db".to_string(),
        }
    }
}

/// Escalation thresholds for per-feed health (see `feed_health`).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HealthThresholds {
    /// Consecutive failures before `healthy -> degraded`.
    pub degraded_after: u32,
    /// Consecutive failures before `degraded -> error`.
    pub error_after: u32,
    /// Consecutive failures before `error -> disabled` (feed deactivated).
    pub disable_after: u32,
    /// 24h error volume that disables a feed regardless of streak.
    pub max_errors_24h: u32,
    /// Reliability points lost per failed fetch.
    pub failure_penalty: f64,
    /// Reliability points regained per successful fetch.
    pub recovery_step: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            degraded_after: 3,
            error_after: 6,
            disable_after: 10,
            max_errors_24h: 25,
            failure_penalty: 15.0,
            recovery_step: 10.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchCfg {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchCfg {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: format!(
                "newsgate/{} (+https://github.com/newsgate/newsgate)",
                env!("CARGO_PKG_VERSION")
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ExtractCfg {
    /// Articles whose stored content is longer than this are skipped
    /// unless `force` is requested.
    pub skip_if_longer_than: usize,
    /// Extracted text below this length fails with "content too short".
    pub min_content_chars: usize,
    /// Hard cap on extracted text length.
    pub max_content_chars: usize,
}

impl Default for ExtractCfg {
    fn default() -> Self {
        Self {
            skip_if_longer_than: 100,
            min_content_chars: 50,
            max_content_chars: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct QualityCfg {
    /// Minimum word count for acceptable content.
    pub min_word_count: usize,
}

impl Default for QualityCfg {
    fn default() -> Self {
        Self { min_word_count: 100 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorCfg {
    /// Routes probed by the aggregate health scorer.
    pub probe_routes: Vec<String>,
    pub probe_timeout_secs: u64,
    /// Trailing window for the error-volume term, in seconds.
    pub error_window_secs: u64,
}

impl Default for MonitorCfg {
    fn default() -> Self {
        Self {
            probe_routes: Vec::new(),
            probe_timeout_secs: 5,
            error_window_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct IngestCfg {
    /// Max queued articles handled by one pipeline run.
    pub batch_size: u32,
    /// Rolling window (days) for the recent-articles query.
    pub recent_window_days: i64,
}

impl Default for IngestCfg {
    fn default() -> Self {
        Self {
            batch_size: 20,
            recent_window_days: 7,
        }
    }
}

impl Config {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    /// Load using env override + default path, falling back to built-in
    /// defaults when no file exists.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            return Self::from_path(&PathBuf::from(p));
        }
        let default = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default.exists() {
            return Self::from_path(&default);
        }
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::default();
        assert!(cfg.health.degraded_after < cfg.health.error_after);
        assert!(cfg.health.error_after < cfg.health.disable_after);
        assert_eq!(cfg.extract.min_content_chars, 50);
        assert_eq!(cfg.quality.min_word_count, 100);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [health]
            degraded_after = 2

            [monitor]
            probe_routes = ["http://localhost:8080/health"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.health.degraded_after, 2);
        assert_eq!(cfg.health.error_after, 6); // default retained
        assert_eq!(cfg.monitor.probe_routes.len(), 1);
        assert_eq!(cfg.ingest.batch_size, 20);
    }
}
