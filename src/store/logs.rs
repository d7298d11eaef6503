// src/store/logs.rs
//! Persisted ops log. The health scorer only reads it (error-volume term);
//! destructive admin operations also append audit rows here.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl Store {
    pub async fn insert_log(
        &self,
        level: LogLevel,
        message: &str,
        context: Option<serde_json::Value>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO logs (level, message, context, timestamp) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(level)
        .bind(message)
        .bind(context.map(|c| c.to_string()))
        .bind(Utc::now())
        .execute(self.pool())
        .await
        .context("inserting log entry")?;
        Ok(())
    }

    /// Error-level entries newer than `cutoff`, the scorer's error-volume
    /// input.
    pub async fn error_count_since(&self, cutoff: DateTime<Utc>) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM logs WHERE level = 'error' AND timestamp >= ?1",
        )
        .bind(cutoff)
        .fetch_one(self.pool())
        .await
        .context("counting recent errors")
    }
}
