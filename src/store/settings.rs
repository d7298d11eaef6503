// src/store/settings.rs
//! Key/value configuration blob consumed by external callers (admin
//! tooling, schedulers). The core stores and serves it but attaches no
//! semantics beyond the keys it reads itself.

use anyhow::{Context, Result};
use chrono::Utc;

use super::Store;

impl Store {
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT value FROM system_settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(self.pool())
            .await
            .context("reading setting")
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO system_settings (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(self.pool())
        .await
        .context("writing setting")?;
        Ok(())
    }
}
