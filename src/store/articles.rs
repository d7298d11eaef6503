// src/store/articles.rs
//! Article store: intake rows, extraction commits, lifecycle queries.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::Store;
use crate::lifecycle::Lifecycle;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Article {
    pub id: i64,
    pub source_id: Option<String>,
    pub url: String,
    pub url_hash: String,
    pub title: String,
    pub content: Option<String>,
    pub image: Option<String>,
    pub quality_score: Option<i64>,
    pub fetch_error: Option<String>,
    pub lifecycle: Lifecycle,
    pub created_at: DateTime<Utc>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Sort key for the recent-articles listing.
    pub fn effective_published_at(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub source_id: Option<String>,
    pub url: String,
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Short stable hash of an article URL, used for dedup lookups and
/// anonymized log lines.
pub fn url_hash(url: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(32);
    for b in digest.iter().take(16) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

impl Store {
    /// Intake: enqueue one article. URL-unique; returns false when the
    /// article was already known.
    pub async fn enqueue_article(&self, new: NewArticle) -> Result<bool> {
        let now = Utc::now();
        let res = sqlx::query(
            r#"
            INSERT OR IGNORE INTO articles
                (source_id, url, url_hash, title, lifecycle, created_at, published_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, 'queued', ?5, ?6, ?5)
            "#,
        )
        .bind(&new.source_id)
        .bind(&new.url)
        .bind(url_hash(&new.url))
        .bind(&new.title)
        .bind(now)
        .bind(new.published_at)
        .execute(self.pool())
        .await
        .context("enqueuing article")?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        sqlx::query_as::<_, Article>("SELECT * FROM articles WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .context("loading article")
    }

    /// Queued articles awaiting extraction, oldest first.
    pub async fn list_queued(&self, limit: u32) -> Result<Vec<Article>> {
        sqlx::query_as::<_, Article>(
            "SELECT * FROM articles WHERE lifecycle = 'queued' ORDER BY created_at LIMIT ?1",
        )
        .bind(limit as i64)
        .fetch_all(self.pool())
        .await
        .context("listing queued articles")
    }

    /// Annotate a failed fetch: error + timestamp, lifecycle untouched so
    /// the article stays retryable.
    pub async fn record_fetch_failure(&self, id: i64, reason: &str) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            "UPDATE articles SET fetch_error = ?2, last_fetched_at = ?3, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(reason)
        .bind(now)
        .execute(self.pool())
        .await
        .context("recording fetch failure")?;
        Ok(())
    }

    /// Commit a successful extraction + grading in one row update: content,
    /// image, score, the graded lifecycle, and a cleared fetch error.
    pub async fn commit_extraction(
        &self,
        id: i64,
        content: &str,
        image: Option<&str>,
        quality_score: i64,
        lifecycle: Lifecycle,
    ) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE articles SET
                content = ?2,
                image = COALESCE(?3, image),
                quality_score = ?4,
                lifecycle = ?5,
                fetch_error = NULL,
                last_fetched_at = ?6,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(content)
        .bind(image)
        .bind(quality_score)
        .bind(lifecycle)
        .bind(now)
        .execute(self.pool())
        .await
        .context("committing extraction")?;
        Ok(())
    }

    /// Rolling-window listing sorted by effective publish date descending.
    /// `blocked` rows are excluded unless explicitly requested.
    pub async fn recent_articles(
        &self,
        window_days: i64,
        include_blocked: bool,
    ) -> Result<Vec<Article>> {
        let cutoff = Utc::now() - Duration::days(window_days);
        sqlx::query_as::<_, Article>(
            r#"
            SELECT * FROM articles
            WHERE COALESCE(published_at, created_at) >= ?1
              AND (?2 OR lifecycle != 'blocked')
            ORDER BY COALESCE(published_at, created_at) DESC
            "#,
        )
        .bind(cutoff)
        .bind(include_blocked)
        .fetch_all(self.pool())
        .await
        .context("listing recent articles")
    }

    /// Lifecycle backfill: advance every `processed` article lacking a
    /// publish date to `published`, defaulting `published_at` to
    /// `created_at` (or now when even that is missing). Idempotent and
    /// forward-only by construction.
    pub async fn backfill_published(&self) -> Result<u64> {
        let now = Utc::now();
        let res = sqlx::query(
            r#"
            UPDATE articles SET
                lifecycle = 'published',
                published_at = COALESCE(published_at, created_at, ?1),
                updated_at = ?1
            WHERE lifecycle = 'processed' AND published_at IS NULL
            "#,
        )
        .bind(now)
        .execute(self.pool())
        .await
        .context("backfilling published articles")?;
        Ok(res.rows_affected())
    }

    /// Delete every article whose `source_id` is non-null and not owned by
    /// an active feed. The caller is responsible for the empty-set guard.
    pub async fn delete_orphaned_articles(&self) -> Result<u64> {
        let res = sqlx::query(
            r#"
            DELETE FROM articles
            WHERE source_id IS NOT NULL
              AND source_id NOT IN (SELECT source_id FROM feeds WHERE active = TRUE)
            "#,
        )
        .execute(self.pool())
        .await
        .context("deleting orphaned articles")?;
        Ok(res.rows_affected())
    }

    /// Article counts by lifecycle, for the monitoring snapshot.
    pub async fn lifecycle_counts(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT lifecycle, COUNT(*) FROM articles GROUP BY lifecycle",
        )
        .fetch_all(self.pool())
        .await
        .context("counting articles by lifecycle")?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_hash_is_stable_and_short() {
        let a = url_hash("https://example.com/a");
        let b = url_hash("https://example.com/a");
        let c = url_hash("https://example.com/b");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 32);
    }
}
