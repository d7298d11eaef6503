// src/store/mod.rs
//! SQLite persistence for feeds, articles, the ops log, and settings.
//!
//! All mutation is row-scoped (single-row UPDATE/INSERT), so concurrent
//! writers targeting different rows never conflict and conflicting writes
//! to the same row are serialized by SQLite itself. No cross-row
//! transactions are required by the core's invariants.

mod articles;
mod feeds;
mod logs;
mod settings;

pub use articles::{url_hash, Article, NewArticle};
pub use feeds::{source_id_from_url, Feed, FeedKind, NewFeed};
pub use logs::LogLevel;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the on-disk database and ensure the schema.
    pub async fn open(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{path}"))
            .with_context(|| format!("invalid sqlite path {path}"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("connecting sqlite pool")?;

        let store = Self { pool };
        store.migrate().await?;
        info!(path, "store opened");
        Ok(store)
    }

    /// In-memory store for tests. A single connection keeps every query on
    /// the same memory database.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("connecting in-memory sqlite")?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feeds (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_id TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                type TEXT NOT NULL,
                active BOOLEAN NOT NULL DEFAULT TRUE,
                health_status TEXT NOT NULL DEFAULT 'healthy',
                health_reliability_score REAL NOT NULL DEFAULT 100.0,
                health_consecutive_failures INTEGER NOT NULL DEFAULT 0,
                health_error_count_24h INTEGER NOT NULL DEFAULT 0,
                health_last_check TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_feeds_source_id ON feeds (source_id);
            CREATE INDEX IF NOT EXISTS idx_feeds_active ON feeds (active);

            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_id TEXT,
                url TEXT NOT NULL UNIQUE,
                url_hash TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                content TEXT,
                image TEXT,
                quality_score INTEGER,
                fetch_error TEXT,
                lifecycle TEXT NOT NULL DEFAULT 'queued',
                created_at TEXT NOT NULL,
                last_fetched_at TEXT,
                published_at TEXT,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_articles_url_hash ON articles (url_hash);
            CREATE INDEX IF NOT EXISTS idx_articles_lifecycle ON articles (lifecycle);
            CREATE INDEX IF NOT EXISTS idx_articles_source_id ON articles (source_id);

            CREATE TABLE IF NOT EXISTS logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                level TEXT NOT NULL,
                message TEXT NOT NULL,
                context TEXT,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_logs_level_ts ON logs (level, timestamp);

            CREATE TABLE IF NOT EXISTS system_settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("ensuring schema")?;
        Ok(())
    }
}
