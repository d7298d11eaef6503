//! newsgate binary entrypoint.
//! Boots the Axum HTTP server around the ingestion core: config, store,
//! outbound fetcher, and the monitoring/metrics surface.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsgate::fetch::HttpFetcher;
use newsgate::{app, Config, Store};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newsgate=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = Config::load_default().context("loading configuration")?;
    let store = Store::open(&cfg.server.db_path).await?;
    let fetcher = Arc::new(HttpFetcher::new(&cfg.fetch)?);

    let bind_addr = cfg.server.bind_addr.clone();
    let router = app(store, cfg, fetcher);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "newsgate listening");

    axum::serve(listener, router).await.context("serving")?;
    Ok(())
}
