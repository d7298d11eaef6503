// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod extract;
pub mod feed_health;
pub mod fetch;
pub mod ingest;
pub mod lifecycle;
pub mod metrics;
pub mod monitor;
pub mod pipeline;
pub mod quality;
pub mod reconcile;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::config::Config;
pub use crate::store::Store;

use std::sync::Arc;

use crate::extract::Extractor;
use crate::fetch::PageFetcher;
use crate::pipeline::PipelineCtx;

/// Assemble the full application router around an already-open store and a
/// fetcher implementation. Tests hand in an in-memory store and a fixture
/// fetcher; `main` hands in the real ones.
pub fn app(store: Store, cfg: Config, fetcher: Arc<dyn PageFetcher>) -> axum::Router {
    let cfg = Arc::new(cfg);
    let extractor = Arc::new(Extractor::new(Arc::clone(&fetcher), cfg.extract));
    let pipeline = PipelineCtx {
        store: store.clone(),
        extractor,
        quality: cfg.quality,
        thresholds: cfg.health,
    };
    let state = AppState {
        store,
        cfg,
        pipeline,
        fetcher,
    };
    let metrics = metrics::Metrics::init();
    create_router(state, &metrics)
}
