// src/api.rs
//! HTTP surface for the ingestion core: the operations exposed to admin
//! tooling and external schedulers, plus the read-only monitoring
//! snapshot. Handlers stay thin: they parse parameters, call into the
//! core modules, and map failures to structured responses.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::fetch::PageFetcher;
use crate::ingest::{self, PollReport, PollSummary};
use crate::lifecycle::{self, BackfillReport};
use crate::monitor::{self, SystemSnapshot};
use crate::pipeline::{self, BatchReport, ItemReport, PipelineCtx};
use crate::reconcile::{self, ReconcileError, ReconcileReport};
use crate::store::{Article, Feed, NewFeed, Store};
use crate::{feed_health, metrics::Metrics};

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub cfg: Arc<Config>,
    pub pipeline: PipelineCtx,
    pub fetcher: Arc<dyn PageFetcher>,
}

pub fn create_router(state: AppState, metrics: &Metrics) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/monitor", get(monitor_snapshot))
        .route("/articles", get(recent_articles))
        .route("/articles/{id}/extract", post(extract_article))
        .route("/pipeline/run", post(run_pipeline))
        .route("/feeds", get(list_feeds).post(register_feed))
        .route("/feeds/{id}/poll", post(poll_feed))
        .route("/ingest/poll", post(poll_all_feeds))
        .route("/admin/feeds/reset", post(reset_feed_health))
        .route("/admin/reconcile", post(reconcile_orphans))
        .route("/admin/backfill", post(run_backfill))
        .with_state(state)
        .merge(metrics.router())
        .layer(CorsLayer::very_permissive())
}

type ApiError = (StatusCode, String);

fn internal(e: anyhow::Error) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

async fn monitor_snapshot(
    State(state): State<AppState>,
) -> Result<Json<SystemSnapshot>, ApiError> {
    let snap = monitor::snapshot(&state.store, &state.cfg.monitor)
        .await
        .map_err(internal)?;
    Ok(Json(snap))
}

#[derive(Deserialize)]
struct RecentQuery {
    days: Option<i64>,
    #[serde(default)]
    include_blocked: bool,
}

async fn recent_articles(
    State(state): State<AppState>,
    Query(q): Query<RecentQuery>,
) -> Result<Json<Vec<Article>>, ApiError> {
    let days = q.days.unwrap_or(state.cfg.ingest.recent_window_days);
    let rows = state
        .store
        .recent_articles(days, q.include_blocked)
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

#[derive(Deserialize)]
struct ForceQuery {
    #[serde(default)]
    force: bool,
}

async fn extract_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(q): Query<ForceQuery>,
) -> Result<Json<ItemReport>, ApiError> {
    let article = state
        .store
        .get_article(id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, format!("article {id} not found")))?;

    let report = pipeline::process_article(&state.pipeline, article, q.force).await;
    Ok(Json(report))
}

async fn run_pipeline(State(state): State<AppState>) -> Result<Json<BatchReport>, ApiError> {
    let report = pipeline::process_queued(&state.pipeline, state.cfg.ingest.batch_size)
        .await
        .map_err(internal)?;
    Ok(Json(report))
}

async fn list_feeds(State(state): State<AppState>) -> Result<Json<Vec<Feed>>, ApiError> {
    let feeds = state.store.list_feeds().await.map_err(internal)?;
    Ok(Json(feeds))
}

async fn register_feed(
    State(state): State<AppState>,
    Json(new): Json<NewFeed>,
) -> Result<(StatusCode, Json<Feed>), ApiError> {
    let feed = state
        .store
        .insert_feed(new)
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok((StatusCode::CREATED, Json(feed)))
}

async fn poll_feed(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PollReport>, ApiError> {
    let report = ingest::poll_feed(&state.store, &state.fetcher, &state.cfg.health, id)
        .await
        .map_err(|e| (StatusCode::BAD_GATEWAY, e.to_string()))?;
    Ok(Json(report))
}

async fn poll_all_feeds(State(state): State<AppState>) -> Result<Json<PollSummary>, ApiError> {
    let summary = ingest::poll_all(&state.store, &state.fetcher, &state.cfg.health)
        .await
        .map_err(internal)?;
    Ok(Json(summary))
}

#[derive(serde::Serialize)]
struct ResetResponse {
    repaired: u64,
}

async fn reset_feed_health(
    State(state): State<AppState>,
) -> Result<Json<ResetResponse>, ApiError> {
    let repaired = feed_health::reset_all(&state.store).await.map_err(internal)?;
    Ok(Json(ResetResponse { repaired }))
}

async fn reconcile_orphans(
    State(state): State<AppState>,
    Query(q): Query<ForceQuery>,
) -> Result<Json<ReconcileReport>, ApiError> {
    match reconcile::reconcile(&state.store, q.force).await {
        Ok(report) => Ok(Json(report)),
        Err(e @ ReconcileError::NoActiveFeeds) => Err((StatusCode::CONFLICT, e.to_string())),
        Err(ReconcileError::Store(e)) => Err(internal(e)),
    }
}

async fn run_backfill(State(state): State<AppState>) -> Result<Json<BackfillReport>, ApiError> {
    let report = lifecycle::publish_backfill(&state.store)
        .await
        .map_err(internal)?;
    Ok(Json(report))
}
