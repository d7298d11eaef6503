// src/metrics.rs
use axum::{routing::get, Router};
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_fetch_success_total", "Successful feed fetch outcomes.");
        describe_counter!("feed_fetch_failure_total", "Failed feed fetch outcomes.");
        describe_counter!("feed_auto_disabled_total", "Feeds auto-disabled by escalation.");
        describe_counter!("feed_health_resets_total", "Administrative bulk health resets.");
        describe_counter!("extract_processed_total", "Extractions graded as acceptable.");
        describe_counter!("extract_skipped_total", "Extractions skipped (already had content).");
        describe_counter!("extract_failed_total", "Extractions that failed fetch or length.");
        describe_counter!("quality_blocked_total", "Articles blocked by the quality gate.");
        describe_counter!("pipeline_runs_total", "Batch pipeline invocations.");
        describe_counter!("lifecycle_backfilled_total", "Articles advanced by the backfill.");
        describe_counter!("orphans_deleted_total", "Articles removed by reconciliation.");
        describe_counter!("ingest_items_total", "Items discovered in polled feeds.");
        describe_counter!("ingest_enqueued_total", "New articles enqueued from feeds.");
        describe_counter!("ingest_poll_errors_total", "Feed poll fetch/parse errors.");
    });
}

impl Metrics {
    /// Initialize the Prometheus recorder and register series descriptions.
    /// Idempotent so test binaries can build multiple routers.
    pub fn init() -> Self {
        static RECORDER: OnceCell<PrometheusHandle> = OnceCell::new();

        // Use default buckets to avoid API differences across crate versions.
        let handle = RECORDER
            .get_or_init(|| {
                PrometheusBuilder::new()
                    .install_recorder()
                    .expect("prometheus: install recorder")
            })
            .clone();

        ensure_metrics_described();

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
