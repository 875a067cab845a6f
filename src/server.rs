use axum::{
    extract::State,
    middleware as axum_mw,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::metrics::MetricsSnapshot;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Ingestion ───────────────────────────────────────────
        .route(
            "/api/buckets/:bucket/increment",
            post(handlers::ingest::increment),
        )
        .route("/api/buckets/:bucket/timing", post(handlers::ingest::timing))
        .route("/api/buckets/:bucket/gauge", post(handlers::ingest::gauge))
        // ── Catalog ─────────────────────────────────────────────
        .route("/api/buckets", get(handlers::catalog::list_buckets))
        .route(
            "/api/buckets/:bucket/types",
            get(handlers::catalog::list_types),
        )
        // ── Range export ────────────────────────────────────────
        .route(
            "/api/buckets/:bucket/:type/:granularity",
            get(handlers::export::export),
        )
        // ── Service latency ─────────────────────────────────────
        .route("/api/metrics", get(get_metrics))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(CorsLayer::permissive())
}

// ─── GET /api/metrics ────────────────────────────────────────────

async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
