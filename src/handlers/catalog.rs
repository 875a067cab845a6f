use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::AppState;

use super::{timed, AppError, TimedResponse};

// ─── GET /api/buckets ────────────────────────────────────────────

pub async fn list_buckets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TimedResponse<BTreeSet<String>>>, AppError> {
    let t0 = Instant::now();
    timed(&state, "buckets", t0, state.stats.buckets()).await
}

// ─── GET /api/buckets/:bucket/types ──────────────────────────────

pub async fn list_types(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
) -> Result<Json<TimedResponse<BTreeSet<String>>>, AppError> {
    let t0 = Instant::now();
    timed(&state, "types", t0, state.stats.types(&bucket)).await
}
