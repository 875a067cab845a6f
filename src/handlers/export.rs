use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::export::DataPoint;
use crate::granularity;
use crate::measurement::MeasurementType;
use crate::AppState;

use super::{timed, AppError, TimedResponse};

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// Epoch seconds, inclusive
    pub from: i64,
    /// Epoch seconds, inclusive; now when absent
    pub to: Option<i64>,
}

/// Most partitions a single export may read.
pub const MAX_EXPORT_PARTITIONS: i64 = 1_000;

// ─── GET /api/buckets/:bucket/:type/:granularity ─────────────────

pub async fn export(
    State(state): State<Arc<AppState>>,
    Path((bucket, kind, granularity)): Path<(String, String, String)>,
    Query(query): Query<ExportQuery>,
) -> Result<Json<TimedResponse<Vec<DataPoint>>>, AppError> {
    let t0 = Instant::now();

    let kind = kind
        .parse::<MeasurementType>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let from = epoch("from", query.from)?;
    let to = query.to.map(|t| epoch("to", t)).transpose()?;

    // Unknown names fall through so the engine reports them
    if let Some(settings) = granularity::lookup(&granularity) {
        let end = to.unwrap_or_else(Utc::now).timestamp();
        let span = i64::from(settings.span().get());
        let partitions = end.saturating_sub(query.from) / span + 1;
        if partitions > MAX_EXPORT_PARTITIONS {
            return Err(AppError::BadRequest(format!(
                "range spans {partitions} {granularity} partitions, at most {MAX_EXPORT_PARTITIONS} allowed"
            )));
        }
    }

    timed(
        &state,
        "export",
        t0,
        state.stats.export(&bucket, kind, &granularity, from, to),
    )
    .await
}

fn epoch(name: &str, secs: i64) -> Result<DateTime<Utc>, AppError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| AppError::BadRequest(format!("{name} is out of range: {secs}")))
}
