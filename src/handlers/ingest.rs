use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::StatsError;
use crate::measurement::MeasurementType;
use crate::AppState;

use super::{timed, AppError, TimedResponse};

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct IncrementRequest {
    #[serde(default = "default_step")]
    pub step: i64,
}

fn default_step() -> i64 {
    1
}

// A bodiless POST counts one event
impl Default for IncrementRequest {
    fn default() -> Self {
        Self {
            step: default_step(),
        }
    }
}

impl IncrementRequest {
    /// Parses an increment body. An empty body counts one event; anything
    /// else must be a valid request object.
    pub fn from_body(body: &[u8]) -> Result<Self, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("invalid increment body: {e}")))
    }
}

#[derive(Debug, Deserialize)]
pub struct TimingRequest {
    /// Epoch seconds
    pub occurred_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct GaugeRequest {
    pub value: f64,
}

/// Acknowledges a recorded measurement.
#[derive(Debug, Clone, Serialize)]
pub struct Recorded {
    pub bucket: String,
    #[serde(rename = "type")]
    pub kind: MeasurementType,
}

// ─── POST /api/buckets/:bucket/increment ─────────────────────────

pub async fn increment(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
    body: Bytes,
) -> Result<Json<TimedResponse<Recorded>>, AppError> {
    let t0 = Instant::now();
    let req = IncrementRequest::from_body(&body)?;

    timed(&state, "increment", t0, async {
        state.stats.increment(&bucket, req.step).await?;
        Ok::<_, StatsError>(Recorded {
            bucket: bucket.clone(),
            kind: MeasurementType::Counts,
        })
    })
    .await
}

// ─── POST /api/buckets/:bucket/timing ────────────────────────────

pub async fn timing(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
    Json(req): Json<TimingRequest>,
) -> Result<Json<TimedResponse<Recorded>>, AppError> {
    let t0 = Instant::now();

    timed(&state, "timing", t0, async {
        state.stats.timing(&bucket, req.occurred_at).await?;
        Ok::<_, StatsError>(Recorded {
            bucket: bucket.clone(),
            kind: MeasurementType::Timings,
        })
    })
    .await
}

// ─── POST /api/buckets/:bucket/gauge ─────────────────────────────

pub async fn gauge(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
    Json(req): Json<GaugeRequest>,
) -> Result<Json<TimedResponse<Recorded>>, AppError> {
    let t0 = Instant::now();

    if !req.value.is_finite() {
        return Err(AppError::BadRequest("value must be a finite number".into()));
    }

    timed(&state, "gauge", t0, async {
        state.stats.gauge(&bucket, req.value).await?;
        Ok::<_, StatsError>(Recorded {
            bucket: bucket.clone(),
            kind: MeasurementType::Gauges,
        })
    })
    .await
}
