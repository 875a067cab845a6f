pub mod catalog;
pub mod export;
pub mod ingest;

use std::future::Future;
use std::time::Instant;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::error::StatsError;
use crate::metrics::Sample;
use crate::AppState;

// ─── Shared response envelope ────────────────────────────────────

/// Every API response is wrapped with timing metadata so callers can see
/// per-request latency without parsing headers.
#[derive(Debug, Clone, Serialize)]
pub struct TimedResponse<T: Serialize> {
    pub data: T,
    pub timing: RequestTiming,
}

/// Microsecond-precision breakdown of where wall-clock time was spent.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RequestTiming {
    /// Total handler wall time (μs)
    pub total_us: u64,
    /// Time spent in store round-trips (μs)
    pub store_us: u64,
    /// Parsing / validation / routing overhead (μs)
    pub overhead_us: u64,
}

/// Runs one engine call, records its latency and wraps the result.
///
/// `t0` is taken by the handler before it starts validating input so the
/// overhead figure includes that work.
pub(crate) async fn timed<T, F>(
    state: &AppState,
    operation: &'static str,
    t0: Instant,
    call: F,
) -> Result<Json<TimedResponse<T>>, AppError>
where
    T: Serialize,
    F: Future<Output = Result<T, StatsError>>,
{
    // ── Store round-trips ───────────────────────────────────────
    let t_store = Instant::now();
    let result = call.await;
    let store_us = micros(t_store);
    // ────────────────────────────────────────────────────────────

    let total_us = micros(t0);
    let overhead_us = total_us.saturating_sub(store_us);

    state.metrics.record(Sample {
        operation,
        store_us,
        total_us,
        success: result.is_ok(),
    });

    let data = result.map_err(|e| {
        error!(operation, error = %e, "request failed");
        AppError::from(e)
    })?;

    Ok(Json(TimedResponse {
        data,
        timing: RequestTiming {
            total_us,
            store_us,
            overhead_us,
        },
    }))
}

fn micros(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_micros()).unwrap_or(u64::MAX)
}

// ─── Unified error type ──────────────────────────────────────────

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Store(String),
}

impl From<StatsError> for AppError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::UnknownGranularity { .. } => Self::BadRequest(err.to_string()),
            StatsError::Store(e) => Self::Store(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Store(msg) => (StatusCode::INTERNAL_SERVER_ERROR, format!("Store: {msg}")),
        };

        let body = serde_json::json!({
            "error":  message,
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
