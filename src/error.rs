use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the statistics engine.
#[derive(Debug, Error)]
pub enum StatsError {
    /// A store command failed. Never retried here; the caller owns retry policy.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// `export` was asked for a granularity outside the table.
    #[error("unknown granularity '{name}' (expected seconds, minutes, hours or days)")]
    UnknownGranularity { name: String },
}

pub type Result<T> = std::result::Result<T, StatsError>;
