pub mod collector;
pub mod percentiles;

pub use collector::{MetricsCollector, MetricsSnapshot};

/// One timed API call, pushed by a handler once it has its answer.
#[derive(Debug, Clone)]
pub struct Sample {
    /// e.g. "increment", "export"
    pub operation: &'static str,
    /// Microseconds spent inside store round-trips
    pub store_us: u64,
    /// Total handler wall time in microseconds
    pub total_us: u64,
    /// false when the store or the request failed
    pub success: bool,
}
