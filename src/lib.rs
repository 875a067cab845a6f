//! Time-slotted counters, timings and gauges kept in Redis hashes.
//!
//! Every measurement is folded into one slot per granularity (seconds,
//! minutes, hours, days). Slots are grouped into partition keys that expire
//! on their own, and range exports stitch the partitions back together.

use std::sync::Arc;

pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod granularity;
pub mod handlers;
pub mod keys;
pub mod logging;
pub mod measurement;
pub mod metrics;
pub mod middleware;
pub mod recorder;
pub mod server;
pub mod stats;
pub mod store;

pub use error::{Result, StatsError};
pub use export::DataPoint;
pub use granularity::Granularity;
pub use measurement::MeasurementType;
pub use stats::Stats;
pub use store::{MemoryStore, MetricStore, RedisStore, StoreError};

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Statistics engine over whichever backend was configured.
    pub stats: Stats<Arc<dyn MetricStore>>,

    /// Latency book-keeping for the API itself.
    pub metrics: Arc<metrics::MetricsCollector>,
}

impl AppState {
    /// State over `store` with a fresh latency collector.
    pub fn new(store: Arc<dyn MetricStore>) -> Self {
        Self {
            stats: Stats::new(store),
            metrics: Arc::new(metrics::MetricsCollector::new()),
        }
    }
}
