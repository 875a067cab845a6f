use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::Serialize;

use super::percentiles::PercentileSet;
use super::Sample;

// ─── Configuration ───────────────────────────────────────────────

/// How many individual calls we keep for the recent feed
const MAX_RECENT_SAMPLES: usize = 100;

/// HdrHistogram range: 1 μs → 60 s, 3 significant figures
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 60_000_000;
const HIST_SIGFIG: u8 = 3;

// ─── Public types ────────────────────────────────────────────────

/// Thread-safe latency book-keeping for the service's own API calls.
/// Handlers call `record()`, `GET /api/metrics` calls `snapshot()`.
pub struct MetricsCollector {
    inner: Mutex<Inner>,
}

/// A single entry in the recent-calls feed.
#[derive(Debug, Clone, Serialize)]
pub struct SampleRecord {
    pub elapsed_ms: u64,
    pub operation: &'static str,
    pub store_us: u64,
    pub total_us: u64,
    pub success: bool,
}

/// Point-in-time view served as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Store round-trip latency per operation
    pub store: BTreeMap<&'static str, PercentileSet>,
    /// Whole-handler latency across all operations
    pub e2e: PercentileSet,

    pub total_requests: u64,
    pub total_errors: u64,
    pub requests_per_sec: f64,
    pub elapsed_secs: f64,

    pub recent_samples: Vec<SampleRecord>,
}

// ─── Internal state ──────────────────────────────────────────────

struct Inner {
    store_hists: BTreeMap<&'static str, Histogram<u64>>,
    e2e_hist: Histogram<u64>,

    total_requests: u64,
    total_errors: u64,

    recent_samples: VecDeque<SampleRecord>,

    start_time: Option<Instant>,
}

fn new_histogram() -> Histogram<u64> {
    Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG)
        .expect("static histogram bounds are valid")
}

// ─── MetricsCollector impl ───────────────────────────────────────

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
        }
    }

    /// Record one API call.
    pub fn record(&self, sample: Sample) {
        self.inner.lock().record(sample);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().snapshot()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Inner impl ──────────────────────────────────────────────────

impl Inner {
    fn new() -> Self {
        Self {
            store_hists: BTreeMap::new(),
            e2e_hist: new_histogram(),
            total_requests: 0,
            total_errors: 0,
            recent_samples: VecDeque::with_capacity(MAX_RECENT_SAMPLES + 1),
            start_time: None,
        }
    }

    fn record(&mut self, sample: Sample) {
        // Anchor on the very first sample
        let start = *self.start_time.get_or_insert_with(Instant::now);
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        self.total_requests += 1;
        if !sample.success {
            self.total_errors += 1;
        }

        // Histograms clamp to ≥ 1 μs; out-of-range values saturate
        self.store_hists
            .entry(sample.operation)
            .or_insert_with(new_histogram)
            .saturating_record(sample.store_us.max(1));
        self.e2e_hist.saturating_record(sample.total_us.max(1));

        self.recent_samples.push_back(SampleRecord {
            elapsed_ms,
            operation: sample.operation,
            store_us: sample.store_us,
            total_us: sample.total_us,
            success: sample.success,
        });
        if self.recent_samples.len() > MAX_RECENT_SAMPLES {
            self.recent_samples.pop_front();
        }
    }

    fn snapshot(&self) -> MetricsSnapshot {
        let elapsed_secs = self
            .start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);

        let requests_per_sec = if elapsed_secs > 0.0 {
            self.total_requests as f64 / elapsed_secs
        } else {
            0.0
        };

        MetricsSnapshot {
            store: self
                .store_hists
                .iter()
                .map(|(op, hist)| (*op, PercentileSet::from_histogram(hist)))
                .collect(),
            e2e: PercentileSet::from_histogram(&self.e2e_hist),
            total_requests: self.total_requests,
            total_errors: self.total_errors,
            requests_per_sec,
            elapsed_secs,
            recent_samples: self.recent_samples.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(operation: &'static str, store_us: u64, success: bool) -> Sample {
        Sample {
            operation,
            store_us,
            total_us: store_us + 10,
            success,
        }
    }

    #[test]
    fn groups_latency_by_operation() {
        let collector = MetricsCollector::new();
        collector.record(sample("increment", 100, true));
        collector.record(sample("increment", 200, true));
        collector.record(sample("export", 500, false));

        let snap = collector.snapshot();
        assert_eq!(snap.total_requests, 3);
        assert_eq!(snap.total_errors, 1);
        assert_eq!(snap.store["increment"].count, 2);
        assert_eq!(snap.store["export"].max, 500);
        assert_eq!(snap.e2e.count, 3);
    }

    #[test]
    fn recent_feed_is_bounded() {
        let collector = MetricsCollector::new();
        for _ in 0..MAX_RECENT_SAMPLES + 25 {
            collector.record(sample("gauge", 1, true));
        }
        assert_eq!(collector.snapshot().recent_samples.len(), MAX_RECENT_SAMPLES);
    }

    #[test]
    fn zero_latency_is_clamped() {
        let collector = MetricsCollector::new();
        collector.record(sample("buckets", 0, true));
        assert_eq!(collector.snapshot().store["buckets"].min, 1);
    }
}
