use std::num::NonZeroU32;

use serde::Serialize;

// ─── Definition ──────────────────────────────────────────────────

/// One time resolution at which measurements are aggregated.
///
/// A granularity splits time into *slots* of `factor` seconds and groups
/// `partition` consecutive slots under one storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Granularity {
    /// e.g. "seconds"
    pub name: &'static str,
    /// Slots per partition (per storage key)
    pub partition: NonZeroU32,
    /// Seconds a partition key lives after its latest write
    pub ttl: u64,
    /// Seconds per slot
    pub factor: NonZeroU32,
    span: NonZeroU32,
}

impl Granularity {
    /// Builds a definition.
    ///
    /// # Panics
    ///
    /// Panics when `partition` or `factor` is zero, or when the partition
    /// span (`partition * factor` seconds) overflows `u32`. In a `const`
    /// context this is a compile error.
    pub const fn new(name: &'static str, partition: u32, ttl: u64, factor: u32) -> Self {
        let span = match partition.checked_mul(factor) {
            Some(span) => span,
            None => panic!("granularity partition span overflows u32"),
        };

        Self {
            name,
            partition: non_zero(partition),
            ttl,
            factor: non_zero(factor),
            span: non_zero(span),
        }
    }

    /// Width of one partition in seconds.
    pub const fn span(&self) -> NonZeroU32 {
        self.span
    }
}

const fn non_zero(v: u32) -> NonZeroU32 {
    match NonZeroU32::new(v) {
        Some(v) => v,
        None => panic!("granularity units must be positive"),
    }
}

// ─── Shipped table ───────────────────────────────────────────────

const DAY: u64 = 60 * 60 * 24;

/// Every supported resolution, finest first.
pub const GRANULARITIES: [Granularity; 4] = [
    // 3600 one-second slots per key (1 hour), kept for a day
    Granularity::new("seconds", 3600, DAY, 1),
    // 1440 one-minute slots per key (1 day), kept for a week
    Granularity::new("minutes", 60 * 24, DAY * 7, 60),
    // 24 one-hour slots per key (1 day), kept for a week
    Granularity::new("hours", 24, DAY * 7, 3600),
    // 365 one-day slots per key (1 year), kept for 5 years
    Granularity::new("days", 365, DAY * 365 * 5, 86400),
];

/// The ordered granularity table.
pub fn definitions() -> &'static [Granularity] {
    &GRANULARITIES
}

/// Finds a granularity by name.
pub fn lookup(name: &str) -> Option<&'static Granularity> {
    GRANULARITIES.iter().find(|g| g.name == name)
}
