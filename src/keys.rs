//! Storage addressing.
//!
//! Every measurement lands in a Redis hash named
//! `<bucket>:<type>:<granularity>:<partition start>` under the field
//! `<slot start>`, both epoch seconds. The key format is persisted and must
//! stay stable.

use std::num::NonZeroU32;

use crate::granularity::Granularity;
use crate::measurement::MeasurementType;

const DELIMITER: char = ':';

/// Global set of every bucket ever written.
pub const BUCKETS_KEY: &str = "buckets";

const TYPES_PREFIX: &str = "types";

/// Rounds `timestamp` down to a multiple of `unit` (floor, also for
/// timestamps before the epoch).
pub fn round_down(timestamp: i64, unit: NonZeroU32) -> i64 {
    let unit = i64::from(unit.get());
    timestamp.div_euclid(unit) * unit
}

/// Key of the partition holding `timestamp`.
pub fn partition_key(
    bucket: &str,
    kind: MeasurementType,
    granularity: &Granularity,
    timestamp: i64,
) -> String {
    let start = round_down(timestamp, granularity.span());
    format!(
        "{bucket}{DELIMITER}{kind}{DELIMITER}{}{DELIMITER}{start}",
        granularity.name
    )
}

/// Field of the slot holding `timestamp`.
pub fn slot_field(granularity: &Granularity, timestamp: i64) -> i64 {
    round_down(timestamp, granularity.factor)
}

/// Distinct partition keys touched while walking `[from, to)` one slot at a
/// time, in first-seen order.
///
/// The walk visits `from`, `from + factor`, ...; once a point has named its
/// partition, the remaining points of that partition are skipped, so the
/// cost is one step per partition rather than per slot.
pub fn keys_for_range(
    bucket: &str,
    kind: MeasurementType,
    granularity: &Granularity,
    from: i64,
    to: i64,
) -> Vec<String> {
    let step = i64::from(granularity.factor.get());
    let span = granularity.span();
    let mut keys = Vec::new();

    let mut t = from;
    while t < to {
        keys.push(partition_key(bucket, kind, granularity, t));

        // First walk point at or past the next partition boundary
        let boundary = round_down(t, span).checked_add(i64::from(span.get()));
        let next = boundary
            .and_then(|b| b.checked_sub(from))
            .and_then(|gap| {
                let steps = gap / step + i64::from(gap % step != 0);
                steps.checked_mul(step)
            })
            .and_then(|offset| from.checked_add(offset));
        t = match next {
            Some(next) => next,
            None => break,
        };
    }

    keys
}

/// Set of measurement types recorded for `bucket`.
pub fn types_key(bucket: &str) -> String {
    format!("{TYPES_PREFIX}{DELIMITER}{bucket}")
}
