//! Read path: rebuild a time series from the partitions a range spans.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::error::{Result, StatsError};
use crate::granularity;
use crate::keys;
use crate::measurement::MeasurementType;
use crate::stats::Stats;
use crate::store::MetricStore;

/// One slot of an exported series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataPoint {
    /// Slot start, epoch seconds
    pub timestamp: i64,
    pub value: i64,
}

impl<S: MetricStore> Stats<S> {
    /// Every stored slot of `bucket`/`kind` at `granularity` whose start lies
    /// in `[from, to]`, ascending. `to` defaults to the local clock.
    ///
    /// Partitions are enumerated over `[from, to)` while slots are filtered
    /// over `[from, to]`; a slot starting exactly at `to` is only returned
    /// when its partition was also reached from an earlier step. A point
    /// range (`from == to`) reads the partition holding `from`.
    #[instrument(level = "debug", skip(self, kind, from, to), fields(kind = %kind))]
    pub async fn export(
        &self,
        bucket: &str,
        kind: MeasurementType,
        granularity: &str,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<DataPoint>> {
        let settings =
            granularity::lookup(granularity).ok_or_else(|| StatsError::UnknownGranularity {
                name: granularity.to_owned(),
            })?;

        let from = from.timestamp();
        let to = to.unwrap_or_else(Utc::now).timestamp();

        let keys = if from == to {
            vec![keys::partition_key(bucket, kind, settings, from)]
        } else {
            keys::keys_for_range(bucket, kind, settings, from, to)
        };
        debug!(partitions = keys.len(), from, to, "exporting range");

        let mut series = BTreeMap::new();
        for key in &keys {
            let fields = self.store.hash_get_all(key).await?;

            for (field, raw) in fields {
                let Ok(stamp) = field.parse::<i64>() else {
                    warn!(%key, %field, "ignoring non-numeric slot field");
                    continue;
                };

                if stamp >= from && stamp <= to {
                    series.insert(stamp, coerce_value(key, &raw));
                }
            }
        }

        Ok(series
            .into_iter()
            .map(|(timestamp, value)| DataPoint { timestamp, value })
            .collect())
    }
}

/// Integer view of a stored value. Gauges may hold fractions, which are
/// truncated toward zero; anything unparseable reads as zero.
fn coerce_value(key: &str, raw: &str) -> i64 {
    if let Ok(v) = raw.parse::<i64>() {
        return v;
    }

    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => v as i64,
        _ => {
            warn!(%key, value = %raw, "stored value is not numeric, reading as 0");
            0
        }
    }
}
