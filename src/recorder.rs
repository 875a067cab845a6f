//! Write path: fold one event into a slot of every granularity.

use tracing::{debug, instrument};

use crate::error::Result;
use crate::granularity;
use crate::keys::{self, BUCKETS_KEY};
use crate::measurement::MeasurementType;
use crate::stats::Stats;
use crate::store::MetricStore;

/// How an event is applied to its slot.
enum SlotWrite {
    /// Add to the slot (HINCRBY).
    Add(i64),
    /// Keep the first value written to the slot (HSETNX).
    Keep(String),
    /// Replace the slot (HSET).
    Replace(String),
}

impl<S: MetricStore> Stats<S> {
    /// Adds `step` to the bucket's counter in the current slot.
    pub async fn increment(&self, bucket: &str, step: i64) -> Result<()> {
        self.record(bucket, MeasurementType::Counts, SlotWrite::Add(step))
            .await
    }

    /// Records that an event happened at `occurred_at` (epoch seconds).
    ///
    /// Only the first timing in a slot is kept; later ones are dropped.
    pub async fn timing(&self, bucket: &str, occurred_at: i64) -> Result<()> {
        self.record(
            bucket,
            MeasurementType::Timings,
            SlotWrite::Keep(occurred_at.to_string()),
        )
        .await
    }

    /// Sets the bucket's gauge for the current slot; the last value wins.
    pub async fn gauge(&self, bucket: &str, value: f64) -> Result<()> {
        self.record(
            bucket,
            MeasurementType::Gauges,
            SlotWrite::Replace(value.to_string()),
        )
        .await
    }

    /// One clock read, then every granularity in table order. The first
    /// failing command ends the call; earlier granularities stay written.
    #[instrument(level = "debug", skip(self, kind, write), fields(kind = %kind))]
    async fn record(&self, bucket: &str, kind: MeasurementType, write: SlotWrite) -> Result<()> {
        let now = self.store.server_time().await?;

        for g in granularity::definitions() {
            let key = keys::partition_key(bucket, kind, g, now);
            let field = keys::slot_field(g, now);

            match &write {
                SlotWrite::Add(step) => {
                    let total = self.store.hash_increment(&key, field, *step).await?;
                    debug!(%key, field, total, "slot incremented");
                }
                SlotWrite::Keep(value) => {
                    let created = self.store.hash_set_if_absent(&key, field, value).await?;
                    debug!(%key, field, created, "slot timing");
                }
                SlotWrite::Replace(value) => {
                    self.store.hash_set(&key, field, value).await?;
                    debug!(%key, field, %value, "slot gauge");
                }
            }

            let expires_at = now.saturating_add_unsigned(g.ttl);
            self.store.expire_at(&key, expires_at).await?;
        }

        self.store.set_add(BUCKETS_KEY, bucket).await?;
        self.store
            .set_add(&keys::types_key(bucket), kind.as_str())
            .await?;

        Ok(())
    }
}
