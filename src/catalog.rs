//! Which buckets exist and what they hold.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::keys::{self, BUCKETS_KEY};
use crate::stats::Stats;
use crate::store::MetricStore;

impl<S: MetricStore> Stats<S> {
    /// Every bucket that has been written to.
    pub async fn buckets(&self) -> Result<BTreeSet<String>> {
        Ok(self.store.set_members(BUCKETS_KEY).await?)
    }

    /// Measurement types recorded for `bucket`; empty for unknown buckets.
    pub async fn types(&self, bucket: &str) -> Result<BTreeSet<String>> {
        Ok(self.store.set_members(&keys::types_key(bucket)).await?)
    }
}
