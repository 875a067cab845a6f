use crate::store::MetricStore;

/// Time-slotted statistics over a shared store.
///
/// Holds no mutable state of its own: every operation goes straight to the
/// store, so any number of processes can record into the same buckets.
/// Writes live in `recorder`, range reads in `export`, bucket listings in
/// `catalog`.
#[derive(Debug, Clone)]
pub struct Stats<S> {
    pub(crate) store: S,
}

impl<S: MetricStore> Stats<S> {
    /// Engine writing to and reading from `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }
}
