//! In-memory store with a controllable clock.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::interval;
use tracing::debug;

use super::{MetricStore, StoreError, StoreResult};

/// Process-local `MetricStore`.
///
/// Mirrors the Redis semantics the engine relies on, including key expiry
/// evaluated against the store's own clock. The clock follows the local wall
/// clock until it is pinned with `with_time`, `set_time` or `advance`; a
/// pinned clock only moves when told to, so slot placement is deterministic.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    /// `None` follows the wall clock
    pinned: Option<i64>,
    hashes: HashMap<String, HashMap<String, String>>,
    sets: HashMap<String, BTreeSet<String>>,
    expiries: HashMap<String, i64>,
    commands: u64,
}

impl MemoryStore {
    /// Store whose clock follows the local wall clock.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Store whose clock is pinned at `now` (epoch seconds).
    pub fn with_time(now: i64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                pinned: Some(now),
                ..Inner::default()
            }),
        }
    }

    /// Pins the clock at `now`.
    pub fn set_time(&self, now: i64) {
        self.inner.lock().pinned = Some(now);
    }

    /// Moves the clock forward by `secs`, pinning it first if it follows
    /// the wall clock.
    pub fn advance(&self, secs: i64) {
        let mut inner = self.inner.lock();
        let now = inner.now();
        inner.pinned = Some(now + secs);
    }

    /// Number of commands served so far.
    pub fn commands(&self) -> u64 {
        self.inner.lock().commands
    }

    /// Absolute expiry of `key`, if one is set and the key is still live.
    pub fn expiry(&self, key: &str) -> Option<i64> {
        let mut inner = self.inner.lock();
        inner.purge_if_expired(key);
        inner.expiries.get(key).copied()
    }

    /// Every live hash key, sorted.
    pub fn hash_keys(&self) -> Vec<String> {
        let mut inner = self.inner.lock();
        let names: Vec<String> = inner.hashes.keys().cloned().collect();
        let mut live: Vec<String> = names
            .into_iter()
            .filter(|k| {
                inner.purge_if_expired(k);
                inner.hashes.contains_key(k)
            })
            .collect();
        live.sort();
        live
    }

    /// Drops every key whose expiry has passed, returning how many went.
    pub fn sweep_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        let now = inner.now();
        let expired: Vec<String> = inner
            .expiries
            .iter()
            .filter(|(_, &at)| at <= now)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.remove(key);
        }
        expired.len()
    }

    /// Spawns a task sweeping expired keys every `every`.
    pub fn start_ttl_cleanup(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticks = interval(every);
            loop {
                ticks.tick().await;
                let removed = store.sweep_expired();
                if removed > 0 {
                    debug!(removed, "swept expired keys");
                }
            }
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    /// Counts one command and drops `key` if its expiry has passed.
    fn begin(&mut self, key: &str) {
        self.commands += 1;
        self.purge_if_expired(key);
    }

    fn now(&self) -> i64 {
        self.pinned
            .unwrap_or_else(|| chrono::Utc::now().timestamp())
    }

    fn purge_if_expired(&mut self, key: &str) {
        if let Some(&at) = self.expiries.get(key) {
            if at <= self.now() {
                self.remove(key);
            }
        }
    }

    fn remove(&mut self, key: &str) {
        self.expiries.remove(key);
        self.hashes.remove(key);
        self.sets.remove(key);
    }
}

#[async_trait]
impl MetricStore for MemoryStore {
    async fn hash_increment(&self, key: &str, field: i64, step: i64) -> StoreResult<i64> {
        let mut inner = self.inner.lock();
        inner.begin(key);

        let slot = inner
            .hashes
            .entry(key.to_owned())
            .or_default()
            .entry(field.to_string())
            .or_insert_with(|| "0".to_owned());

        let current: i64 = slot.parse().map_err(|_| StoreError::Backend {
            message: format!("hash value at {key}/{field} is not an integer"),
        })?;
        let next = current.checked_add(step).ok_or_else(|| StoreError::Backend {
            message: format!("increment would overflow at {key}/{field}"),
        })?;

        *slot = next.to_string();
        Ok(next)
    }

    async fn hash_set_if_absent(&self, key: &str, field: i64, value: &str) -> StoreResult<bool> {
        let mut inner = self.inner.lock();
        inner.begin(key);

        let hash = inner.hashes.entry(key.to_owned()).or_default();
        let field = field.to_string();
        if hash.contains_key(&field) {
            return Ok(false);
        }
        hash.insert(field, value.to_owned());
        Ok(true)
    }

    async fn hash_set(&self, key: &str, field: i64, value: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        inner.begin(key);

        inner
            .hashes
            .entry(key.to_owned())
            .or_default()
            .insert(field.to_string(), value.to_owned());
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        let mut inner = self.inner.lock();
        inner.begin(key);
        Ok(inner.hashes.get(key).cloned().unwrap_or_default())
    }

    async fn expire_at(&self, key: &str, at: i64) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        inner.begin(key);

        if inner.hashes.contains_key(key) || inner.sets.contains_key(key) {
            inner.expiries.insert(key.to_owned(), at);
            // An expiry already in the past deletes the key right away
            inner.purge_if_expired(key);
        }
        Ok(())
    }

    async fn set_add(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        inner.begin(key);

        inner
            .sets
            .entry(key.to_owned())
            .or_default()
            .insert(member.to_owned());
        Ok(())
    }

    async fn set_members(&self, key: &str) -> StoreResult<BTreeSet<String>> {
        let mut inner = self.inner.lock();
        inner.begin(key);
        Ok(inner.sets.get(key).cloned().unwrap_or_default())
    }

    async fn server_time(&self) -> StoreResult<i64> {
        let mut inner = self.inner.lock();
        inner.commands += 1;
        Ok(inner.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn increment_accumulates_from_zero() {
        let store = MemoryStore::with_time(0);
        assert_eq!(store.hash_increment("k", 1, 2).await.unwrap(), 2);
        assert_eq!(store.hash_increment("k", 1, 3).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn increment_rejects_non_integer_values() {
        let store = MemoryStore::with_time(0);
        store.hash_set("k", 1, "1.5").await.unwrap();
        assert!(matches!(
            store.hash_increment("k", 1, 1).await,
            Err(StoreError::Backend { .. })
        ));
    }

    #[tokio::test]
    async fn set_if_absent_keeps_first_value() {
        let store = MemoryStore::with_time(0);
        assert!(store.hash_set_if_absent("k", 1, "a").await.unwrap());
        assert!(!store.hash_set_if_absent("k", 1, "b").await.unwrap());
        assert_eq!(store.hash_get_all("k").await.unwrap()["1"], "a");
    }

    #[tokio::test]
    async fn keys_vanish_once_expiry_passes() {
        let store = MemoryStore::with_time(100);
        store.hash_set("k", 1, "v").await.unwrap();
        store.expire_at("k", 110).await.unwrap();

        store.set_time(109);
        assert_eq!(store.hash_get_all("k").await.unwrap().len(), 1);
        assert_eq!(store.expiry("k"), Some(110));

        store.advance(1);
        assert!(store.hash_get_all("k").await.unwrap().is_empty());
        assert_eq!(store.expiry("k"), None);
    }

    #[tokio::test]
    async fn expire_on_missing_key_is_a_no_op() {
        let store = MemoryStore::with_time(0);
        store.expire_at("missing", 50).await.unwrap();
        assert_eq!(store.expiry("missing"), None);
    }

    #[tokio::test]
    async fn unpinned_clock_follows_wall_clock() {
        let store = MemoryStore::new();
        let t1 = store.server_time().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        let t2 = store.server_time().await.unwrap();
        assert!(t2 > t1, "clock stuck at {t1}");
    }

    #[tokio::test]
    async fn advance_pins_a_wall_clock_store() {
        let store = MemoryStore::new();
        let before = store.server_time().await.unwrap();
        store.advance(3600);
        let after = store.server_time().await.unwrap();
        assert!(after >= before + 3600);
        assert_eq!(store.server_time().await.unwrap(), after);
    }

    #[tokio::test]
    async fn sweep_drops_untouched_expired_keys() {
        let store = MemoryStore::with_time(0);
        store.hash_set("old", 1, "v").await.unwrap();
        store.expire_at("old", 10).await.unwrap();
        store.hash_set("fresh", 1, "v").await.unwrap();
        store.expire_at("fresh", 100).await.unwrap();

        store.set_time(10);
        assert_eq!(store.sweep_expired(), 1);
        assert_eq!(store.sweep_expired(), 0);
        assert_eq!(store.hash_keys(), vec!["fresh"]);
    }

    #[tokio::test]
    async fn cleanup_task_sweeps_in_the_background() {
        let store = Arc::new(MemoryStore::with_time(0));
        store.hash_set("old", 1, "v").await.unwrap();
        store.expire_at("old", 5).await.unwrap();
        store.set_time(5);

        let handle = store.start_ttl_cleanup(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        // Nothing left for a manual sweep
        assert_eq!(store.sweep_expired(), 0);
    }

    #[tokio::test]
    async fn counts_every_command() {
        let store = MemoryStore::with_time(0);
        store.server_time().await.unwrap();
        store.set_add("s", "a").await.unwrap();
        store.set_members("s").await.unwrap();
        assert_eq!(store.commands(), 3);
    }
}
