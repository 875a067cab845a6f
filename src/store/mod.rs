//! The store capability the statistics engine is written against.

pub mod memory_store;
pub mod redis_store;

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use thiserror::Error;

pub use self::memory_store::MemoryStore;
pub use self::redis_store::RedisStore;

/// Failure of an underlying store call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("store backend failed: {message}")]
    Backend { message: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Hash, set and clock primitives over a shared key/value store.
///
/// Each method maps to one store command; atomicity is per command.
/// Hash fields are slot timestamps in epoch seconds.
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// `HINCRBY key field step`, returning the new value.
    async fn hash_increment(&self, key: &str, field: i64, step: i64) -> StoreResult<i64>;

    /// `HSETNX key field value`; `true` when the field was created.
    async fn hash_set_if_absent(&self, key: &str, field: i64, value: &str) -> StoreResult<bool>;

    /// `HSET key field value`
    async fn hash_set(&self, key: &str, field: i64, value: &str) -> StoreResult<()>;

    /// `HGETALL key`; empty when the key does not exist.
    async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>>;

    /// `EXPIREAT key at`
    async fn expire_at(&self, key: &str, at: i64) -> StoreResult<()>;

    /// `SADD key member`
    async fn set_add(&self, key: &str, member: &str) -> StoreResult<()>;

    /// `SMEMBERS key`
    async fn set_members(&self, key: &str) -> StoreResult<BTreeSet<String>>;

    /// Store clock in epoch seconds, shared by every writer.
    async fn server_time(&self) -> StoreResult<i64>;
}

#[async_trait]
impl<T: MetricStore + ?Sized> MetricStore for std::sync::Arc<T> {
    async fn hash_increment(&self, key: &str, field: i64, step: i64) -> StoreResult<i64> {
        (**self).hash_increment(key, field, step).await
    }

    async fn hash_set_if_absent(&self, key: &str, field: i64, value: &str) -> StoreResult<bool> {
        (**self).hash_set_if_absent(key, field, value).await
    }

    async fn hash_set(&self, key: &str, field: i64, value: &str) -> StoreResult<()> {
        (**self).hash_set(key, field, value).await
    }

    async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        (**self).hash_get_all(key).await
    }

    async fn expire_at(&self, key: &str, at: i64) -> StoreResult<()> {
        (**self).expire_at(key, at).await
    }

    async fn set_add(&self, key: &str, member: &str) -> StoreResult<()> {
        (**self).set_add(key, member).await
    }

    async fn set_members(&self, key: &str) -> StoreResult<BTreeSet<String>> {
        (**self).set_members(key).await
    }

    async fn server_time(&self) -> StoreResult<i64> {
        (**self).server_time().await
    }
}
