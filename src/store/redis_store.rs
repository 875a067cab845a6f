use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::info;

use super::{MetricStore, StoreResult};

/// `MetricStore` backed by a Redis server.
///
/// `ConnectionManager` is cheaply cloneable — every clone shares the same
/// underlying multiplexed TCP connection and reconnects on failure.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Opens a managed connection to `url`.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        info!("connected to redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl MetricStore for RedisStore {
    async fn hash_increment(&self, key: &str, field: i64, step: i64) -> StoreResult<i64> {
        let mut conn = self.conn.clone();
        Ok(conn.hincr(key, field, step).await?)
    }

    async fn hash_set_if_absent(&self, key: &str, field: i64, value: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.hset_nx(key, field, value).await?)
    }

    async fn hash_set(&self, key: &str, field: i64, value: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.hset(key, field, value).await?;
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        let mut conn = self.conn.clone();
        Ok(conn.hgetall(key).await?)
    }

    async fn expire_at(&self, key: &str, at: i64) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("EXPIREAT")
            .arg(key)
            .arg(at)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn set_add(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.sadd(key, member).await?;
        Ok(())
    }

    async fn set_members(&self, key: &str) -> StoreResult<BTreeSet<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.smembers(key).await?)
    }

    async fn server_time(&self) -> StoreResult<i64> {
        let mut conn = self.conn.clone();
        // TIME replies [seconds, microseconds]
        let (secs, _micros): (i64, i64) = redis::cmd("TIME").query_async(&mut conn).await?;
        Ok(secs)
    }
}
