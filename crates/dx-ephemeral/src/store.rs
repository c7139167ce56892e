use super::Ephemeral;
use super::StoreError;
use std::time::Duration;
use tokio::sync::Mutex;

/// Redis-backed ephemeral store.
///
/// Connections are established lazily through a shared
/// [`redis::aio::ConnectionManager`]; a failed operation drops the manager
/// so the next call reconnects.
pub struct RedisStore {
    client: redis::Client,
    connection: Mutex<Option<redis::aio::ConnectionManager>>,
}

impl RedisStore {
    pub fn new(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
        })
    }
    /// Connects using `REDIS_URL`, defaulting to a local instance.
    pub fn from_env() -> Result<Self, StoreError> {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into());
        Self::new(&url)
    }

    async fn run<T: redis::FromRedisValue>(&self, cmd: &redis::Cmd) -> Result<T, StoreError> {
        let mut guard = self.connection.lock().await;
        if guard.is_none() {
            *guard = Some(self.client.get_connection_manager().await?);
        }
        let conn = guard.as_mut().expect("connection just ensured");
        match cmd.query_async(conn).await {
            Ok(value) => Ok(value),
            Err(e) => {
                log::warn!("redis command failed: {}", e);
                *guard = None;
                Err(e.into())
            }
        }
    }
}

impl Ephemeral for RedisStore {
    async fn zadd(&self, key: &str, member: &str, score: i64) -> Result<bool, StoreError> {
        let added: i64 = self
            .run(redis::cmd("ZADD").arg(key).arg("NX").arg(score).arg(member))
            .await?;
        Ok(added > 0)
    }
    async fn zrem(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let removed: i64 = self.run(redis::cmd("ZREM").arg(key).arg(member)).await?;
        Ok(removed > 0)
    }
    async fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>, StoreError> {
        let score: Option<f64> = self.run(redis::cmd("ZSCORE").arg(key).arg(member)).await?;
        Ok(score.map(|s| s as i64))
    }
    async fn zrange_head(&self, key: &str, limit: usize) -> Result<Vec<String>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.run(
            redis::cmd("ZRANGE")
                .arg(key)
                .arg(0)
                .arg(limit as isize - 1),
        )
        .await
    }
    async fn zrange_upto(&self, key: &str, max_score: i64) -> Result<Vec<String>, StoreError> {
        self.run(
            redis::cmd("ZRANGEBYSCORE")
                .arg(key)
                .arg("-inf")
                .arg(max_score),
        )
        .await
    }
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.run(redis::cmd("GET").arg(key)).await
    }
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.run::<()>(
            redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("EX")
                .arg(ttl.as_secs().max(1)),
        )
        .await
    }
    async fn put_nx(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, StoreError> {
        let reply: Option<String> = self
            .run(
                redis::cmd("SET")
                    .arg(key)
                    .arg(value)
                    .arg("NX")
                    .arg("EX")
                    .arg(ttl.as_secs().max(1)),
            )
            .await?;
        Ok(reply.is_some())
    }
    async fn del(&self, key: &str) -> Result<(), StoreError> {
        self.run::<()>(redis::cmd("DEL").arg(key)).await
    }
}
