use super::Ephemeral;
use super::StoreError;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;
use tokio::sync::Mutex;

#[derive(Default)]
struct Inner {
    // member -> score, per sorted-set key
    zsets: HashMap<String, BTreeMap<String, i64>>,
    // key -> (value, optional expiry)
    kv: HashMap<String, (String, Option<Instant>)>,
}

impl Inner {
    fn expire(&mut self) {
        let now = Instant::now();
        self.kv
            .retain(|_, (_, deadline)| deadline.map_or(true, |d| d > now));
    }
}

/// In-memory ephemeral store with lazy TTL expiry.
///
/// Single-process only; used by unit tests and local development.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Ephemeral for MemoryStore {
    async fn zadd(&self, key: &str, member: &str, score: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        let set = inner.zsets.entry(key.to_string()).or_default();
        if set.contains_key(member) {
            return Ok(false);
        }
        set.insert(member.to_string(), score);
        Ok(true)
    }
    async fn zrem(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        Ok(inner
            .zsets
            .get_mut(key)
            .map_or(false, |set| set.remove(member).is_some()))
    }
    async fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.zsets.get(key).and_then(|set| set.get(member)).copied())
    }
    async fn zrange_head(&self, key: &str, limit: usize) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().await;
        let mut members: Vec<(&String, &i64)> = inner
            .zsets
            .get(key)
            .map(|set| set.iter().collect())
            .unwrap_or_default();
        members.sort_by_key(|(member, score)| (**score, (*member).clone()));
        Ok(members
            .into_iter()
            .take(limit)
            .map(|(member, _)| member.clone())
            .collect())
    }
    async fn zrange_upto(&self, key: &str, max_score: i64) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().await;
        let mut members: Vec<(&String, &i64)> = inner
            .zsets
            .get(key)
            .map(|set| set.iter().filter(|(_, s)| **s <= max_score).collect())
            .unwrap_or_default();
        members.sort_by_key(|(member, score)| (**score, (*member).clone()));
        Ok(members.into_iter().map(|(member, _)| member.clone()).collect())
    }
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.expire();
        Ok(inner.kv.get(key).map(|(value, _)| value.clone()))
    }
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.kv.insert(
            key.to_string(),
            (value.to_string(), Some(Instant::now() + ttl)),
        );
        Ok(())
    }
    async fn put_nx(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.expire();
        if inner.kv.contains_key(key) {
            return Ok(false);
        }
        inner.kv.insert(
            key.to_string(),
            (value.to_string(), Some(Instant::now() + ttl)),
        );
        Ok(true)
    }
    async fn del(&self, key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.kv.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zadd_rejects_duplicates() {
        let store = MemoryStore::new();
        assert!(store.zadd("q", "1", 10).await.unwrap());
        assert!(!store.zadd("q", "1", 20).await.unwrap());
        assert_eq!(store.zscore("q", "1").await.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn zrange_orders_by_score() {
        let store = MemoryStore::new();
        store.zadd("q", "b", 20).await.unwrap();
        store.zadd("q", "a", 10).await.unwrap();
        store.zadd("q", "c", 30).await.unwrap();
        assert_eq!(store.zrange_head("q", 2).await.unwrap(), vec!["a", "b"]);
        assert_eq!(store.zrange_upto("q", 20).await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn put_nx_holds_until_expiry() {
        let store = MemoryStore::new();
        assert!(store.put_nx("lock", "1", Duration::from_secs(60)).await.unwrap());
        assert!(!store.put_nx("lock", "2", Duration::from_secs(60)).await.unwrap());
        store.del("lock").await.unwrap();
        assert!(store.put_nx("lock", "3", Duration::from_secs(60)).await.unwrap());
    }

    #[tokio::test]
    async fn ttl_expires() {
        let store = MemoryStore::new();
        store.put("k", "v", Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
