//! An in-memory `CoordinationStore` — expiry is checked lazily on access
//! rather than swept by a background task, which is sufficient for a
//! single-process worker and for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::CoordinationError;
use crate::store::CoordinationStore;

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Default)]
pub struct InMemoryCoordinationStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryCoordinationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CoordinationStore for InMemoryCoordinationStore {
    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, CoordinationError> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());

        let current = entries
            .get(key)
            .filter(|e| !e.is_expired())
            .map(|e| e.value.parse::<u64>())
            .transpose()
            .map_err(|_| CoordinationError::NotACounter(key.to_string()))?
            .unwrap_or(0);

        let next = current + 1;
        entries.insert(
            key.to_string(),
            Entry { value: next.to_string(), expires_at: Instant::now() + ttl },
        );
        Ok(next)
    }

    async fn set_if_not_exist(&self, key: &str, value: String, ttl: Duration) -> Result<bool, CoordinationError> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());

        if entries.get(key).is_some_and(|e| !e.is_expired()) {
            return Ok(false);
        }

        entries.insert(key.to_string(), Entry { value, expires_at: Instant::now() + ttl });
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CoordinationError> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());

        match entries.get(key) {
            Some(e) if e.is_expired() => {
                entries.remove(key);
                Ok(None)
            }
            Some(e) => Ok(Some(e.value.clone())),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CoordinationError> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn increment_counts_up_from_one() {
        let store = InMemoryCoordinationStore::new();
        assert_eq!(store.increment("run:a:join", Duration::from_secs(60)).await.unwrap(), 1);
        assert_eq!(store.increment("run:a:join", Duration::from_secs(60)).await.unwrap(), 2);
        assert_eq!(store.increment("run:a:join", Duration::from_secs(60)).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn set_if_not_exist_only_acquires_once() {
        let store = InMemoryCoordinationStore::new();
        assert!(store.set_if_not_exist("run:a:lock", "w1".into(), Duration::from_secs(60)).await.unwrap());
        assert!(!store.set_if_not_exist("run:a:lock", "w2".into(), Duration::from_secs(60)).await.unwrap());
        assert_eq!(store.get("run:a:lock").await.unwrap(), Some("w1".to_string()));
    }

    #[tokio::test]
    async fn expired_entry_is_treated_as_absent() {
        let store = InMemoryCoordinationStore::new();
        store.set_if_not_exist("k", "v".into(), Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.set_if_not_exist("k", "v2".into(), Duration::from_secs(60)).await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let store = InMemoryCoordinationStore::new();
        store.increment("k", Duration::from_secs(60)).await.unwrap();
        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
