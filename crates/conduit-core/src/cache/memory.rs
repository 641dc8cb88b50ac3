//! In-memory cache storage

use super::storage::CacheStorage;
use super::types::{CacheEntry, CacheKey, StorageStatistics};
use crate::error::ConduitResult;
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// In-memory cache storage using an LRU shared by all namespaces
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    cache: Arc<Mutex<LruCache<CacheKey, CacheEntry>>>,
    evictions: Arc<AtomicU64>,
}

impl MemoryStorage {
    /// Create a new memory storage holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
            evictions: Arc::new(AtomicU64::new(0)),
        }
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn get(&self, key: &CacheKey) -> ConduitResult<Option<CacheEntry>> {
        let mut cache = self.cache.lock().await;

        let expired = match cache.get_mut(key) {
            None => return Ok(None),
            Some(entry) if entry.is_expired() => true,
            Some(entry) => {
                entry.mark_accessed();
                return Ok(Some(entry.clone()));
            }
        };

        if expired {
            cache.pop(key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        Ok(None)
    }

    async fn set(&self, key: CacheKey, entry: CacheEntry) -> ConduitResult<()> {
        let mut cache = self.cache.lock().await;
        if let Some((evicted, _)) = cache.push(key.clone(), entry) {
            if evicted != key {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> ConduitResult<()> {
        self.cache.lock().await.pop(key);
        Ok(())
    }

    async fn clear_namespace(&self, namespace: &str) -> ConduitResult<usize> {
        let mut cache = self.cache.lock().await;
        let keys: Vec<CacheKey> = cache
            .iter()
            .filter(|(k, _)| k.namespace == namespace)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &keys {
            cache.pop(key);
        }
        Ok(keys.len())
    }

    async fn statistics(&self, namespace: &str) -> ConduitResult<StorageStatistics> {
        let cache = self.cache.lock().await;
        let (entry_count, size_bytes) = cache
            .iter()
            .filter(|(k, _)| k.namespace == namespace)
            .fold((0usize, 0u64), |(count, size), (_, v)| {
                (count + 1, size + v.size_bytes as u64)
            });
        Ok(StorageStatistics {
            entry_count,
            size_bytes,
            evictions: self.evictions.load(Ordering::Relaxed),
        })
    }

    async fn cleanup_expired(&self) -> ConduitResult<usize> {
        let mut cache = self.cache.lock().await;
        let expired: Vec<CacheKey> = cache
            .iter()
            .filter(|(_, v)| v.is_expired())
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            cache.pop(key);
        }
        self.evictions
            .fetch_add(expired.len() as u64, Ordering::Relaxed);
        Ok(expired.len())
    }
}
