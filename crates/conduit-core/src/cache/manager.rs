//! Response cache contract and its layered implementation

use super::disk::DiskStorage;
use super::memory::MemoryStorage;
use super::storage::CacheStorage;
use super::types::{CacheConfig, CacheEntry, CacheKey, CacheStats};
use crate::error::{ConduitError, ConduitResult};
use crate::request::{Request, Response};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Lookup from a request to a previously obtained response.
///
/// A miss is `Ok(None)`, never an error. Errors mean the backing store
/// itself failed, and callers are expected to carry on without the cache.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Namespace this cache reads and writes
    fn name(&self) -> &str;

    /// Deterministic key for a request within this cache's namespace
    fn key_for(&self, request: &Request) -> CacheKey {
        CacheKey::for_request(self.name(), request)
    }

    async fn get(&self, request: &Request) -> ConduitResult<Option<Response>>;

    /// Upsert; the last write for a key wins
    async fn set(&self, request: &Request, response: &Response) -> ConduitResult<()>;

    /// Remove every entry in this cache's namespace only
    async fn wipe(&self) -> ConduitResult<()>;

    async fn cache_stats(&self) -> ConduitResult<CacheStats>;
}

/// Named response cache layering memory over an optional disk store.
///
/// Disk hits are promoted into memory. Entries that no longer deserialize,
/// or whose stored request does not hash back to the key, count as misses.
pub struct ConduitCache {
    name: String,
    memory: Option<Arc<dyn CacheStorage>>,
    disk: Option<Arc<dyn CacheStorage>>,
    ttl: Option<Duration>,
    max_entry_size: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    started: Instant,
}

impl ConduitCache {
    /// Cache over explicit storage layers
    pub fn with_storage(
        name: impl Into<String>,
        memory: Option<Arc<dyn CacheStorage>>,
        disk: Option<Arc<dyn CacheStorage>>,
    ) -> Self {
        Self {
            name: name.into(),
            memory,
            disk,
            ttl: None,
            max_entry_size: CacheConfig::default().max_entry_size,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Memory-only cache
    pub fn in_memory(name: impl Into<String>, capacity: usize) -> Self {
        Self::with_storage(name, Some(Arc::new(MemoryStorage::new(capacity))), None)
    }

    /// Build from configuration
    pub fn from_config(config: &CacheConfig) -> ConduitResult<Self> {
        let memory: Arc<dyn CacheStorage> = Arc::new(MemoryStorage::new(config.memory_capacity));
        let disk: Option<Arc<dyn CacheStorage>> = if config.enable_disk_cache {
            Some(Arc::new(DiskStorage::new(config.resolved_disk_dir())?))
        } else {
            None
        };

        Ok(Self::with_storage(config.name.clone(), Some(memory), disk)
            .with_ttl(config.ttl)
            .with_max_entry_size(config.max_entry_size))
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_entry_size(mut self, max_entry_size: usize) -> Self {
        self.max_entry_size = max_entry_size;
        self
    }

    fn layers(&self) -> impl Iterator<Item = &Arc<dyn CacheStorage>> {
        self.memory.iter().chain(self.disk.iter())
    }

    fn decode(&self, key: &CacheKey, entry: CacheEntry) -> Option<Response> {
        match serde_json::from_value::<Response>(entry.data) {
            Ok(response) if response.request().fingerprint() == key.digest => Some(response),
            Ok(_) => {
                warn!("Cache entry {} does not match its key, ignoring", key);
                None
            }
            Err(e) => {
                warn!("Cache entry {} failed to deserialize: {}", key, e);
                None
            }
        }
    }

    async fn lookup(&self, key: &CacheKey) -> ConduitResult<Option<Response>> {
        if let Some(memory) = &self.memory {
            if let Some(entry) = memory.get(key).await? {
                match self.decode(key, entry) {
                    Some(response) => return Ok(Some(response)),
                    None => memory.remove(key).await?,
                }
            }
        }

        if let Some(disk) = &self.disk {
            if let Some(entry) = disk.get(key).await? {
                let promoted = entry.clone();
                match self.decode(key, entry) {
                    Some(response) => {
                        if let Some(memory) = &self.memory {
                            memory.set(key.clone(), promoted).await?;
                        }
                        return Ok(Some(response));
                    }
                    None => disk.remove(key).await?,
                }
            }
        }

        Ok(None)
    }
}

impl std::fmt::Debug for ConduitCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConduitCache")
            .field("name", &self.name)
            .field("memory", &self.memory.is_some())
            .field("disk", &self.disk.is_some())
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[async_trait]
impl ResponseCache for ConduitCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, request: &Request) -> ConduitResult<Option<Response>> {
        let key = self.key_for(request);
        let found = self.lookup(&key).await?;
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit for {}", key);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("Cache miss for {}", key);
        }
        Ok(found)
    }

    async fn set(&self, request: &Request, response: &Response) -> ConduitResult<()> {
        let key = self.key_for(request);
        if response.request().fingerprint() != key.digest {
            return Err(ConduitError::cache_with_context(
                "response does not answer the request it is cached under",
                key.to_string(),
            ));
        }

        let data = serde_json::to_value(response)
            .map_err(|e| ConduitError::cache(format!("Failed to serialize response: {}", e)))?;
        let entry = CacheEntry::new(data, self.ttl);
        if entry.size_bytes > self.max_entry_size {
            debug!(
                "Skipping cache write for {}: {} bytes exceeds limit",
                key, entry.size_bytes
            );
            return Ok(());
        }

        for layer in self.layers() {
            layer.set(key.clone(), entry.clone()).await?;
        }
        Ok(())
    }

    async fn wipe(&self) -> ConduitResult<()> {
        let mut removed = 0;
        for layer in self.layers() {
            removed += layer.clear_namespace(&self.name).await?;
        }
        debug!("Wiped cache {} ({} entries)", self.name, removed);
        Ok(())
    }

    async fn cache_stats(&self) -> ConduitResult<CacheStats> {
        // Disk holds everything memory holds, so report the outermost layer.
        let authoritative = self.disk.as_ref().or(self.memory.as_ref());
        let (total_entries, total_size_bytes) = match authoritative {
            Some(layer) => {
                let stats = layer.statistics(&self.name).await?;
                (stats.entry_count, stats.size_bytes)
            }
            None => (0, 0),
        };

        Ok(CacheStats {
            cache_name: self.name.clone(),
            total_entries,
            total_size_bytes,
            uptime_seconds: self.started.elapsed().as_secs(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        })
    }
}
