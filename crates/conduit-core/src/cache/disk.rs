//! Disk-based cache storage
//!
//! Layout: `<base_dir>/<namespace>/<digest>.json`. Writes go to a
//! temporary file in the same directory and are renamed into place, so a
//! concurrent reader sees either the previous entry or the new one.

use super::storage::CacheStorage;
use super::types::{CacheEntry, CacheKey, StorageStatistics};
use crate::error::{ConduitError, ConduitResult};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Disk-based cache storage
#[derive(Debug, Clone)]
pub struct DiskStorage {
    base_dir: PathBuf,
    evictions: Arc<AtomicU64>,
}

impl DiskStorage {
    /// Create a new disk storage rooted at `base_dir`
    pub fn new(base_dir: impl AsRef<Path>) -> ConduitResult<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir).map_err(|e| {
            ConduitError::cache_with_context(
                format!("Failed to create cache directory: {}", e),
                base_dir.display().to_string(),
            )
        })?;

        Ok(Self {
            base_dir,
            evictions: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.base_dir.join(path_component(namespace))
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.namespace_dir(&key.namespace)
            .join(format!("{}.json", path_component(&key.digest)))
    }

    async fn read_entry(&self, path: &Path) -> ConduitResult<Option<CacheEntry>> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ConduitError::cache_with_context(
                    format!("Failed to read cache file: {}", e),
                    path.display().to_string(),
                ));
            }
        };

        match serde_json::from_str::<CacheEntry>(&content) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!("Discarding corrupted cache entry {:?}: {}", path, e);
                let _ = fs::remove_file(path).await;
                Ok(None)
            }
        }
    }

    async fn entry_files(&self, dir: &Path) -> ConduitResult<Vec<PathBuf>> {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ConduitError::cache(format!("Failed to read cache directory: {}", e))),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

/// Map an identifier onto a single path component, injectively.
///
/// Identifiers made only of `[A-Za-z0-9_-]` are used as is. Anything else
/// becomes `~` plus its SHA-256 hex digest, which no plain identifier can spell.
fn path_component(id: &str) -> String {
    let plain = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if plain {
        id.to_string()
    } else {
        format!("~{:x}", Sha256::digest(id.as_bytes()))
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn get(&self, key: &CacheKey) -> ConduitResult<Option<CacheEntry>> {
        let path = self.entry_path(key);
        match self.read_entry(&path).await? {
            Some(entry) if entry.is_expired() => {
                let _ = fs::remove_file(&path).await;
                self.evictions.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn set(&self, key: CacheKey, entry: CacheEntry) -> ConduitResult<()> {
        let path = self.entry_path(&key);
        let dir = self.namespace_dir(&key.namespace);
        fs::create_dir_all(&dir).await.map_err(|e| {
            ConduitError::cache(format!("Failed to create namespace directory: {}", e))
        })?;

        let content = serde_json::to_string(&entry)
            .map_err(|e| ConduitError::cache(format!("Failed to serialize cache entry: {}", e)))?;

        let tmp = dir.join(format!(".{}.{}.tmp", path_component(&key.digest), Uuid::new_v4()));
        fs::write(&tmp, content)
            .await
            .map_err(|e| ConduitError::cache(format!("Failed to write cache file: {}", e)))?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ConduitError::cache(format!(
                "Failed to move cache file into place: {}",
                e
            )));
        }

        debug!("Stored cache entry {}", key);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> ConduitResult<()> {
        match fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConduitError::cache(format!("Failed to remove cache file: {}", e))),
        }
    }

    async fn clear_namespace(&self, namespace: &str) -> ConduitResult<usize> {
        let dir = self.namespace_dir(namespace);
        let count = self.entry_files(&dir).await?.len();
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ConduitError::cache(format!(
                    "Failed to clear cache namespace {}: {}",
                    namespace, e
                )));
            }
        }
        debug!("Cleared {} disk cache entries from {}", count, namespace);
        Ok(count)
    }

    async fn statistics(&self, namespace: &str) -> ConduitResult<StorageStatistics> {
        let mut stats = StorageStatistics {
            evictions: self.evictions.load(Ordering::Relaxed),
            ..Default::default()
        };
        for path in self.entry_files(&self.namespace_dir(namespace)).await? {
            if let Ok(metadata) = fs::metadata(&path).await {
                stats.entry_count += 1;
                stats.size_bytes += metadata.len();
            }
        }
        Ok(stats)
    }

    async fn cleanup_expired(&self) -> ConduitResult<usize> {
        let mut removed = 0;
        let mut namespaces = match fs::read_dir(&self.base_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        while let Some(namespace) = namespaces.next_entry().await? {
            if !namespace.file_type().await?.is_dir() {
                continue;
            }
            for path in self.entry_files(&namespace.path()).await? {
                if let Some(entry) = self.read_entry(&path).await? {
                    if entry.is_expired() && fs::remove_file(&path).await.is_ok() {
                        removed += 1;
                    }
                }
            }
        }

        self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        Ok(removed)
    }
}
