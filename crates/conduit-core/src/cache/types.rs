//! Cache types and data structures

use crate::request::Request;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Cache key: the owning cache's namespace plus the request fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Namespace of the owning cache
    pub namespace: String,
    /// SHA-256 hex digest of the canonical request
    pub digest: String,
}

impl CacheKey {
    pub fn new(namespace: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            digest: digest.into(),
        }
    }

    /// Key for a request within a namespace
    pub fn for_request(namespace: impl Into<String>, request: &Request) -> Self {
        Self::new(namespace, request.fingerprint())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.digest)
    }
}

/// Cache entry containing data and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cached data
    pub data: serde_json::Value,
    /// When the entry was created
    pub created_at: DateTime<Utc>,
    /// When the entry expires (None means no expiration)
    pub expires_at: Option<DateTime<Utc>>,
    /// Size of the serialized data in bytes
    pub size_bytes: usize,
    /// Number of times this entry has been read
    pub access_count: u64,
    /// Last access time
    pub last_accessed: DateTime<Utc>,
}

impl CacheEntry {
    /// Create a new cache entry
    pub fn new(data: serde_json::Value, ttl: Option<Duration>) -> Self {
        let now = Utc::now();
        let expires_at = ttl
            .and_then(|d| chrono::Duration::from_std(d).ok())
            .and_then(|d| now.checked_add_signed(d));
        let size_bytes = data.to_string().len();

        Self {
            data,
            created_at: now,
            expires_at,
            size_bytes,
            access_count: 0,
            last_accessed: now,
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| Utc::now() > expires_at)
    }

    /// Mark the entry as accessed
    pub fn mark_accessed(&mut self) {
        self.access_count += 1;
        self.last_accessed = Utc::now();
    }
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Master switch
    pub enabled: bool,
    /// Namespace of this cache; wiping only touches this namespace
    pub name: String,
    /// Memory cache capacity (number of entries)
    pub memory_capacity: usize,
    /// Persist entries on disk as well
    pub enable_disk_cache: bool,
    /// Disk cache directory; defaults to `~/.conduit/cache`
    pub disk_cache_dir: Option<PathBuf>,
    /// Entry lifetime, unlimited when unset
    #[serde(with = "humantime_serde")]
    pub ttl: Option<Duration>,
    /// Larger responses are not cached
    pub max_entry_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: "default".to_string(),
            memory_capacity: 1000,
            enable_disk_cache: true,
            disk_cache_dir: None,
            ttl: None,
            max_entry_size: 4 * 1024 * 1024,
        }
    }
}

impl CacheConfig {
    /// Effective disk directory
    pub fn resolved_disk_dir(&self) -> PathBuf {
        self.disk_cache_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".conduit")
                .join("cache")
        })
    }
}

/// Storage layer statistics for one namespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStatistics {
    /// Number of entries in storage
    pub entry_count: usize,
    /// Total size in bytes
    pub size_bytes: u64,
    /// Number of evictions
    pub evictions: u64,
}

/// Statistics reported by a response cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub cache_name: String,
    pub total_entries: usize,
    pub total_size_bytes: u64,
    pub uptime_seconds: u64,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total_requests = self.hits + self.misses;
        if total_requests == 0 {
            0.0
        } else {
            self.hits as f64 / total_requests as f64
        }
    }
}
