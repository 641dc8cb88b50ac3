//! Cache storage interface

use super::types::{CacheEntry, CacheKey, StorageStatistics};
use crate::error::ConduitResult;
use async_trait::async_trait;

/// A backing store for cache entries.
///
/// Every operation is atomic from the caller's perspective: a `get` racing
/// a `set` for the same key sees either the old entry or the new one.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Get a live entry; expired entries are dropped and reported as absent
    async fn get(&self, key: &CacheKey) -> ConduitResult<Option<CacheEntry>>;

    /// Insert or replace an entry
    async fn set(&self, key: CacheKey, entry: CacheEntry) -> ConduitResult<()>;

    /// Remove an entry
    async fn remove(&self, key: &CacheKey) -> ConduitResult<()>;

    /// Remove every entry of one namespace, returning how many were removed
    async fn clear_namespace(&self, namespace: &str) -> ConduitResult<usize>;

    /// Statistics for one namespace
    async fn statistics(&self, namespace: &str) -> ConduitResult<StorageStatistics>;

    /// Drop expired entries across all namespaces
    async fn cleanup_expired(&self) -> ConduitResult<usize>;
}
