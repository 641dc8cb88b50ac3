//! Response caching
//!
//! [`ResponseCache`] is the contract the orchestrator consumes: a named,
//! namespace-scoped lookup from a [`Request`](crate::request::Request) to
//! the [`Response`](crate::request::Response) it produced. [`ConduitCache`]
//! implements it on top of pluggable [`CacheStorage`] layers (an in-memory
//! LRU and an optional on-disk store).
//!
//! Caching never changes behavior: a cold or disabled cache only costs
//! latency, and the cache is never the system of record for conversations.

mod disk;
mod manager;
mod memory;
mod storage;
mod types;

pub use disk::DiskStorage;
pub use manager::{ConduitCache, ResponseCache};
pub use memory::MemoryStorage;
pub use storage::CacheStorage;
pub use types::{CacheConfig, CacheEntry, CacheKey, CacheStats, StorageStatistics};

#[cfg(test)]
mod tests;
