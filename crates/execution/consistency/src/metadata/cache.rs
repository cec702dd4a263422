//! Bounded LRU front cache for source metadata.

use std::{
    num::NonZeroUsize,
    sync::atomic::{AtomicU64, Ordering},
};

use alloy_primitives::B256;
use lru::LruCache;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::SourceMetadata;

/// Point-in-time statistics of the metadata cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataStats {
    /// Maximum number of cached records. Zero means caching is disabled.
    pub capacity: usize,
    /// Number of records currently cached.
    pub len: usize,
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to fall back to the durable store.
    pub misses: u64,
}

/// Strict LRU cache of block hash to [`SourceMetadata`].
///
/// The cache is an optimisation only. Callers must fall back to the durable store on a miss.
#[derive(Debug)]
pub struct SourceMetadataCache {
    /// `None` when constructed with zero capacity.
    entries: Option<RwLock<LruCache<B256, SourceMetadata>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SourceMetadataCache {
    /// Creates a cache holding at most `capacity` records. A capacity of zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| RwLock::new(LruCache::new(cap))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached record and marks it most recently used.
    pub fn get(&self, block_hash: &B256) -> Option<SourceMetadata> {
        let found =
            self.entries.as_ref().and_then(|entries| entries.write().get(block_hash).copied());
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Returns the cached record without touching recency or hit counters.
    pub fn peek(&self, block_hash: &B256) -> Option<SourceMetadata> {
        self.entries.as_ref().and_then(|entries| entries.read().peek(block_hash).copied())
    }

    /// Inserts or updates a record, evicting the least recently used one when full.
    pub fn add(&self, block_hash: B256, metadata: SourceMetadata) {
        if let Some(entries) = &self.entries {
            entries.write().put(block_hash, metadata);
        }
    }

    /// Inserts `metadata` only if `block_hash` is not cached yet and returns the cached record.
    ///
    /// A record added concurrently by [`Self::add`] wins over `metadata`.
    pub fn insert_if_absent(&self, block_hash: B256, metadata: SourceMetadata) -> SourceMetadata {
        match &self.entries {
            Some(entries) => *entries.write().get_or_insert(block_hash, || metadata),
            None => metadata,
        }
    }

    /// Returns `true` if `block_hash` is cached. Recency is not affected.
    pub fn contains(&self, block_hash: &B256) -> bool {
        self.entries.as_ref().is_some_and(|entries| entries.read().contains(block_hash))
    }

    /// Number of cached records.
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.read().len())
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached records.
    pub fn capacity(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.read().cap().get())
    }

    /// Drops every cached record. Hit and miss counters are kept.
    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.write().clear();
        }
    }

    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> MetadataStats {
        MetadataStats {
            capacity: self.capacity(),
            len: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u8) -> B256 {
        B256::repeat_byte(n)
    }

    fn meta(slot: u64) -> SourceMetadata {
        SourceMetadata::new(slot, B256::with_last_byte(slot as u8))
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = SourceMetadataCache::new(3);
        for n in 1..=4u8 {
            cache.add(key(n), meta(n as u64));
        }

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&key(1)), None);
        for n in 2..=4u8 {
            assert_eq!(cache.get(&key(n)), Some(meta(n as u64)));
        }
    }

    #[test]
    fn test_get_protects_from_eviction() {
        let cache = SourceMetadataCache::new(2);
        cache.add(key(1), meta(1));
        cache.add(key(2), meta(2));

        assert!(cache.get(&key(1)).is_some());
        cache.add(key(3), meta(3));

        assert!(cache.contains(&key(1)));
        assert!(!cache.contains(&key(2)));
    }

    #[test]
    fn test_insert_if_absent_keeps_existing() {
        let cache = SourceMetadataCache::new(2);
        cache.add(key(1), meta(2));

        assert_eq!(cache.insert_if_absent(key(1), meta(1)), meta(2));
        assert_eq!(cache.insert_if_absent(key(3), meta(3)), meta(3));
        assert_eq!(cache.peek(&key(1)), Some(meta(2)));

        let disabled = SourceMetadataCache::new(0);
        assert_eq!(disabled.insert_if_absent(key(1), meta(1)), meta(1));
        assert!(disabled.is_empty());
    }

    #[test]
    fn test_peek_does_not_promote() {
        let cache = SourceMetadataCache::new(2);
        cache.add(key(1), meta(1));
        cache.add(key(2), meta(2));

        assert_eq!(cache.peek(&key(1)), Some(meta(1)));
        cache.add(key(3), meta(3));

        assert!(!cache.contains(&key(1)));
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_add_updates_in_place() {
        let cache = SourceMetadataCache::new(2);
        cache.add(key(1), meta(1));
        cache.add(key(2), meta(2));
        cache.add(key(1), meta(10));
        cache.add(key(3), meta(3));

        assert_eq!(cache.peek(&key(1)), Some(meta(10)));
        assert!(!cache.contains(&key(2)));
    }

    #[test]
    fn test_zero_capacity_disables() {
        let cache = SourceMetadataCache::new(0);
        cache.add(key(1), meta(1));

        assert!(cache.is_empty());
        assert_eq!(cache.get(&key(1)), None);
        assert_eq!(cache.stats(), MetadataStats { capacity: 0, len: 0, hits: 0, misses: 1 });
    }

    #[test]
    fn test_stats_and_clear() {
        let cache = SourceMetadataCache::new(4);
        cache.add(key(1), meta(1));
        cache.get(&key(1));
        cache.get(&key(2));
        cache.clear();

        assert_eq!(cache.stats(), MetadataStats { capacity: 4, len: 0, hits: 1, misses: 1 });
    }
}
