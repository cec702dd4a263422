//! Read-through metadata store.

use alloy_primitives::{B256, TxHash};
use tracing::{trace, warn};

use crate::{
    KeyValueStore, KvError, MetadataStats, SourceMetadata, SourceMetadataCache, TxMetadata,
    metrics::SourceMetaMetrics, source_metadata_key, tx_metadata_key,
};

/// Durable source-chain metadata behind an LRU front cache.
///
/// Reads never fail: backend errors and corrupt records are logged and reported as absent.
#[derive(Debug)]
pub struct SourceMetadataStore<DB> {
    db: DB,
    cache: SourceMetadataCache,
    metrics: SourceMetaMetrics,
}

impl<DB: KeyValueStore> SourceMetadataStore<DB> {
    /// Creates a store over `db` with a cache of `cache_size` records.
    pub fn new(db: DB, cache_size: usize) -> Self {
        Self {
            db,
            cache: SourceMetadataCache::new(cache_size),
            metrics: SourceMetaMetrics::default(),
        }
    }

    /// Returns the underlying key-value store.
    pub const fn db(&self) -> &DB {
        &self.db
    }

    /// Returns the front cache.
    pub const fn cache(&self) -> &SourceMetadataCache {
        &self.cache
    }

    /// Records the source-chain slot and hash of execution block `block_hash`.
    ///
    /// The durable write happens first; the cache is only updated once it succeeded.
    pub fn write_metadata(
        &self,
        block_hash: B256,
        slot: u64,
        source_hash: B256,
    ) -> Result<(), KvError> {
        let metadata = SourceMetadata::new(slot, source_hash);
        if let Err(err) = self.db.put(&source_metadata_key(&block_hash), &metadata.encode()) {
            self.metrics.store_errors.increment(1);
            return Err(err);
        }
        self.cache.add(block_hash, metadata);
        Ok(())
    }

    /// Reads the record for `block_hash` from the durable store, bypassing the cache.
    pub fn read_metadata(&self, block_hash: &B256) -> Option<SourceMetadata> {
        let raw = self.read_raw(&source_metadata_key(block_hash))?;
        let decoded = SourceMetadata::decode(&raw);
        if decoded.is_none() {
            self.metrics.corrupt_records.increment(1);
            warn!(
                target: "consistency",
                %block_hash,
                len = raw.len(),
                "Ignoring corrupt source metadata record"
            );
        }
        decoded
    }

    /// Returns the record for `block_hash`, consulting the cache before the durable store.
    ///
    /// Durable hits are added to the cache unless a concurrent [`Self::write_metadata`] already
    /// cached a newer record, in which case that record is returned.
    pub fn metadata(&self, block_hash: &B256) -> Option<SourceMetadata> {
        if let Some(metadata) = self.cache.get(block_hash) {
            self.metrics.cache_hits.increment(1);
            return Some(metadata);
        }
        self.metrics.cache_misses.increment(1);

        let metadata = self.read_metadata(block_hash)?;
        trace!(
            target: "consistency",
            %block_hash,
            slot = metadata.slot,
            "Filled source metadata cache"
        );
        Some(self.cache.insert_if_absent(*block_hash, metadata))
    }

    /// Records the source-chain slot and timestamp of transaction `tx_hash`.
    pub fn write_tx_metadata(
        &self,
        tx_hash: TxHash,
        slot: u64,
        timestamp: i64,
    ) -> Result<(), KvError> {
        let value = TxMetadata { slot, timestamp }.encode();
        self.db.put(&tx_metadata_key(&tx_hash), &value).inspect_err(|_| {
            self.metrics.store_errors.increment(1);
        })
    }

    /// Reads the record for transaction `tx_hash`.
    pub fn read_tx_metadata(&self, tx_hash: &TxHash) -> Option<TxMetadata> {
        let raw = self.read_raw(&tx_metadata_key(tx_hash))?;
        let decoded = TxMetadata::decode(&raw);
        if decoded.is_none() {
            self.metrics.corrupt_records.increment(1);
            warn!(
                target: "consistency",
                %tx_hash,
                len = raw.len(),
                "Ignoring corrupt transaction metadata record"
            );
        }
        decoded
    }

    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> MetadataStats {
        self.cache.stats()
    }

    /// Empties the front cache. Durable records are untouched.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn read_raw(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.db.get(key) {
            Ok(raw) => raw,
            Err(err) => {
                self.metrics.store_errors.increment(1);
                warn!(target: "consistency", error = %err, "Source metadata read failed");
                None
            }
        }
    }
}
