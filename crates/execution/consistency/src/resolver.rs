//! Source-chain hash resolution for a single execution header.
//!
//! Lookups start at the header the resolver is bound to and walk backwards through its ancestors.
//! Both searches are read-only and may be called concurrently.

use std::sync::Arc;

use alloy_consensus::{Header, Sealed};
use alloy_primitives::B256;
use tracing::{debug, trace};

use crate::{KeyValueStore, SourceMetadata, SourceMetadataStore, metrics::SourceMetaMetrics};

/// Maximum number of ancestors visited when searching for a slot.
pub const MAX_SOURCE_HASH_HOPS: usize = 256;

/// Header access provided by the block-chain component.
pub trait HeaderLookup: Send + Sync {
    /// Returns the header with the given hash and number, if known.
    fn header(&self, hash: B256, number: u64) -> Option<Sealed<Header>>;
}

/// Source metadata access keyed by execution block hash.
pub trait MetadataLookup: Send + Sync {
    /// Returns the source-chain position recorded for `block_hash`.
    fn source_metadata(&self, block_hash: &B256) -> Option<SourceMetadata>;
}

impl<DB: KeyValueStore> MetadataLookup for SourceMetadataStore<DB> {
    fn source_metadata(&self, block_hash: &B256) -> Option<SourceMetadata> {
        self.metadata(block_hash)
    }
}

impl<T: MetadataLookup + ?Sized> MetadataLookup for Arc<T> {
    fn source_metadata(&self, block_hash: &B256) -> Option<SourceMetadata> {
        (**self).source_metadata(block_hash)
    }
}

/// Source-chain position of the block under construction.
///
/// A block being built has not been written to the metadata store yet, so its position is handed
/// to the resolver directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceOverride {
    /// Source-chain slot of the block being built.
    pub slot: u64,
    /// Source-chain block hash at `slot`.
    pub hash: B256,
}

/// Why an ancestor walk stopped without finding a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEnd {
    /// Reached a header with number zero or an empty parent hash.
    Genesis,
    /// The parent header could not be retrieved.
    MissingParent,
    /// The lookup returned a parent whose number is not one below its child.
    NumberOutOfRange,
    /// Visited [`MAX_SOURCE_HASH_HOPS`] ancestors.
    HopLimit,
    /// The target block was reached but has no usable metadata, or lies outside the chain.
    NotRecorded,
}

/// Answers source-chain hash queries relative to one execution header.
#[derive(Debug)]
pub struct ContextResolver<C> {
    header: Sealed<Header>,
    chain: Arc<C>,
    source: Option<SourceOverride>,
    metrics: SourceMetaMetrics,
}

impl<C: HeaderLookup + MetadataLookup> ContextResolver<C> {
    /// Binds a resolver to `header`. `source` describes the block under construction, if any.
    pub fn new(header: Sealed<Header>, chain: Arc<C>, source: Option<SourceOverride>) -> Self {
        Self { header, chain, source, metrics: SourceMetaMetrics::default() }
    }

    /// Returns the header this resolver is bound to.
    pub const fn header(&self) -> &Sealed<Header> {
        &self.header
    }

    /// Returns the source-chain hash recorded at `slot` on this header's chain.
    pub fn resolve_hash_by_slot(&self, slot: u64) -> Option<B256> {
        self.search_slot(slot).ok()
    }

    /// Like [`Self::resolve_hash_by_slot`], reporting why the walk ended on a miss.
    pub fn search_slot(&self, slot: u64) -> Result<B256, WalkEnd> {
        if let Some(source) = self.source
            && source.slot == slot
        {
            trace!(target: "consistency", slot, "Source hash found in block under construction");
            return Ok(source.hash);
        }

        if let Some(hash) = matching_hash(self.chain.source_metadata(&self.header.hash()), slot) {
            trace!(target: "consistency", slot, "Source hash found in current header");
            return Ok(hash);
        }

        let mut parent_hash = self.header.parent_hash;
        let mut number = self.header.number;
        let mut hops = 0;
        let end = loop {
            if hops == MAX_SOURCE_HASH_HOPS {
                break WalkEnd::HopLimit;
            }
            if parent_hash.is_zero() || number == 0 {
                break WalkEnd::Genesis;
            }
            let Some(parent) = self.chain.header(parent_hash, number - 1) else {
                break WalkEnd::MissingParent;
            };
            if parent.number != number - 1 {
                break WalkEnd::NumberOutOfRange;
            }
            hops += 1;

            if let Some(hash) = matching_hash(self.chain.source_metadata(&parent.hash()), slot) {
                self.metrics.resolver_walk_depth.record(hops as f64);
                trace!(target: "consistency", slot, hops, parent_number = parent.number, "Source hash found in ancestor");
                return Ok(hash);
            }

            parent_hash = parent.parent_hash;
            number = parent.number;
        };

        self.metrics.resolver_walk_depth.record(hops as f64);
        debug!(
            target: "consistency",
            slot,
            hops,
            ?end,
            header_number = self.header.number,
            "Source hash not found for slot"
        );
        Err(end)
    }

    /// Returns the source-chain hash recorded for the ancestor at execution block `number`.
    pub fn resolve_hash_by_block_number(&self, number: u64) -> Option<B256> {
        self.search_block_number(number).ok()
    }

    /// Like [`Self::resolve_hash_by_block_number`], reporting why the walk ended on a miss.
    pub fn search_block_number(&self, number: u64) -> Result<B256, WalkEnd> {
        if self.header.number.checked_sub(number).is_none() {
            return Err(WalkEnd::NotRecorded);
        }

        let mut current = self.header.clone();
        let mut hops = 0usize;
        let result = loop {
            if current.number == number {
                break self
                    .chain
                    .source_metadata(&current.hash())
                    .and_then(|metadata| metadata.hash)
                    .ok_or(WalkEnd::NotRecorded);
            }
            if current.number < number {
                break Err(WalkEnd::NotRecorded);
            }
            if current.number == 0 || current.parent_hash.is_zero() {
                break Err(WalkEnd::Genesis);
            }
            let Some(parent) = self.chain.header(current.parent_hash, current.number - 1) else {
                break Err(WalkEnd::MissingParent);
            };
            if parent.number >= current.number {
                break Err(WalkEnd::NumberOutOfRange);
            }
            hops += 1;
            current = parent;
        };

        self.metrics.resolver_walk_depth.record(hops as f64);
        if let Err(end) = result {
            debug!(target: "consistency", number, hops, ?end, "Source hash not found for block number");
        }
        result
    }
}

/// Returns the hash of `metadata` if it was recorded at `slot`. Records without a hash never match.
fn matching_hash(metadata: Option<SourceMetadata>, slot: u64) -> Option<B256> {
    metadata.filter(|metadata| metadata.slot == slot).and_then(|metadata| metadata.hash)
}
