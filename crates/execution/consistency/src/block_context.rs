//! Source-chain fields of the EVM block context.

use std::{fmt, sync::Arc};

use alloy_consensus::{Header, Sealed};
use alloy_primitives::B256;
use tracing::{debug, info, warn};

use crate::{ContextResolver, HeaderLookup, MetadataLookup, SourceOverride};

/// Resolves a source-chain hash from a slot or an execution block number.
pub type SourceHashFn = Arc<dyn Fn(u64) -> Option<B256> + Send + Sync>;

/// Source-chain view handed to the EVM for one block.
#[derive(Clone, Default)]
pub struct SourceBlockContext {
    /// Source-chain slot of the block.
    pub source_slot: Option<u64>,
    /// Source-chain block hash at [`Self::source_slot`].
    pub source_hash: Option<B256>,
    /// Looks up the source hash recorded at a slot.
    pub get_source_hash: Option<SourceHashFn>,
    /// Looks up the source hash recorded for an execution block number.
    pub get_source_hash_by_block: Option<SourceHashFn>,
}

impl fmt::Debug for SourceBlockContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceBlockContext")
            .field("source_slot", &self.source_slot)
            .field("source_hash", &self.source_hash)
            .field("get_source_hash", &self.get_source_hash.is_some())
            .field("get_source_hash_by_block", &self.get_source_hash_by_block.is_some())
            .finish()
    }
}

impl SourceBlockContext {
    /// Builds the context for `header`.
    ///
    /// Without an explicit `source`, the header's own recorded metadata is used. Both lookup
    /// closures share a single [`ContextResolver`] and are only set when a chain is available.
    pub fn new<C>(
        header: Sealed<Header>,
        chain: Option<Arc<C>>,
        source: Option<SourceOverride>,
    ) -> Self
    where
        C: HeaderLookup + MetadataLookup + 'static,
    {
        let Some(chain) = chain else {
            return Self {
                source_slot: source.map(|source| source.slot),
                source_hash: source.map(|source| source.hash),
                ..Default::default()
            };
        };

        let block_hash = header.hash();
        let (source_slot, source_hash) = match source {
            Some(source) => {
                info!(
                    target: "consistency",
                    %block_hash,
                    number = header.number,
                    slot = source.slot,
                    source_hash = %source.hash,
                    "Using provided source metadata"
                );
                (Some(source.slot), Some(source.hash))
            }
            None => match chain.source_metadata(&block_hash) {
                Some(metadata) => {
                    info!(
                        target: "consistency",
                        %block_hash,
                        number = header.number,
                        slot = metadata.slot,
                        source_hash = ?metadata.hash,
                        "Retrieved source metadata from chain"
                    );
                    (Some(metadata.slot), metadata.hash)
                }
                None => {
                    warn!(target: "consistency", %block_hash, number = header.number, "Source metadata not found in chain");
                    (None, None)
                }
            },
        };

        let resolver_source = source_slot
            .zip(source_hash)
            .map(|(slot, hash)| SourceOverride { slot, hash });
        let resolver = Arc::new(ContextResolver::new(header, chain, resolver_source));

        let by_slot = resolver.clone();
        let by_block = resolver;
        let context = Self {
            source_slot,
            source_hash,
            get_source_hash: Some(Arc::new(move |slot| by_slot.resolve_hash_by_slot(slot))),
            get_source_hash_by_block: Some(Arc::new(move |number| {
                by_block.resolve_hash_by_block_number(number)
            })),
        };
        debug!(target: "consistency", %block_hash, ?source_slot, "Built source block context");
        context
    }
}
