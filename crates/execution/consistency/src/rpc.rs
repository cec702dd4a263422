//! Implementation of the footprint RPC API.

use alloy_primitives::{B256, TxHash};
use jsonrpsee::core::{RpcResult, async_trait};
use tracing::debug;

use crate::{
    ConsistencyContext, FootprintEntry, FootprintStats, KeyValueStore, MetadataStats,
    SourceMetadata, traits::FootprintApiServer,
};

/// Implementation of the footprint RPC API.
#[derive(Debug)]
pub struct FootprintApiImpl<DB> {
    context: ConsistencyContext<DB>,
}

impl<DB> FootprintApiImpl<DB> {
    /// Creates a new instance serving `context`.
    pub const fn new(context: ConsistencyContext<DB>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl<DB> FootprintApiServer for FootprintApiImpl<DB>
where
    DB: KeyValueStore + 'static,
{
    async fn get_footprint_by_hash(&self, tx_hash: TxHash) -> RpcResult<Option<FootprintEntry>> {
        debug!(target: "consistency", %tx_hash, "rome_getFootprintByHash");
        Ok(self.context.footprints().get(&tx_hash))
    }

    async fn get_footprint_stats(&self) -> RpcResult<FootprintStats> {
        Ok(self.context.footprints().stats())
    }

    async fn get_source_metadata(&self, block_hash: B256) -> RpcResult<Option<SourceMetadata>> {
        debug!(target: "consistency", %block_hash, "rome_getSourceMetadata");
        Ok(self.context.metadata().metadata(&block_hash))
    }

    async fn get_source_metadata_stats(&self) -> RpcResult<MetadataStats> {
        Ok(self.context.metadata().stats())
    }
}
