//! Traits for the footprint RPC module.

use alloy_primitives::{B256, TxHash};
use jsonrpsee::{core::RpcResult, proc_macros::rpc};

use crate::{FootprintEntry, FootprintStats, MetadataStats, SourceMetadata};

/// Query API over footprint comparisons and source-chain metadata.
#[rpc(server, namespace = "rome")]
pub trait FootprintApi {
    /// Handler for: `rome_getFootprintByHash`
    ///
    /// Returns the cached footprint comparison for a transaction, or `null` once it has been
    /// evicted or was never recorded.
    #[method(name = "getFootprintByHash")]
    async fn get_footprint_by_hash(&self, tx_hash: TxHash) -> RpcResult<Option<FootprintEntry>>;

    /// Handler for: `rome_getFootprintStats`
    #[method(name = "getFootprintStats")]
    async fn get_footprint_stats(&self) -> RpcResult<FootprintStats>;

    /// Handler for: `rome_getSourceMetadata`
    ///
    /// Returns the source-chain slot and hash recorded for an execution block.
    #[method(name = "getSourceMetadata")]
    async fn get_source_metadata(&self, block_hash: B256) -> RpcResult<Option<SourceMetadata>>;

    /// Handler for: `rome_getSourceMetadataStats`
    #[method(name = "getSourceMetadataStats")]
    async fn get_source_metadata_stats(&self) -> RpcResult<MetadataStats>;
}
