//! Source-chain position of execution blocks and transactions.

mod codec;
pub use codec::{
    MetadataVersion, SOURCE_METADATA_PREFIX, SourceMetadata, TX_METADATA_PREFIX, TxMetadata,
    source_metadata_key, tx_metadata_key,
};

mod cache;
pub use cache::{MetadataStats, SourceMetadataCache};

mod store;
pub use store::SourceMetadataStore;
