#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/base/node-reth/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod block_context;
pub use block_context::{SourceBlockContext, SourceHashFn};

mod config;
pub use config::{
    ConsistencyArgs, ConsistencyConfig, DEFAULT_MAX_CACHE_AGE, DEFAULT_MAX_MISMATCH_ENTRIES,
    DEFAULT_METADATA_CACHE_SIZE, FOOTPRINT_MAX_MISMATCHES_ENV, FOOTPRINT_PANIC_ENV,
    FootprintConfig,
};

mod context;
pub use context::ConsistencyContext;

mod error;
pub use error::{ConsistencyError, KvError, LedgerError};

mod footprint;
pub use footprint::{
    FileLedger, FootprintEntry, FootprintManager, FootprintStats, FootprintVerdict, KvLedger,
    MISMATCH_LEDGER_FILE, MISMATCH_LEDGER_KEY, MemoryLedger, MismatchLedger, footprints_mismatch,
    is_valid_footprint,
};

mod kv;
pub use kv::{KeyValueStore, MemoryKv};

mod metadata;
pub use metadata::{
    MetadataStats, MetadataVersion, SOURCE_METADATA_PREFIX, SourceMetadata, SourceMetadataCache,
    SourceMetadataStore, TX_METADATA_PREFIX, TxMetadata, source_metadata_key, tx_metadata_key,
};

mod metrics;
pub use metrics::{FootprintMetrics, SourceMetaMetrics};

mod resolver;
pub use resolver::{
    ContextResolver, HeaderLookup, MAX_SOURCE_HASH_HOPS, MetadataLookup, SourceOverride, WalkEnd,
};

mod rpc;
pub use rpc::FootprintApiImpl;

mod traits;
pub use traits::FootprintApiServer;
