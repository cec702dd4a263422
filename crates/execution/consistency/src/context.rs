//! Process-wide consistency state, constructed once at startup.

use std::{fs, sync::Arc};

use alloy_primitives::B256;
use tracing::{info, warn};

use crate::{
    ConsistencyConfig, ConsistencyError, FileLedger, FootprintManager, KeyValueStore,
    MemoryLedger, MetadataLookup, SourceMetadata, SourceMetadataStore,
};

/// Owns the [`FootprintManager`] and the [`SourceMetadataStore`].
///
/// Cloning is cheap and every clone shares the same state.
#[derive(Debug)]
pub struct ConsistencyContext<DB> {
    footprints: Arc<FootprintManager>,
    metadata: Arc<SourceMetadataStore<DB>>,
}

impl<DB> Clone for ConsistencyContext<DB> {
    fn clone(&self) -> Self {
        Self { footprints: Arc::clone(&self.footprints), metadata: Arc::clone(&self.metadata) }
    }
}

impl<DB: KeyValueStore> ConsistencyContext<DB> {
    /// Builds the context from `config`, keeping source metadata in `db`.
    ///
    /// The mismatch ledger lives in the configured data directory, which is created if missing.
    /// Without a data directory the ledger only lasts as long as the process.
    pub fn open(config: ConsistencyConfig, db: DB) -> Result<Self, ConsistencyError> {
        let footprints = match &config.data_dir {
            Some(dir) => {
                fs::create_dir_all(dir)
                    .map_err(|source| ConsistencyError::DataDir { path: dir.clone(), source })?;
                FootprintManager::new(config.footprint, FileLedger::in_dir(dir))
            }
            None => {
                warn!(target: "consistency", "No data directory configured, known footprint mismatches will not persist");
                FootprintManager::new(config.footprint, MemoryLedger::new())
            }
        };

        info!(
            target: "consistency",
            data_dir = ?config.data_dir,
            panic_on_mismatch = config.footprint.panic_on_mismatch,
            max_mismatch_entries = config.footprint.max_mismatch_entries,
            metadata_cache_size = config.metadata_cache_size,
            "Initialized consistency context"
        );

        Ok(Self::new(
            Arc::new(footprints),
            Arc::new(SourceMetadataStore::new(db, config.metadata_cache_size)),
        ))
    }

    /// Assembles a context from existing components.
    pub const fn new(
        footprints: Arc<FootprintManager>,
        metadata: Arc<SourceMetadataStore<DB>>,
    ) -> Self {
        Self { footprints, metadata }
    }

    /// Returns the footprint manager.
    pub const fn footprints(&self) -> &Arc<FootprintManager> {
        &self.footprints
    }

    /// Returns the source metadata store.
    pub const fn metadata(&self) -> &Arc<SourceMetadataStore<DB>> {
        &self.metadata
    }
}

impl<DB: KeyValueStore> MetadataLookup for ConsistencyContext<DB> {
    fn source_metadata(&self, block_hash: &B256) -> Option<SourceMetadata> {
        self.metadata.metadata(block_hash)
    }
}
