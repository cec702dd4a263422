//! Footprint cache and known-mismatch tracking.

use std::collections::{HashMap, HashSet, VecDeque};

use alloy_primitives::TxHash;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{
    FootprintConfig, FootprintEntry, LedgerError, MismatchLedger, footprints_mismatch,
    is_valid_footprint, metrics::FootprintMetrics,
};

/// Point-in-time statistics of a [`FootprintManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootprintStats {
    /// Number of cached comparisons.
    pub cache_size: usize,
    /// Number of cached comparisons flagged as mismatching.
    pub cache_mismatch_count: usize,
    /// Number of known mismatches held in memory.
    pub known_mismatches_count: usize,
    /// Cache eviction age in blocks.
    pub max_cache_age_blocks: u64,
    /// Bound on the known-mismatch ledger.
    pub max_mismatch_entries: u64,
}

/// Outcome of [`FootprintManager::verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FootprintVerdict {
    /// A footprint failed validation; nothing was stored.
    Skipped,
    /// Both environments agree, or at least one footprint was not computed.
    Match,
    /// The footprints disagree but the transaction is already in the ledger.
    KnownMismatch,
    /// A mismatch not seen before. It has been added to the ledger.
    NewMismatch {
        /// Whether the block processor should treat this as fatal.
        fatal: bool,
    },
}

impl FootprintVerdict {
    /// Returns `true` for either mismatch variant.
    pub const fn is_mismatch(&self) -> bool {
        matches!(self, Self::KnownMismatch | Self::NewMismatch { .. })
    }
}

#[derive(Debug, Default)]
struct Inner {
    cache: HashMap<TxHash, FootprintEntry>,
    known: HashSet<TxHash>,
    /// Insertion order of `known`, oldest first.
    order: VecDeque<TxHash>,
}

impl Inner {
    fn replace_known(&mut self, entries: Vec<TxHash>) {
        self.known = entries.iter().copied().collect();
        self.order = entries.into();
    }

    fn push_known(&mut self, tx_hash: TxHash, max_entries: usize) {
        self.known.insert(tx_hash);
        self.order.push_back(tx_hash);
        while self.order.len() > max_entries {
            if let Some(oldest) = self.order.pop_front() {
                self.known.remove(&oldest);
            }
        }
    }
}

/// Owns the per-transaction footprint cache and the bounded ledger of known mismatches.
///
/// A single reader/writer lock guards both. Ledger I/O happens while the write lock is held so
/// ledger writes are serialised across all callers.
#[derive(Debug)]
pub struct FootprintManager {
    inner: RwLock<Inner>,
    ledger: Box<dyn MismatchLedger>,
    config: FootprintConfig,
    metrics: FootprintMetrics,
}

impl FootprintManager {
    /// Creates a manager and loads the known mismatches from `ledger`.
    ///
    /// A ledger holding more than [`FootprintConfig::max_mismatch_entries`] hashes is cut down to
    /// its most recent entries. Load failures are logged and the manager starts empty.
    pub fn new(config: FootprintConfig, ledger: impl MismatchLedger + 'static) -> Self {
        let manager = Self {
            inner: RwLock::new(Inner::default()),
            ledger: Box::new(ledger),
            config,
            metrics: FootprintMetrics::default(),
        };
        manager.load_known_mismatches();
        manager
    }

    fn max_entries(&self) -> usize {
        usize::try_from(self.config.max_mismatch_entries).unwrap_or(usize::MAX)
    }

    fn load_known_mismatches(&self) {
        let mut entries = match self.ledger.load() {
            Ok(entries) => entries,
            Err(err) => {
                warn!(target: "consistency", error = %err, "Failed to load known footprint mismatches");
                return;
            }
        };
        if entries.is_empty() {
            return;
        }

        let loaded = entries.len();
        let max_entries = self.max_entries();
        if loaded > max_entries {
            entries.drain(..loaded - max_entries);
            if let Err(err) = self.ledger.truncate_to_last(max_entries) {
                warn!(target: "consistency", error = %err, "Failed to truncate known footprint mismatches");
            }
        }

        let mut inner = self.inner.write();
        // A hand-edited ledger may repeat hashes; keep the first occurrence.
        let mut seen = HashSet::with_capacity(entries.len());
        entries.retain(|tx_hash| seen.insert(*tx_hash));
        inner.replace_known(entries);
        self.metrics.known_mismatches.set(inner.known.len() as f64);

        info!(target: "consistency", loaded, kept = inner.known.len(), "Loaded known footprint mismatches");
    }

    /// Caches a footprint comparison for `tx_hash`, replacing any previous entry.
    ///
    /// The call is silently dropped if either footprint is neither empty nor a 32-byte hex hash.
    pub fn store(
        &self,
        tx_hash: TxHash,
        expected_footprint: &str,
        actual_footprint: &str,
        block_number: u64,
        mismatch: bool,
    ) {
        if !is_valid_footprint(expected_footprint) || !is_valid_footprint(actual_footprint) {
            self.metrics.rejected.increment(1);
            debug!(target: "consistency", %tx_hash, "Dropping malformed footprint");
            return;
        }

        let entry = FootprintEntry {
            tx_hash,
            expected_footprint: expected_footprint.to_string(),
            actual_footprint: actual_footprint.to_string(),
            block_number,
            mismatch,
        };

        let mut inner = self.inner.write();
        inner.cache.insert(tx_hash, entry);
        self.metrics.stored.increment(1);
        self.metrics.cache_size.set(inner.cache.len() as f64);
    }

    /// Returns the cached comparison for `tx_hash`.
    pub fn get(&self, tx_hash: &TxHash) -> Option<FootprintEntry> {
        self.inner.read().cache.get(tx_hash).cloned()
    }

    /// Removes every entry more than `max_cache_age` blocks behind `current_block_number`.
    ///
    /// Called by the block processor once per new block.
    pub fn evict_old_entries(&self, current_block_number: u64) {
        let max_age = self.config.max_cache_age;
        let mut inner = self.inner.write();
        let before = inner.cache.len();
        inner
            .cache
            .retain(|_, entry| current_block_number.saturating_sub(entry.block_number) <= max_age);

        let evicted = before - inner.cache.len();
        if evicted > 0 {
            self.metrics.evicted.increment(evicted as u64);
            self.metrics.cache_size.set(inner.cache.len() as f64);
            debug!(target: "consistency", evicted, current_block_number, "Evicted old footprint entries");
        }
    }

    /// Drops every cached comparison. The mismatch ledger is untouched.
    pub fn clear_cache(&self) {
        let mut inner = self.inner.write();
        inner.cache.clear();
        self.metrics.cache_size.set(0.0);
        info!(target: "consistency", "Footprint cache cleared");
    }

    /// Returns `true` if `tx_hash` has been recorded as a mismatch.
    pub fn is_known_mismatch(&self, tx_hash: &TxHash) -> bool {
        self.inner.read().known.contains(tx_hash)
    }

    /// Adds `tx_hash` to the known-mismatch ledger.
    ///
    /// Recording an already known hash is a no-op. The in-memory set is updated even when the
    /// ledger write fails, so the error only means the record may not survive a restart.
    pub fn record_mismatch(&self, tx_hash: TxHash) -> Result<(), LedgerError> {
        self.insert_known(tx_hash).map(|_| ())
    }

    /// Records `tx_hash` under a single write lock. Returns `false` if it was already known.
    fn insert_known(&self, tx_hash: TxHash) -> Result<bool, LedgerError> {
        let mut inner = self.inner.write();
        if inner.known.contains(&tx_hash) {
            return Ok(false);
        }

        let max_entries = self.max_entries();
        inner.push_known(tx_hash, max_entries);

        let result = match self.ledger.append_bounded(tx_hash, max_entries) {
            Ok(Some(retained)) => {
                warn!(
                    target: "consistency",
                    max_entries,
                    kept_entries = retained.len(),
                    "Truncated known footprint mismatches"
                );
                inner.replace_known(retained);
                // The ledger is the source of order; make sure the new record survived the cut.
                if !inner.known.contains(&tx_hash) {
                    inner.push_known(tx_hash, max_entries);
                }
                Ok(true)
            }
            Ok(None) => Ok(true),
            Err(err) => {
                self.metrics.ledger_write_errors.increment(1);
                error!(target: "consistency", %tx_hash, error = %err, "Failed to write known footprint mismatches");
                Err(err)
            }
        };

        self.metrics.mismatches_recorded.increment(1);
        self.metrics.known_mismatches.set(inner.known.len() as f64);
        if result.is_ok() {
            info!(target: "consistency", %tx_hash, "Recorded new footprint mismatch");
        }
        result
    }

    /// Compares and caches the footprints for `tx_hash`, recording a new mismatch in the ledger.
    ///
    /// When several callers verify the same new mismatch concurrently, exactly one of them gets
    /// [`FootprintVerdict::NewMismatch`].
    pub fn verify(
        &self,
        tx_hash: TxHash,
        expected_footprint: &str,
        actual_footprint: &str,
        block_number: u64,
    ) -> Result<FootprintVerdict, LedgerError> {
        if !is_valid_footprint(expected_footprint) || !is_valid_footprint(actual_footprint) {
            self.metrics.rejected.increment(1);
            return Ok(FootprintVerdict::Skipped);
        }

        let mismatch = footprints_mismatch(expected_footprint, actual_footprint);
        self.store(tx_hash, expected_footprint, actual_footprint, block_number, mismatch);
        if !mismatch {
            return Ok(FootprintVerdict::Match);
        }

        if self.is_known_mismatch(&tx_hash) || !self.insert_known(tx_hash)? {
            self.metrics.mismatches_known.increment(1);
            debug!(target: "consistency", %tx_hash, block_number, "Known footprint mismatch");
            return Ok(FootprintVerdict::KnownMismatch);
        }

        warn!(
            target: "consistency",
            %tx_hash,
            block_number,
            expected = expected_footprint,
            actual = actual_footprint,
            "Footprint mismatch detected"
        );
        Ok(FootprintVerdict::NewMismatch { fatal: self.should_panic() })
    }

    /// Returns a snapshot of cache and ledger statistics.
    pub fn stats(&self) -> FootprintStats {
        let inner = self.inner.read();
        FootprintStats {
            cache_size: inner.cache.len(),
            cache_mismatch_count: inner.cache.values().filter(|entry| entry.mismatch).count(),
            known_mismatches_count: inner.known.len(),
            max_cache_age_blocks: self.config.max_cache_age,
            max_mismatch_entries: self.config.max_mismatch_entries,
        }
    }

    /// Whether the block processor should treat a newly detected mismatch as fatal.
    pub const fn should_panic(&self) -> bool {
        self.config.panic_on_mismatch
    }

    /// Returns the configuration the manager was built with.
    pub const fn config(&self) -> &FootprintConfig {
        &self.config
    }
}
