//! Configuration for the consistency layer.
//!
//! Every toggle is read exactly once, when the configuration is built, so behaviour stays fixed for
//! the lifetime of the process.

use std::{convert::Infallible, path::PathBuf};

use clap::ArgAction;
use tracing::warn;

/// Default bound on the number of known mismatches kept in the ledger.
pub const DEFAULT_MAX_MISMATCH_ENTRIES: u64 = 10_000;

/// Number of blocks a footprint cache entry survives behind the current block.
pub const DEFAULT_MAX_CACHE_AGE: u64 = 12;

/// Default capacity of the source metadata LRU cache. Large enough to hold one full resolver walk.
pub const DEFAULT_METADATA_CACHE_SIZE: usize = 256;

/// Environment toggle that makes new footprint mismatches fatal.
pub const FOOTPRINT_PANIC_ENV: &str = "BASE_NODE_FOOTPRINT_PANIC";

/// Environment override for [`FootprintConfig::max_mismatch_entries`].
pub const FOOTPRINT_MAX_MISMATCHES_ENV: &str = "BASE_NODE_FOOTPRINT_MAX_MISMATCHES";

/// Footprint manager knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FootprintConfig {
    /// Whether a newly detected mismatch should be treated as fatal by the block processor.
    pub panic_on_mismatch: bool,
    /// Maximum number of known mismatches retained in memory and on disk.
    pub max_mismatch_entries: u64,
    /// Cache entries older than this many blocks are evicted.
    pub max_cache_age: u64,
}

impl Default for FootprintConfig {
    fn default() -> Self {
        Self {
            panic_on_mismatch: false,
            max_mismatch_entries: DEFAULT_MAX_MISMATCH_ENTRIES,
            max_cache_age: DEFAULT_MAX_CACHE_AGE,
        }
    }
}

impl FootprintConfig {
    /// Reads [`FOOTPRINT_PANIC_ENV`] and [`FOOTPRINT_MAX_MISMATCHES_ENV`] from the process
    /// environment.
    pub fn from_env() -> Self {
        let panic_on_mismatch =
            std::env::var(FOOTPRINT_PANIC_ENV).is_ok_and(|value| parse_panic_toggle_str(&value));
        let max_mismatch_entries = std::env::var(FOOTPRINT_MAX_MISMATCHES_ENV)
            .map(|value| parse_max_mismatches_str(&value))
            .unwrap_or(DEFAULT_MAX_MISMATCH_ENTRIES);

        Self { panic_on_mismatch, max_mismatch_entries, ..Default::default() }
    }

    /// Sets the fatal-mismatch toggle.
    pub const fn with_panic_on_mismatch(mut self, panic_on_mismatch: bool) -> Self {
        self.panic_on_mismatch = panic_on_mismatch;
        self
    }

    /// Sets the ledger bound. Zero falls back to [`DEFAULT_MAX_MISMATCH_ENTRIES`].
    pub const fn with_max_mismatch_entries(mut self, max_mismatch_entries: u64) -> Self {
        self.max_mismatch_entries = if max_mismatch_entries == 0 {
            DEFAULT_MAX_MISMATCH_ENTRIES
        } else {
            max_mismatch_entries
        };
        self
    }
}

/// Top-level configuration for a [`ConsistencyContext`](crate::ConsistencyContext).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyConfig {
    /// Directory holding the mismatch ledger file. Without one the ledger is kept in memory only.
    pub data_dir: Option<PathBuf>,
    /// Footprint manager knobs.
    pub footprint: FootprintConfig,
    /// Capacity of the source metadata LRU cache.
    pub metadata_cache_size: usize,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            footprint: FootprintConfig::default(),
            metadata_cache_size: DEFAULT_METADATA_CACHE_SIZE,
        }
    }
}

/// Consistency layer CLI flags.
#[derive(Debug, Clone, PartialEq, Eq, clap::Args)]
pub struct ConsistencyArgs {
    /// Directory holding the known footprint mismatch ledger.
    #[arg(long = "datadir", env = "BASE_NODE_DATADIR")]
    pub data_dir: Option<PathBuf>,

    /// Treat newly detected footprint mismatches as fatal (only the literal `true` enables).
    #[arg(
        long = "footprint.panic",
        env = FOOTPRINT_PANIC_ENV,
        default_value = "false",
        value_parser = parse_panic_toggle,
        action = ArgAction::Set
    )]
    pub panic_on_mismatch: bool,

    /// Maximum number of known mismatches kept. Invalid or non-positive values use the default.
    #[arg(
        long = "footprint.max-mismatches",
        env = FOOTPRINT_MAX_MISMATCHES_ENV,
        default_value = "10000",
        value_parser = parse_max_mismatches
    )]
    pub max_mismatch_entries: u64,

    /// Capacity of the source metadata LRU cache (0 disables caching).
    #[arg(
        long = "footprint.metadata-cache-size",
        env = "BASE_NODE_FOOTPRINT_METADATA_CACHE_SIZE",
        default_value_t = DEFAULT_METADATA_CACHE_SIZE
    )]
    pub metadata_cache_size: usize,
}

impl Default for ConsistencyArgs {
    fn default() -> Self {
        Self {
            data_dir: None,
            panic_on_mismatch: false,
            max_mismatch_entries: DEFAULT_MAX_MISMATCH_ENTRIES,
            metadata_cache_size: DEFAULT_METADATA_CACHE_SIZE,
        }
    }
}

impl From<ConsistencyArgs> for ConsistencyConfig {
    fn from(args: ConsistencyArgs) -> Self {
        Self {
            data_dir: args.data_dir,
            footprint: FootprintConfig::default()
                .with_panic_on_mismatch(args.panic_on_mismatch)
                .with_max_mismatch_entries(args.max_mismatch_entries),
            metadata_cache_size: args.metadata_cache_size,
        }
    }
}

fn parse_panic_toggle_str(value: &str) -> bool {
    value == "true"
}

fn parse_max_mismatches_str(value: &str) -> u64 {
    match value.parse::<u64>() {
        Ok(parsed) if parsed > 0 => parsed,
        _ => {
            warn!(
                target: "consistency",
                value,
                default = DEFAULT_MAX_MISMATCH_ENTRIES,
                "Invalid footprint max mismatches value, using default"
            );
            DEFAULT_MAX_MISMATCH_ENTRIES
        }
    }
}

fn parse_panic_toggle(value: &str) -> Result<bool, Infallible> {
    Ok(parse_panic_toggle_str(value))
}

fn parse_max_mismatches(value: &str) -> Result<u64, Infallible> {
    Ok(parse_max_mismatches_str(value))
}
