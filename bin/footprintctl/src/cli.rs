//! Contains the CLI arguments for the footprintctl binary.

use alloy_primitives::TxHash;
use base_consistency::ConsistencyArgs;
use clap::{Parser, Subcommand};
use tracing::Level;

/// Inspect and edit the known footprint mismatch ledger of a node data directory.
#[derive(Debug, Parser)]
#[command(name = "footprintctl", author, version)]
#[command(about = "Inspect and edit the known footprint mismatch ledger")]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) consistency: ConsistencyArgs,

    /// Log level
    #[arg(
        long = "log.level",
        env = "FOOTPRINTCTL_LOG_LEVEL",
        default_value_t = Level::WARN,
        global = true
    )]
    pub(crate) log_level: Level,

    /// Emit logs as JSON
    #[arg(long = "log.json", global = true)]
    pub(crate) log_json: bool,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Subcommands for the footprintctl CLI.
#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Print ledger size and configured bounds as JSON
    Stats,
    /// Report whether a transaction is a known mismatch
    Check {
        /// Transaction hash
        tx_hash: TxHash,
    },
    /// Add a transaction to the ledger, truncating it to the configured bound
    Record {
        /// Transaction hash
        tx_hash: TxHash,
    },
    /// Check that a footprint is empty or a 32-byte hex hash
    Validate {
        /// Footprint string, with or without `0x` prefix
        footprint: String,
    },
}
