//! Footprint comparison cache and the known-mismatch ledger.

mod entry;
pub use entry::{FootprintEntry, footprints_mismatch, is_valid_footprint};

mod ledger;
pub use ledger::{
    FileLedger, KvLedger, MISMATCH_LEDGER_FILE, MISMATCH_LEDGER_KEY, MemoryLedger, MismatchLedger,
};

mod manager;
pub use manager::{FootprintManager, FootprintStats, FootprintVerdict};
