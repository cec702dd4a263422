//! Footprint cache entries and input validation.

use alloy_primitives::TxHash;
use serde::{Deserialize, Serialize};

/// Number of hex characters in a 32-byte footprint.
const FOOTPRINT_HEX_LEN: usize = 64;

/// A recorded comparison between the footprints produced by the two execution environments for
/// one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootprintEntry {
    /// Transaction the comparison belongs to.
    pub tx_hash: TxHash,
    /// Footprint reported by the source chain. Empty if it was not computed.
    pub expected_footprint: String,
    /// Footprint computed locally by the EVM. Empty if it was not computed.
    pub actual_footprint: String,
    /// Execution block height the transaction was processed at.
    pub block_number: u64,
    /// Whether the two footprints disagree.
    pub mismatch: bool,
}

/// Returns `true` if `footprint` is empty or a 32-byte hex hash with an optional `0x`/`0X` prefix.
///
/// Anything else is rejected outright so callers cannot push arbitrarily large payloads into the
/// cache.
pub fn is_valid_footprint(footprint: &str) -> bool {
    if footprint.is_empty() {
        return true;
    }

    let hex = strip_hex_prefix(footprint);
    hex.len() == FOOTPRINT_HEX_LEN && hex.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Returns `true` iff both footprints were computed and they disagree.
///
/// The optional `0x` prefix and hex letter case do not count as a difference.
pub fn footprints_mismatch(expected: &str, actual: &str) -> bool {
    if expected.is_empty() || actual.is_empty() {
        return false;
    }
    !strip_hex_prefix(expected).eq_ignore_ascii_case(strip_hex_prefix(actual))
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
}
