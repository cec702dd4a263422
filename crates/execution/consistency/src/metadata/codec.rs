//! Durable key layout and fixed-width value encodings for source-chain metadata.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// Key prefix of block-indexed metadata records.
pub const SOURCE_METADATA_PREFIX: &[u8] = b"solana-meta-";

/// Key prefix of transaction-indexed metadata records.
pub const TX_METADATA_PREFIX: &[u8] = b"solana-tx-meta-";

const SLOT_LEN: usize = 8;
const SLOT_ONLY_LEN: usize = SLOT_LEN;
const SLOT_AND_HASH_LEN: usize = SLOT_LEN + B256::len_bytes();
const TX_METADATA_LEN: usize = 16;

/// Source-chain position of an execution block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Source-chain slot.
    pub slot: u64,
    /// Source-chain block hash at `slot`. `None` for records written before hashes were tracked.
    pub hash: Option<B256>,
}

impl SourceMetadata {
    /// Creates a record carrying both slot and hash.
    pub const fn new(slot: u64, hash: B256) -> Self {
        Self { slot, hash: Some(hash) }
    }

    /// Returns the on-disk layout this record encodes to.
    pub const fn version(&self) -> MetadataVersion {
        match self.hash {
            Some(_) => MetadataVersion::SlotAndHash,
            None => MetadataVersion::SlotOnly,
        }
    }

    /// Encodes the record. The value length identifies the layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SLOT_AND_HASH_LEN);
        out.extend_from_slice(&self.slot.to_be_bytes());
        if let Some(hash) = self.hash {
            out.extend_from_slice(hash.as_slice());
        }
        out
    }

    /// Decodes a stored value. Values shorter than a slot are rejected and bytes past the
    /// longest known layout are ignored.
    pub fn decode(data: &[u8]) -> Option<Self> {
        let version = MetadataVersion::from_len(data.len())?;
        let slot = u64::from_be_bytes(data.get(..SLOT_LEN)?.try_into().ok()?);
        let hash = match version {
            MetadataVersion::SlotOnly => None,
            MetadataVersion::SlotAndHash => {
                Some(B256::from_slice(data.get(SLOT_LEN..SLOT_AND_HASH_LEN)?))
            }
        };
        Some(Self { slot, hash })
    }
}

/// Layouts of a block-indexed metadata value, told apart by length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataVersion {
    /// 8-byte big-endian slot. Read-only legacy layout.
    SlotOnly,
    /// 8-byte big-endian slot followed by the 32-byte source hash.
    SlotAndHash,
}

impl MetadataVersion {
    /// Maps an encoded value length to its layout. Lengths below a bare slot have none.
    pub const fn from_len(len: usize) -> Option<Self> {
        if len >= SLOT_AND_HASH_LEN {
            Some(Self::SlotAndHash)
        } else if len >= SLOT_ONLY_LEN {
            Some(Self::SlotOnly)
        } else {
            None
        }
    }

    /// Encoded value length of this layout.
    pub const fn encoded_len(&self) -> usize {
        match self {
            Self::SlotOnly => SLOT_ONLY_LEN,
            Self::SlotAndHash => SLOT_AND_HASH_LEN,
        }
    }
}

/// Source-chain position and timestamp of a single transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxMetadata {
    /// Source-chain slot the transaction landed in.
    pub slot: u64,
    /// Source-chain block time, seconds since the Unix epoch.
    pub timestamp: i64,
}

impl TxMetadata {
    /// Encodes as 8-byte big-endian slot followed by 8-byte big-endian timestamp.
    pub fn encode(&self) -> [u8; TX_METADATA_LEN] {
        let mut out = [0u8; TX_METADATA_LEN];
        out[..8].copy_from_slice(&self.slot.to_be_bytes());
        out[8..].copy_from_slice(&self.timestamp.to_be_bytes());
        out
    }

    /// Decodes a stored value. Short values are rejected and trailing bytes are ignored.
    pub fn decode(data: &[u8]) -> Option<Self> {
        let slot = u64::from_be_bytes(data.get(..8)?.try_into().ok()?);
        let timestamp = i64::from_be_bytes(data.get(8..TX_METADATA_LEN)?.try_into().ok()?);
        Some(Self { slot, timestamp })
    }
}

fn prefixed_key(prefix: &[u8], hash: &B256) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + B256::len_bytes());
    key.extend_from_slice(prefix);
    key.extend_from_slice(hash.as_slice());
    key
}

/// Durable key of the metadata record for execution block `block_hash`.
pub fn source_metadata_key(block_hash: &B256) -> Vec<u8> {
    prefixed_key(SOURCE_METADATA_PREFIX, block_hash)
}

/// Durable key of the metadata record for transaction `tx_hash`.
pub fn tx_metadata_key(tx_hash: &B256) -> Vec<u8> {
    prefixed_key(TX_METADATA_PREFIX, tx_hash)
}
