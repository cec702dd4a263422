#![allow(missing_docs)]

use std::{collections::HashMap, sync::Arc};

use alloy_consensus::{Header, Sealable, Sealed};
use alloy_primitives::B256;
use base_consistency::{
    ConsistencyConfig, ConsistencyContext, HeaderLookup, MAX_SOURCE_HASH_HOPS, MemoryKv,
    MetadataLookup, SourceBlockContext, SourceMetadata, SourceOverride,
};

/// Block-chain component backed by the consistency context for metadata.
#[derive(Debug)]
struct Node {
    headers: HashMap<B256, Sealed<Header>>,
    context: ConsistencyContext<MemoryKv>,
}

impl Node {
    fn new() -> eyre::Result<Self> {
        Ok(Self {
            headers: HashMap::new(),
            context: ConsistencyContext::open(ConsistencyConfig::default(), MemoryKv::new())?,
        })
    }

    /// Imports `len` blocks on top of `parent`, block `n` landing at slot `base_slot + n`.
    fn extend(
        &mut self,
        parent: Option<&Sealed<Header>>,
        len: u64,
        base_slot: u64,
        salt: u8,
    ) -> Vec<Sealed<Header>> {
        let mut tip = parent.cloned();
        let mut imported = Vec::new();
        for _ in 0..len {
            let (number, parent_hash) =
                tip.as_ref().map_or((0, B256::ZERO), |tip| (tip.number + 1, tip.hash()));
            let header = Header {
                number,
                parent_hash,
                extra_data: vec![salt].into(),
                ..Default::default()
            }
            .seal_slow();
            let slot = base_slot + number;
            self.context
                .metadata()
                .write_metadata(header.hash(), slot, source_hash(slot, salt))
                .expect("memory store");
            self.headers.insert(header.hash(), header.clone());
            imported.push(header.clone());
            tip = Some(header);
        }
        imported
    }
}

impl HeaderLookup for Node {
    fn header(&self, hash: B256, number: u64) -> Option<Sealed<Header>> {
        self.headers.get(&hash).filter(|header| header.number == number).cloned()
    }
}

impl MetadataLookup for Node {
    fn source_metadata(&self, block_hash: &B256) -> Option<SourceMetadata> {
        self.context.source_metadata(block_hash)
    }
}

fn source_hash(slot: u64, salt: u8) -> B256 {
    let mut bytes = [salt; 32];
    bytes[24..].copy_from_slice(&slot.to_be_bytes());
    B256::from(bytes)
}

/// Two forks share a prefix; each resolver only sees its own branch.
#[test]
fn test_resolution_follows_fork() -> eyre::Result<()> {
    let mut node = Node::new()?;
    let common = node.extend(None, 10, 1_000, 0);
    let fork_a = node.extend(common.last(), 5, 2_000, 0xa);
    let fork_b = node.extend(common.last(), 5, 3_000, 0xb);

    let node = Arc::new(node);
    let tip_a = fork_a.last().cloned().expect("fork a");
    let tip_b = fork_b.last().cloned().expect("fork b");
    let context_a = SourceBlockContext::new(tip_a, Some(Arc::clone(&node)), None);
    let context_b = SourceBlockContext::new(tip_b, Some(Arc::clone(&node)), None);

    let by_slot_a = context_a.get_source_hash.expect("chain present");
    let by_slot_b = context_b.get_source_hash.expect("chain present");
    let by_block_a = context_a.get_source_hash_by_block.expect("chain present");
    let by_block_b = context_b.get_source_hash_by_block.expect("chain present");

    assert_eq!(context_a.source_slot, Some(2_014));
    assert_eq!(by_slot_a(2_011), Some(source_hash(2_011, 0xa)));
    assert_eq!(by_slot_b(2_011), None);
    assert_eq!(by_slot_b(3_012), Some(source_hash(3_012, 0xb)));

    // The shared prefix resolves identically from both forks.
    assert_eq!(by_slot_a(1_004), Some(source_hash(1_004, 0)));
    assert_eq!(by_slot_b(1_004), Some(source_hash(1_004, 0)));

    assert_eq!(by_block_a(12), Some(source_hash(2_012, 0xa)));
    assert_eq!(by_block_b(12), Some(source_hash(3_012, 0xb)));
    assert_eq!(by_block_a(15), None);
    Ok(())
}

/// A block under construction resolves its own slot before it is written to the store.
#[test]
fn test_pending_block_override() -> eyre::Result<()> {
    let mut node = Node::new()?;
    let chain = node.extend(None, 3, 500, 1);
    let parent = chain.last().expect("parent");
    let pending =
        Header { number: 3, parent_hash: parent.hash(), ..Default::default() }.seal_slow();
    let node = Arc::new(node);

    let source = SourceOverride { slot: 600, hash: B256::repeat_byte(0x66) };
    let context = SourceBlockContext::new(pending, Some(node), Some(source));
    let by_slot = context.get_source_hash.expect("chain present");
    let by_block = context.get_source_hash_by_block.expect("chain present");

    assert_eq!(by_slot(600), Some(B256::repeat_byte(0x66)));
    assert_eq!(by_slot(502), Some(source_hash(502, 1)));
    // The pending block itself has no durable record yet.
    assert_eq!(by_block(3), None);
    assert_eq!(by_block(2), Some(source_hash(502, 1)));
    Ok(())
}

#[test]
fn test_slot_lookup_is_bounded() -> eyre::Result<()> {
    let mut node = Node::new()?;
    let len = MAX_SOURCE_HASH_HOPS as u64 + 20;
    let chain = node.extend(None, len, 0, 2);
    let tip = chain.last().cloned().expect("tip");
    let tip_number = tip.number;
    let node = Arc::new(node);

    let context = SourceBlockContext::new(tip, Some(node), None);
    let by_slot = context.get_source_hash.expect("chain present");
    let by_block = context.get_source_hash_by_block.expect("chain present");

    let oldest_reachable = tip_number - MAX_SOURCE_HASH_HOPS as u64;
    assert_eq!(by_slot(oldest_reachable), Some(source_hash(oldest_reachable, 2)));
    assert_eq!(by_slot(oldest_reachable - 1), None);
    // Block-number lookups are bounded by the chain itself rather than the hop limit.
    assert_eq!(by_block(1), Some(source_hash(1, 2)));
    Ok(())
}
