//! Block storage implementation
//!
//! Stores full block bodies by hash. Bodies may be discarded (pruned) while
//! their index entries remain.

use bitcoin::{Block, BlockHash};
use std::collections::HashMap;

/// Block body storage
#[derive(Debug, Default)]
pub struct BlockStore {
    blocks: HashMap<BlockHash, Block>,
}

impl BlockStore {
    /// Create a new block store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a block body
    pub fn store_block(&mut self, block: Block) -> BlockHash {
        let hash = block.block_hash();
        self.blocks.insert(hash, block);
        hash
    }

    /// Read a block body
    pub fn get_block(&self, hash: &BlockHash) -> Option<&Block> {
        self.blocks.get(hash)
    }

    /// Whether a body is stored for `hash`
    pub fn has_block(&self, hash: &BlockHash) -> bool {
        self.blocks.contains_key(hash)
    }

    /// Discard a block body, returning whether one was stored
    pub fn remove_block(&mut self, hash: &BlockHash) -> bool {
        self.blocks.remove(hash).is_some()
    }

    /// Number of stored bodies
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
