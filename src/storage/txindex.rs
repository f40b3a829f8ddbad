//! Transaction index implementation
//!
//! Maps confirmed transaction ids to the block that contains them.

use bitcoin::{Block, BlockHash, Txid};
use std::collections::HashMap;

/// Transaction index
#[derive(Debug, Default)]
pub struct TxIndex {
    tx_by_hash: HashMap<Txid, BlockHash>,
}

impl TxIndex {
    /// Create an empty transaction index
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every transaction of `block`
    pub fn index_block(&mut self, block: &Block) {
        let block_hash = block.block_hash();
        for tx in &block.txdata {
            self.tx_by_hash.insert(tx.compute_txid(), block_hash);
        }
    }

    /// Drop the entries of `block` (on disconnect)
    pub fn unindex_block(&mut self, block: &Block) {
        for tx in &block.txdata {
            self.tx_by_hash.remove(&tx.compute_txid());
        }
    }

    /// Block containing `txid`, if indexed
    pub fn get_block_hash(&self, txid: &Txid) -> Option<BlockHash> {
        self.tx_by_hash.get(txid).copied()
    }

    pub fn len(&self) -> usize {
        self.tx_by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx_by_hash.is_empty()
    }
}
