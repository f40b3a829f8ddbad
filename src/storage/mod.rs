//! Storage layer
//!
//! In-memory chain state owned by the node: the block index with its active
//! chain, block bodies, the confirmed UTXO set and the transaction index.
//! The REST service only ever reads it.

pub mod blockstore;
pub mod chainstate;
pub mod txindex;
pub mod utxostore;

use anyhow::{bail, Result};
use bitcoin::{Block, BlockHash};
use tracing::{debug, info};

pub use blockstore::BlockStore;
pub use chainstate::{BlockIndexEntry, ChainIndex};
pub use txindex::TxIndex;
pub use utxostore::{Coin, UtxoStore, MEMPOOL_HEIGHT};

/// Storage manager that coordinates all storage operations
#[derive(Debug, Default)]
pub struct Storage {
    chain: ChainIndex,
    blockstore: BlockStore,
    utxostore: UtxoStore,
    txindex: TxIndex,
}

impl Storage {
    /// Create empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage seeded with a genesis block
    pub fn with_genesis(genesis: Block) -> Result<Self> {
        let mut storage = Self::new();
        storage.connect_block(genesis)?;
        Ok(storage)
    }

    pub fn chain(&self) -> &ChainIndex {
        &self.chain
    }

    pub fn blocks(&self) -> &BlockStore {
        &self.blockstore
    }

    pub fn utxos(&self) -> &UtxoStore {
        &self.utxostore
    }

    pub fn transactions(&self) -> &TxIndex {
        &self.txindex
    }

    /// Connect a block on top of the active tip and return its height.
    ///
    /// The first block connected becomes genesis; its coinbase output is
    /// not spendable and is not added to the UTXO set.
    pub fn connect_block(&mut self, block: Block) -> Result<u32> {
        let hash = block.block_hash();
        if let Some(tip) = self.chain.tip() {
            if block.header.prev_blockhash != tip.hash {
                bail!(
                    "block {} does not extend the active tip {}",
                    hash,
                    tip.hash
                );
            }
        }

        let n_tx = block.txdata.len() as u32;
        let Some(hash) = self.chain.add_header(block.header, n_tx, true) else {
            bail!("block {} has unknown parent", hash);
        };
        self.chain.set_tip(&hash);

        let height = self.chain.height() as u32;
        if height > 0 {
            self.utxostore.apply_block(&block, height);
        }
        self.txindex.index_block(&block);
        self.blockstore.store_block(block);

        debug!("Connected block {} at height {}", hash, height);
        Ok(height)
    }

    /// Record a header that is not part of the active chain
    pub fn add_side_header(&mut self, header: bitcoin::block::Header) -> Option<BlockHash> {
        self.chain.add_header(header, 0, false)
    }

    /// Discard the body of a known block, keeping its index entry
    pub fn prune_block(&mut self, hash: &BlockHash) -> bool {
        if !self.chain.mark_pruned(hash) {
            return false;
        }
        self.blockstore.remove_block(hash);
        info!("Pruned block data for {}", hash);
        true
    }
}
