//! Node state shared with the REST service
//!
//! `Node` owns the chain storage and the mempool behind read/write locks,
//! plus the warm-up status. The node's own processing mutates it through
//! the write-path methods here; the REST service reads it through
//! [`chain_access::ChainAccess`].

pub mod chain_access;
pub mod coins_view;
pub mod mempool;

use crate::config::MempoolConfig;
use crate::storage::Storage;
use anyhow::{Context, Result};
use bitcoin::blockdata::constants::genesis_block;
use bitcoin::{Amount, Block, BlockHash, Network, Transaction, Txid};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use tracing::info;

use mempool::MempoolManager;

/// Node state
pub struct Node {
    network: Network,
    storage: RwLock<Storage>,
    mempool: RwLock<MempoolManager>,
    mempool_config: MempoolConfig,
    /// Warm-up status text; `None` once the node is ready to serve queries
    warmup: Mutex<Option<String>>,
}

impl Node {
    /// Create a node over existing storage. The node starts in warm-up.
    pub fn new(network: Network, storage: Storage) -> Self {
        Self {
            network,
            storage: RwLock::new(storage),
            mempool: RwLock::new(MempoolManager::new()),
            mempool_config: MempoolConfig::default(),
            warmup: Mutex::new(Some("Loading block index...".to_string())),
        }
    }

    /// Create a node whose chain holds only the network's genesis block
    pub fn with_genesis(network: Network) -> Result<Self> {
        let storage = Storage::with_genesis(genesis_block(network))
            .context("Failed to connect genesis block")?;
        Ok(Self::new(network, storage))
    }

    /// Override the mempool limits reported to clients
    pub fn with_mempool_config(mut self, config: MempoolConfig) -> Self {
        self.mempool_config = config;
        self
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn mempool_config(&self) -> &MempoolConfig {
        &self.mempool_config
    }

    /// Warm-up status text, if still warming up
    pub fn warmup_status(&self) -> Option<String> {
        self.warmup.lock().clone()
    }

    /// Update the warm-up status text shown to clients
    pub fn set_warmup_status(&self, status: impl Into<String>) {
        *self.warmup.lock() = Some(status.into());
    }

    /// Leave warm-up; queries are served from now on
    pub fn set_warmup_finished(&self) {
        if self.warmup.lock().take().is_some() {
            info!("Warm-up finished, chain state is queryable");
        }
    }

    /// Acquire the chain lock, then the mempool lock.
    ///
    /// Every reader that needs both takes them in this order.
    pub(crate) fn read_state(
        &self,
    ) -> (RwLockReadGuard<'_, Storage>, RwLockReadGuard<'_, MempoolManager>) {
        let storage = self.storage.read();
        let mempool = self.mempool.read();
        (storage, mempool)
    }

    pub(crate) fn read_storage(&self) -> RwLockReadGuard<'_, Storage> {
        self.storage.read()
    }

    pub(crate) fn read_mempool(&self) -> RwLockReadGuard<'_, MempoolManager> {
        self.mempool.read()
    }

    /// Connect a block to the active chain and drop its transactions from the mempool
    pub fn connect_block(&self, block: Block) -> Result<u32> {
        let mut storage = self.storage.write();
        let mut mempool = self.mempool.write();
        let height = storage.connect_block(block.clone())?;
        mempool.remove_for_block(&block);
        Ok(height)
    }

    /// Record a header that is not on the active chain
    pub fn add_side_header(&self, header: bitcoin::block::Header) -> Option<BlockHash> {
        self.storage.write().add_side_header(header)
    }

    /// Discard a block body, keeping its index entry
    pub fn prune_block(&self, hash: &BlockHash) -> bool {
        self.storage.write().prune_block(hash)
    }

    /// Accept a transaction into the mempool
    pub fn accept_to_mempool(&self, tx: Transaction, fee: Amount) -> Result<Txid> {
        let storage = self.storage.read();
        let height = storage.chain().height().max(0) as u32;
        self.mempool.write().add_transaction(tx, fee, height)
    }

    /// Remove a transaction from the mempool
    pub fn remove_from_mempool(&self, txid: &Txid) -> bool {
        self.mempool.write().remove_transaction(txid).is_some()
    }
}
