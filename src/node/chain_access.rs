//! Read-only access to node state for the REST service
//!
//! Every method takes the node locks once, resolves what it needs and
//! returns owned snapshots. Handlers never hold a lock while serializing.

use crate::node::coins_view::LayeredCoinsView;
use crate::node::mempool::MempoolEntry;
use crate::node::Node;
use crate::rpc::errors::RestError;
use crate::storage::{BlockIndexEntry, ChainIndex, Coin};
use bitcoin::hashes::Hash;
use bitcoin::{Amount, Block, BlockHash, Network, OutPoint, Transaction, Txid};
use std::sync::Arc;

/// Index entry plus the chain context needed to describe it
#[derive(Debug, Clone)]
pub struct HeaderSnapshot {
    pub entry: BlockIndexEntry,
    /// Blocks on top of this one plus one; -1 when off the active chain
    pub confirmations: i64,
    pub median_time: u32,
    pub next_hash: Option<BlockHash>,
}

impl HeaderSnapshot {
    fn capture(chain: &ChainIndex, entry: &BlockIndexEntry) -> Self {
        let confirmations = if chain.contains(entry) {
            i64::from(chain.height()) - i64::from(entry.height) + 1
        } else {
            -1
        };
        Self {
            entry: entry.clone(),
            confirmations,
            median_time: chain.median_time_past(entry),
            next_hash: chain.next(entry).map(|next| next.hash),
        }
    }
}

/// Block body with its index snapshot
#[derive(Debug, Clone)]
pub struct BlockSnapshot {
    pub block: Block,
    pub header: HeaderSnapshot,
}

/// A transaction and, if confirmed, the block containing it
#[derive(Debug, Clone)]
pub struct TxSnapshot {
    pub tx: Transaction,
    pub block: Option<HeaderSnapshot>,
}

/// Chain summary
#[derive(Debug, Clone)]
pub struct ChainInfoSnapshot {
    pub network: Network,
    pub blocks: i32,
    pub headers: usize,
    pub tip: Option<HeaderSnapshot>,
    pub prune_height: Option<u32>,
}

/// Mempool summary
#[derive(Debug, Clone)]
pub struct MempoolInfoSnapshot {
    pub size: usize,
    pub bytes: usize,
    pub usage: usize,
    pub total_fee: Amount,
    pub max_mempool: u64,
    /// Fee rate in sat/kvB
    pub min_relay_fee: u64,
}

/// One mempool entry with its in-pool relations
#[derive(Debug, Clone)]
pub struct MempoolEntrySnapshot {
    pub txid: Txid,
    pub entry: MempoolEntry,
    pub depends: Vec<Txid>,
    pub spent_by: Vec<Txid>,
}

/// Coin lookup results captured with the tip they were resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinSnapshot {
    /// Active chain height, -1 when the chain is empty
    pub tip_height: i32,
    pub tip_hash: BlockHash,
    /// One result per requested outpoint, in request order
    pub coins: Vec<Option<Coin>>,
}

/// Chain Snapshot Accessor
#[derive(Clone)]
pub struct ChainAccess {
    node: Arc<Node>,
}

impl ChainAccess {
    pub fn new(node: Arc<Node>) -> Self {
        Self { node }
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    /// Fail with `WarmupUnavailable` while the node is still starting
    pub fn check_warmup(&self) -> Result<(), RestError> {
        match self.node.warmup_status() {
            Some(status) => Err(RestError::WarmupUnavailable(status)),
            None => Ok(()),
        }
    }

    /// Walk the active chain forward from `start`, collecting up to `count` headers.
    ///
    /// Unknown hashes are `NotFound`; a known block off the active chain
    /// yields an empty list.
    pub fn resolve_block_headers(
        &self,
        start: &BlockHash,
        count: usize,
    ) -> Result<Vec<HeaderSnapshot>, RestError> {
        let storage = self.node.read_storage();
        let chain = storage.chain();
        let Some(mut entry) = chain.lookup(start) else {
            return Err(RestError::not_found(format!("{start} not found")));
        };

        let mut headers = Vec::with_capacity(count.min(chain.header_count()));
        while chain.contains(entry) && headers.len() < count {
            headers.push(HeaderSnapshot::capture(chain, entry));
            match chain.next(entry) {
                Some(next) => entry = next,
                None => break,
            }
        }
        Ok(headers)
    }

    /// Block body for `hash`, distinguishing unknown from pruned
    pub fn resolve_block(&self, hash: &BlockHash) -> Result<BlockSnapshot, RestError> {
        let storage = self.node.read_storage();
        let chain = storage.chain();
        let Some(entry) = chain.lookup(hash) else {
            return Err(RestError::not_found(format!("{hash} not found")));
        };
        if !entry.have_data && entry.n_tx > 0 {
            return Err(RestError::NotAvailable(hash.to_string()));
        }
        let Some(block) = storage.blocks().get_block(hash) else {
            return Err(RestError::not_found(format!("{hash} not found")));
        };
        Ok(BlockSnapshot {
            block: block.clone(),
            header: HeaderSnapshot::capture(chain, entry),
        })
    }

    /// Transaction by id: the mempool first, then the transaction index
    pub fn lookup_transaction(&self, txid: &Txid) -> Result<TxSnapshot, RestError> {
        let (storage, mempool) = self.node.read_state();
        if let Some(tx) = mempool.get_transaction(txid) {
            return Ok(TxSnapshot {
                tx: tx.clone(),
                block: None,
            });
        }

        let not_found = || RestError::not_found(format!("{txid} not found"));
        let block_hash = storage.transactions().get_block_hash(txid).ok_or_else(not_found)?;
        let block = storage.blocks().get_block(&block_hash).ok_or_else(not_found)?;
        let tx = block
            .txdata
            .iter()
            .find(|tx| tx.compute_txid() == *txid)
            .ok_or_else(not_found)?;
        let header = storage
            .chain()
            .lookup(&block_hash)
            .map(|entry| HeaderSnapshot::capture(storage.chain(), entry));
        Ok(TxSnapshot {
            tx: tx.clone(),
            block: header,
        })
    }

    pub fn chain_info(&self) -> ChainInfoSnapshot {
        let storage = self.node.read_storage();
        let chain = storage.chain();
        ChainInfoSnapshot {
            network: self.node.network(),
            blocks: chain.height(),
            headers: chain.header_count(),
            tip: chain.tip().map(|tip| HeaderSnapshot::capture(chain, tip)),
            prune_height: chain.prune_height(),
        }
    }

    pub fn mempool_info(&self) -> MempoolInfoSnapshot {
        let mempool = self.node.read_mempool();
        let config = self.node.mempool_config();
        MempoolInfoSnapshot {
            size: mempool.size(),
            bytes: mempool.bytes(),
            usage: mempool.usage(),
            total_fee: mempool.total_fee(),
            max_mempool: config.max_mempool_bytes,
            min_relay_fee: config.min_relay_fee_sat_per_kvb,
        }
    }

    /// Every mempool entry, ordered by txid
    pub fn mempool_contents(&self) -> Vec<MempoolEntrySnapshot> {
        let mempool = self.node.read_mempool();
        let mut contents: Vec<_> = mempool
            .entries()
            .map(|(txid, entry)| MempoolEntrySnapshot {
                txid: *txid,
                entry: entry.clone(),
                depends: mempool.depends(txid),
                spent_by: mempool.spent_by(txid),
            })
            .collect();
        contents.sort_by(|a, b| a.txid.cmp(&b.txid));
        contents
    }

    /// Resolve `outpoints` against the coin set and capture the tip, all
    /// under one critical section over chain and mempool.
    pub fn lookup_coins(&self, check_mempool: bool, outpoints: &[OutPoint]) -> CoinSnapshot {
        let (storage, mempool) = self.node.read_state();
        let view = LayeredCoinsView::new(storage.utxos(), &mempool, check_mempool);
        let coins = outpoints.iter().map(|op| view.unspent_coin(op)).collect();

        let chain = storage.chain();
        CoinSnapshot {
            tip_height: chain.height(),
            tip_hash: chain.tip().map(|tip| tip.hash).unwrap_or_else(BlockHash::all_zeros),
            coins,
        }
    }
}
