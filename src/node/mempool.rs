//! Mempool manager
//!
//! Holds pending transactions and the outpoints they spend. The REST
//! service uses it as a coin overlay (outputs of pending transactions) and
//! as a spentness oracle; the node's relay path feeds it.

use anyhow::{bail, Result};
use bitcoin::{Amount, Block, OutPoint, Transaction, Txid};
use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// A pending transaction with its acceptance metadata
#[derive(Debug, Clone)]
pub struct MempoolEntry {
    pub tx: Transaction,
    pub fee: Amount,
    /// Unix time the transaction entered the pool
    pub time: u64,
    /// Chain height when the transaction entered the pool
    pub height: u32,
}

impl MempoolEntry {
    pub fn vsize(&self) -> usize {
        self.tx.vsize()
    }

    pub fn weight(&self) -> u64 {
        self.tx.weight().to_wu()
    }
}

/// Mempool manager
#[derive(Debug, Default)]
pub struct MempoolManager {
    transactions: HashMap<Txid, MempoolEntry>,
    /// Outpoint -> mempool transaction spending it
    spent_outputs: HashMap<OutPoint, Txid>,
    total_vbytes: usize,
}

impl MempoolManager {
    /// Create a new mempool manager
    pub fn new() -> Self {
        Self::default()
    }

    fn current_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }

    /// Accept a transaction into the pool.
    ///
    /// Coinbase transactions, duplicates and transactions that spend an
    /// outpoint already spent by another pending transaction are rejected.
    pub fn add_transaction(&mut self, tx: Transaction, fee: Amount, height: u32) -> Result<Txid> {
        let txid = tx.compute_txid();
        if tx.is_coinbase() {
            bail!("coinbase transaction {} cannot enter the mempool", txid);
        }
        if self.transactions.contains_key(&txid) {
            bail!("transaction {} already in mempool", txid);
        }
        if let Some(conflict) = tx
            .input
            .iter()
            .find_map(|input| self.spent_outputs.get(&input.previous_output))
        {
            bail!("transaction {} conflicts with mempool transaction {}", txid, conflict);
        }

        for input in &tx.input {
            self.spent_outputs.insert(input.previous_output, txid);
        }
        self.total_vbytes += tx.vsize();
        self.transactions.insert(
            txid,
            MempoolEntry {
                tx,
                fee,
                time: Self::current_timestamp(),
                height,
            },
        );
        debug!("Added transaction {} to mempool", txid);
        Ok(txid)
    }

    /// Remove a transaction, releasing the outpoints it spent
    pub fn remove_transaction(&mut self, txid: &Txid) -> Option<MempoolEntry> {
        let entry = self.transactions.remove(txid)?;
        for input in &entry.tx.input {
            if self.spent_outputs.get(&input.previous_output) == Some(txid) {
                self.spent_outputs.remove(&input.previous_output);
            }
        }
        self.total_vbytes = self.total_vbytes.saturating_sub(entry.vsize());
        Some(entry)
    }

    /// Remove a transaction and every in-pool descendant spending its outputs.
    ///
    /// Returns the number of transactions removed.
    pub fn remove_with_descendants(&mut self, txid: &Txid) -> usize {
        let mut pending = vec![*txid];
        let mut removed = 0;
        while let Some(next) = pending.pop() {
            pending.extend(self.spent_by(&next));
            if self.remove_transaction(&next).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Drop transactions confirmed by `block` and any that conflict with it.
    ///
    /// Confirmed transactions leave their children in the pool; conflicting
    /// ones take their descendants with them.
    pub fn remove_for_block(&mut self, block: &Block) {
        for tx in &block.txdata {
            self.remove_transaction(&tx.compute_txid());
            if tx.is_coinbase() {
                continue;
            }
            for input in &tx.input {
                if let Some(conflict) = self.spent_outputs.get(&input.previous_output).copied() {
                    let evicted = self.remove_with_descendants(&conflict);
                    debug!(
                        "Evicted conflicting mempool transaction {} ({} removed)",
                        conflict, evicted
                    );
                }
            }
        }
    }

    pub fn get_transaction(&self, txid: &Txid) -> Option<&Transaction> {
        self.transactions.get(txid).map(|entry| &entry.tx)
    }

    pub fn get_entry(&self, txid: &Txid) -> Option<&MempoolEntry> {
        self.transactions.get(txid)
    }

    /// Whether a pending transaction spends `outpoint`
    pub fn is_spent(&self, outpoint: &OutPoint) -> bool {
        self.spent_outputs.contains_key(outpoint)
    }

    /// In-mempool parents of `txid`
    pub fn depends(&self, txid: &Txid) -> Vec<Txid> {
        let Some(entry) = self.transactions.get(txid) else {
            return Vec::new();
        };
        entry
            .tx
            .input
            .iter()
            .map(|input| input.previous_output.txid)
            .filter(|parent| self.transactions.contains_key(parent))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// In-mempool children spending outputs of `txid`
    pub fn spent_by(&self, txid: &Txid) -> Vec<Txid> {
        let Some(entry) = self.transactions.get(txid) else {
            return Vec::new();
        };
        (0..entry.tx.output.len() as u32)
            .filter_map(|vout| self.spent_outputs.get(&OutPoint::new(*txid, vout)).copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Iterate all pending entries
    pub fn entries(&self) -> impl Iterator<Item = (&Txid, &MempoolEntry)> {
        self.transactions.iter()
    }

    /// Number of pending transactions
    pub fn size(&self) -> usize {
        self.transactions.len()
    }

    /// Sum of virtual sizes of pending transactions
    pub fn bytes(&self) -> usize {
        self.total_vbytes
    }

    /// Approximate heap usage of the pool
    pub fn usage(&self) -> usize {
        let per_entry = std::mem::size_of::<MempoolEntry>() + std::mem::size_of::<Txid>();
        let per_spend = std::mem::size_of::<OutPoint>() + std::mem::size_of::<Txid>();
        self.transactions
            .values()
            .map(|entry| per_entry + entry.tx.total_size())
            .sum::<usize>()
            + self.spent_outputs.len() * per_spend
    }

    /// Sum of fees of pending transactions
    pub fn total_fee(&self) -> Amount {
        self.transactions
            .values()
            .fold(Amount::ZERO, |acc, entry| acc + entry.fee)
    }
}
