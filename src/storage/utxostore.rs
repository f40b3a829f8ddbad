//! UTXO set storage implementation
//!
//! Holds the confirmed unspent output set keyed by outpoint.

use bitcoin::{Block, OutPoint, TxOut};
use std::collections::HashMap;

/// Height given to coins created by transactions that are still in the mempool.
pub const MEMPOOL_HEIGHT: u32 = 0x7FFF_FFFF;

/// One unspent transaction output as recorded in the coin set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coin {
    /// Height of the block that created the output
    pub height: u32,
    pub is_coinbase: bool,
    pub output: TxOut,
}

/// Confirmed UTXO set
#[derive(Debug, Default)]
pub struct UtxoStore {
    utxos: HashMap<OutPoint, Coin>,
}

impl UtxoStore {
    /// Create an empty UTXO set
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an unspent coin
    pub fn get_coin(&self, outpoint: &OutPoint) -> Option<&Coin> {
        self.utxos.get(outpoint)
    }

    pub fn have_coin(&self, outpoint: &OutPoint) -> bool {
        self.utxos.contains_key(outpoint)
    }

    /// Add a coin, replacing any previous entry
    pub fn add_coin(&mut self, outpoint: OutPoint, coin: Coin) {
        self.utxos.insert(outpoint, coin);
    }

    /// Spend a coin, returning it if it was unspent
    pub fn spend_coin(&mut self, outpoint: &OutPoint) -> Option<Coin> {
        self.utxos.remove(outpoint)
    }

    /// Apply a connected block: spend its inputs and add its outputs.
    ///
    /// Unspendable (OP_RETURN) outputs never enter the set.
    pub fn apply_block(&mut self, block: &Block, height: u32) {
        for tx in &block.txdata {
            let is_coinbase = tx.is_coinbase();
            if !is_coinbase {
                for input in &tx.input {
                    self.utxos.remove(&input.previous_output);
                }
            }

            let txid = tx.compute_txid();
            for (vout, output) in tx.output.iter().enumerate() {
                if output.script_pubkey.is_op_return() {
                    continue;
                }
                self.utxos.insert(
                    OutPoint::new(txid, vout as u32),
                    Coin {
                        height,
                        is_coinbase,
                        output: output.clone(),
                    },
                );
            }
        }
    }

    /// Number of unspent outputs
    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }
}
