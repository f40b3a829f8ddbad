//! Layered coin view for UTXO queries.
//!
//! Two levels:
//! - Base: the confirmed UTXO set
//! - Overlay (optional): outputs created by pending mempool transactions
//!
//! A view is built per request from borrowed guards and is dropped with
//! them, so every lookup sees the same chain and mempool state.

use crate::node::mempool::MempoolManager;
use crate::storage::{Coin, UtxoStore, MEMPOOL_HEIGHT};
use bitcoin::OutPoint;

/// Read-only coin lookup
pub trait CoinsView {
    /// Coin for `outpoint`, if the view knows it as unspent
    fn get_coin(&self, outpoint: &OutPoint) -> Option<Coin>;
}

impl CoinsView for UtxoStore {
    fn get_coin(&self, outpoint: &OutPoint) -> Option<Coin> {
        UtxoStore::get_coin(self, outpoint).cloned()
    }
}

/// Mempool overlay over a base view.
///
/// Outputs of a pending transaction are served from the mempool with
/// [`MEMPOOL_HEIGHT`]; everything else falls through to the base.
pub struct MempoolCoinsView<'a, B: CoinsView + ?Sized> {
    base: &'a B,
    mempool: &'a MempoolManager,
}

impl<'a, B: CoinsView + ?Sized> MempoolCoinsView<'a, B> {
    pub fn new(base: &'a B, mempool: &'a MempoolManager) -> Self {
        Self { base, mempool }
    }
}

impl<B: CoinsView + ?Sized> CoinsView for MempoolCoinsView<'_, B> {
    fn get_coin(&self, outpoint: &OutPoint) -> Option<Coin> {
        if let Some(tx) = self.mempool.get_transaction(&outpoint.txid) {
            return tx.output.get(outpoint.vout as usize).map(|output| Coin {
                height: MEMPOOL_HEIGHT,
                is_coinbase: false,
                output: output.clone(),
            });
        }
        self.base.get_coin(outpoint)
    }
}

/// Confirmed set, optionally overlaid with the mempool.
pub struct LayeredCoinsView<'a> {
    confirmed: &'a UtxoStore,
    mempool: &'a MempoolManager,
    include_mempool: bool,
}

impl<'a> LayeredCoinsView<'a> {
    /// Build a view. `include_mempool` switches the overlay on.
    pub fn new(confirmed: &'a UtxoStore, mempool: &'a MempoolManager, include_mempool: bool) -> Self {
        Self {
            confirmed,
            mempool,
            include_mempool,
        }
    }

    /// Coin for `outpoint` if it is unspent and no pending transaction spends it.
    ///
    /// The spentness check applies even with the overlay on: a mempool
    /// output may already be consumed by a later mempool transaction.
    pub fn unspent_coin(&self, outpoint: &OutPoint) -> Option<Coin> {
        if self.mempool.is_spent(outpoint) {
            return None;
        }
        self.get_coin(outpoint)
    }
}

impl CoinsView for LayeredCoinsView<'_> {
    fn get_coin(&self, outpoint: &OutPoint) -> Option<Coin> {
        if self.include_mempool {
            MempoolCoinsView::new(self.confirmed, self.mempool).get_coin(outpoint)
        } else {
            CoinsView::get_coin(self.confirmed, outpoint)
        }
    }
}
