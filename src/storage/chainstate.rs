//! Block index and active chain
//!
//! Tracks every known block header together with its position on the
//! currently best chain. Lookups never mutate the index; the write path
//! (`add_header`, `set_tip`) is driven by the node's block processing.

use bitcoin::block::Header;
use bitcoin::pow::Work;
use bitcoin::BlockHash;
use std::collections::HashMap;

/// Number of blocks used for median time past.
const MEDIAN_TIME_SPAN: usize = 11;

/// One entry of the block index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockIndexEntry {
    pub hash: BlockHash,
    pub header: Header,
    pub height: u32,
    /// Number of transactions in the block (0 if the body was never seen).
    pub n_tx: u32,
    /// Cumulative work up to and including this block.
    pub chain_work: Work,
    /// Whether the full block body is available in the block store.
    pub have_data: bool,
}

/// Block index plus the active (best) chain.
#[derive(Debug, Default)]
pub struct ChainIndex {
    entries: HashMap<BlockHash, BlockIndexEntry>,
    /// Active chain by height.
    active: Vec<BlockHash>,
}

impl ChainIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an index entry by hash
    pub fn lookup(&self, hash: &BlockHash) -> Option<&BlockIndexEntry> {
        self.entries.get(hash)
    }

    /// Whether the entry lies on the active chain
    pub fn contains(&self, entry: &BlockIndexEntry) -> bool {
        self.active.get(entry.height as usize) == Some(&entry.hash)
    }

    /// Successor of `entry` on the active chain
    pub fn next(&self, entry: &BlockIndexEntry) -> Option<&BlockIndexEntry> {
        if !self.contains(entry) {
            return None;
        }
        self.active
            .get(entry.height as usize + 1)
            .and_then(|hash| self.entries.get(hash))
    }

    /// Entry at `height` on the active chain
    pub fn at_height(&self, height: u32) -> Option<&BlockIndexEntry> {
        self.active
            .get(height as usize)
            .and_then(|hash| self.entries.get(hash))
    }

    /// Tip of the active chain
    pub fn tip(&self) -> Option<&BlockIndexEntry> {
        self.active.last().and_then(|hash| self.entries.get(hash))
    }

    /// Height of the active chain, -1 when empty
    pub fn height(&self) -> i32 {
        self.active.len() as i32 - 1
    }

    /// Number of known headers
    pub fn header_count(&self) -> usize {
        self.entries.len()
    }

    /// Median of the timestamps of the last 11 blocks ending at `entry`
    pub fn median_time_past(&self, entry: &BlockIndexEntry) -> u32 {
        let mut times = Vec::with_capacity(MEDIAN_TIME_SPAN);
        let mut cursor = Some(entry);
        while let Some(current) = cursor {
            if times.len() == MEDIAN_TIME_SPAN {
                break;
            }
            times.push(current.header.time);
            cursor = self.entries.get(&current.header.prev_blockhash);
        }
        times.sort_unstable();
        times[times.len() / 2]
    }

    /// Insert a header, deriving height and chain work from its parent.
    ///
    /// Returns the new entry's hash. Headers whose parent is unknown are
    /// only accepted as the first (genesis) entry.
    pub fn add_header(&mut self, header: Header, n_tx: u32, have_data: bool) -> Option<BlockHash> {
        let hash = header.block_hash();
        if let Some(existing) = self.entries.get_mut(&hash) {
            existing.n_tx = n_tx;
            existing.have_data = have_data;
            return Some(hash);
        }

        let (height, chain_work) = match self.entries.get(&header.prev_blockhash) {
            Some(parent) => (parent.height + 1, parent.chain_work + header.work()),
            None if self.entries.is_empty() => (0, header.work()),
            None => return None,
        };

        self.entries.insert(
            hash,
            BlockIndexEntry {
                hash,
                header,
                height,
                n_tx,
                chain_work,
                have_data,
            },
        );
        Some(hash)
    }

    /// Make `hash` the active tip, rewriting the active chain back to the fork point
    pub fn set_tip(&mut self, hash: &BlockHash) -> bool {
        let Some(tip) = self.entries.get(hash) else {
            return false;
        };

        let mut chain = Vec::with_capacity(tip.height as usize + 1);
        let mut cursor = Some(tip);
        while let Some(entry) = cursor {
            chain.push(entry.hash);
            cursor = self.entries.get(&entry.header.prev_blockhash);
        }
        chain.reverse();
        self.active = chain;
        true
    }

    /// Mark a block body as discarded
    pub fn mark_pruned(&mut self, hash: &BlockHash) -> bool {
        match self.entries.get_mut(hash) {
            Some(entry) => {
                entry.have_data = false;
                true
            }
            None => false,
        }
    }

    /// Lowest active-chain height whose body is still available, if any
    /// block below it has been pruned.
    pub fn prune_height(&self) -> Option<u32> {
        let first_missing = self
            .active
            .iter()
            .filter_map(|hash| self.entries.get(hash))
            .position(|entry| !entry.have_data)?;
        self.active[first_missing..]
            .iter()
            .filter_map(|hash| self.entries.get(hash))
            .find(|entry| entry.have_data)
            .map(|entry| entry.height)
            .or(Some(self.active.len() as u32))
    }
}
