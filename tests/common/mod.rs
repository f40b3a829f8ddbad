//! Shared chain builder for integration tests

#![allow(dead_code)]

use bitcoin::absolute::LockTime;
use bitcoin::block::{Header, Version as BlockVersion};
use bitcoin::hashes::Hash;
use bitcoin::transaction::Version;
use bitcoin::{
    Amount, Block, BlockHash, CompactTarget, OutPoint, ScriptBuf, Sequence, Transaction, TxIn,
    TxMerkleNode, TxOut, Txid, WPubkeyHash, Witness,
};
use chain_rest::node::chain_access::ChainAccess;
use chain_rest::{Node, RestRequest, RestResponse, RestServer};
use hyper::Method;
use std::sync::Arc;

pub const SUBSIDY_SAT: u64 = 5_000_000_000;

/// A regtest node past warm-up, holding only genesis
pub fn regtest_node() -> Arc<Node> {
    let node = Node::with_genesis(bitcoin::Network::Regtest).unwrap();
    node.set_warmup_finished();
    Arc::new(node)
}

/// A server over `node` with every route registered
pub fn rest_server(node: Arc<Node>) -> RestServer {
    let server = RestServer::new("127.0.0.1:0".parse().unwrap(), node);
    server.register_routes();
    server
}

pub fn get(server: &RestServer, path: &str) -> RestResponse {
    server.handle(RestRequest::get(path))
}

pub fn post(server: &RestServer, path: &str, body: impl Into<bytes::Bytes>) -> RestResponse {
    server.handle(RestRequest::new(Method::POST, path, body))
}

/// Pay-to-witness-pubkey-hash script with a recognisable hash
pub fn p2wpkh(tag: u8) -> ScriptBuf {
    ScriptBuf::new_p2wpkh(&WPubkeyHash::from_byte_array([tag; 20]))
}

/// Coinbase unique per height
pub fn coinbase(height: u32, value_sat: u64) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::null(),
            script_sig: ScriptBuf::from_bytes(height.to_le_bytes().to_vec()),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value: Amount::from_sat(value_sat),
            script_pubkey: p2wpkh(height as u8),
        }],
    }
}

/// One-input transaction paying `values` to fresh outputs
pub fn spend(prev: OutPoint, values: &[u64]) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: prev,
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: values
            .iter()
            .enumerate()
            .map(|(i, value)| TxOut {
                value: Amount::from_sat(*value),
                script_pubkey: p2wpkh(0xa0 + i as u8),
            })
            .collect(),
    }
}

/// Build a block on `prev` without connecting it
pub fn build_block(prev: &Header, prev_height: u32, mut txs: Vec<Transaction>, nonce: u32) -> Block {
    let height = prev_height + 1;
    txs.insert(0, coinbase(height, SUBSIDY_SAT));
    let mut block = Block {
        header: Header {
            version: BlockVersion::TWO,
            prev_blockhash: prev.block_hash(),
            merkle_root: TxMerkleNode::all_zeros(),
            time: prev.time + 600,
            bits: CompactTarget::from_consensus(0x207fffff),
            nonce,
        },
        txdata: txs,
    };
    if let Some(root) = block.compute_merkle_root() {
        block.header.merkle_root = root;
    }
    block
}

/// Mine a block with `txs` on the active tip and return it
pub fn mine(node: &Arc<Node>, txs: Vec<Transaction>) -> Block {
    let tip = ChainAccess::new(node.clone()).chain_info().tip.unwrap();
    let block = build_block(&tip.entry.header, tip.entry.height, txs, 0);
    node.connect_block(block.clone()).unwrap();
    block
}

/// Mine `count` empty blocks, returning their hashes
pub fn mine_empty(node: &Arc<Node>, count: usize) -> Vec<BlockHash> {
    (0..count).map(|_| mine(node, Vec::new()).block_hash()).collect()
}

pub fn genesis_hash() -> BlockHash {
    bitcoin::blockdata::constants::genesis_block(bitcoin::Network::Regtest).block_hash()
}

pub fn coinbase_txid(block: &Block) -> Txid {
    block.txdata[0].compute_txid()
}

pub fn json_body(response: &RestResponse) -> serde_json::Value {
    serde_json::from_slice(&response.body).unwrap()
}
