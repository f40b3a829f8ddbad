//! JSON views of chain objects
//!
//! Field names follow the node RPC conventions so REST and RPC clients can
//! share parsers.

use crate::node::chain_access::{
    ChainInfoSnapshot, HeaderSnapshot, MempoolEntrySnapshot, MempoolInfoSnapshot,
};
use crate::storage::Coin;
use bitcoin::consensus::encode::serialize;
use bitcoin::{Address, Amount, Block, Network, Script, Transaction};
use serde_json::{json, Map, Value};

/// Chain name as reported to clients
pub fn chain_name(network: Network) -> &'static str {
    match network {
        Network::Bitcoin => "main",
        Network::Testnet => "test",
        Network::Signet => "signet",
        Network::Regtest => "regtest",
        _ => "unknown",
    }
}

fn btc(amount: Amount) -> Value {
    json!(amount.to_btc())
}

fn script_type(script: &Script) -> &'static str {
    if script.is_p2pkh() {
        "pubkeyhash"
    } else if script.is_p2sh() {
        "scripthash"
    } else if script.is_p2wpkh() {
        "witness_v0_keyhash"
    } else if script.is_p2wsh() {
        "witness_v0_scripthash"
    } else if script.is_p2tr() {
        "witness_v1_taproot"
    } else if script.is_p2pk() {
        "pubkey"
    } else if script.is_op_return() {
        "nulldata"
    } else {
        "nonstandard"
    }
}

/// Decoded output script
pub fn script_pubkey_to_json(script: &Script, network: Network) -> Value {
    let mut obj = Map::new();
    obj.insert("asm".into(), json!(script.to_asm_string()));
    obj.insert("hex".into(), json!(script.to_hex_string()));
    obj.insert("type".into(), json!(script_type(script)));
    if let Ok(address) = Address::from_script(script, network) {
        obj.insert("address".into(), json!(address.to_string()));
    }
    Value::Object(obj)
}

/// Coin as reported by getutxos
pub fn coin_to_json(coin: &Coin, network: Network) -> Value {
    json!({
        "height": coin.height as i32,
        "value": btc(coin.output.value),
        "scriptPubKey": script_pubkey_to_json(&coin.output.script_pubkey, network),
    })
}

/// Header with its chain context
pub fn header_to_json(snapshot: &HeaderSnapshot) -> Value {
    let entry = &snapshot.entry;
    let header = &entry.header;
    let version = header.version.to_consensus();

    let mut obj = Map::new();
    obj.insert("hash".into(), json!(entry.hash.to_string()));
    obj.insert("confirmations".into(), json!(snapshot.confirmations));
    obj.insert("height".into(), json!(entry.height));
    obj.insert("version".into(), json!(version));
    obj.insert("versionHex".into(), json!(format!("{:08x}", version as u32)));
    obj.insert("merkleroot".into(), json!(header.merkle_root.to_string()));
    obj.insert("time".into(), json!(header.time));
    obj.insert("mediantime".into(), json!(snapshot.median_time));
    obj.insert("nonce".into(), json!(header.nonce));
    obj.insert("bits".into(), json!(format!("{:08x}", header.bits.to_consensus())));
    obj.insert("difficulty".into(), json!(header.difficulty_float()));
    obj.insert("chainwork".into(), json!(hex::encode(entry.chain_work.to_be_bytes())));
    obj.insert("nTx".into(), json!(entry.n_tx));
    if entry.height > 0 {
        obj.insert("previousblockhash".into(), json!(header.prev_blockhash.to_string()));
    }
    if let Some(next) = snapshot.next_hash {
        obj.insert("nextblockhash".into(), json!(next.to_string()));
    }
    Value::Object(obj)
}

/// Transaction fields without block context
pub fn tx_to_json(tx: &Transaction, network: Network) -> Value {
    let vin: Vec<Value> = tx
        .input
        .iter()
        .map(|input| {
            if tx.is_coinbase() {
                return json!({
                    "coinbase": hex::encode(input.script_sig.as_bytes()),
                    "sequence": input.sequence.0,
                });
            }
            let mut obj = Map::new();
            obj.insert("txid".into(), json!(input.previous_output.txid.to_string()));
            obj.insert("vout".into(), json!(input.previous_output.vout));
            obj.insert(
                "scriptSig".into(),
                json!({
                    "asm": input.script_sig.to_asm_string(),
                    "hex": input.script_sig.to_hex_string(),
                }),
            );
            if !input.witness.is_empty() {
                let witness: Vec<String> = input.witness.iter().map(hex::encode).collect();
                obj.insert("txinwitness".into(), json!(witness));
            }
            obj.insert("sequence".into(), json!(input.sequence.0));
            Value::Object(obj)
        })
        .collect();

    let vout: Vec<Value> = tx
        .output
        .iter()
        .enumerate()
        .map(|(n, output)| {
            json!({
                "value": btc(output.value),
                "n": n,
                "scriptPubKey": script_pubkey_to_json(&output.script_pubkey, network),
            })
        })
        .collect();

    json!({
        "txid": tx.compute_txid().to_string(),
        "hash": tx.compute_wtxid().to_string(),
        "version": tx.version.0,
        "size": tx.total_size(),
        "vsize": tx.vsize(),
        "weight": tx.weight().to_wu(),
        "locktime": tx.lock_time.to_consensus_u32(),
        "vin": vin,
        "vout": vout,
        "hex": hex::encode(serialize(tx)),
    })
}

/// Transaction plus the block that confirmed it, if any
pub fn tx_with_block_to_json(tx: &Transaction, block: Option<&HeaderSnapshot>, network: Network) -> Value {
    let mut value = tx_to_json(tx, network);
    if let (Some(block), Value::Object(obj)) = (block, &mut value) {
        obj.insert("blockhash".into(), json!(block.entry.hash.to_string()));
        obj.insert("confirmations".into(), json!(block.confirmations.max(0)));
        if block.confirmations > 0 {
            obj.insert("time".into(), json!(block.entry.header.time));
            obj.insert("blocktime".into(), json!(block.entry.header.time));
        }
    }
    value
}

/// Block with either full transaction objects or txids only
pub fn block_to_json(block: &Block, snapshot: &HeaderSnapshot, tx_details: bool, network: Network) -> Value {
    let mut value = header_to_json(snapshot);
    let txs: Vec<Value> = if tx_details {
        block.txdata.iter().map(|tx| tx_to_json(tx, network)).collect()
    } else {
        block
            .txdata
            .iter()
            .map(|tx| json!(tx.compute_txid().to_string()))
            .collect()
    };
    if let Value::Object(obj) = &mut value {
        obj.insert("size".into(), json!(block.total_size()));
        obj.insert("strippedsize".into(), json!((block.weight().to_wu() as usize - block.total_size()) / 3));
        obj.insert("weight".into(), json!(block.weight().to_wu()));
        obj.insert("tx".into(), json!(txs));
    }
    value
}

pub fn chain_info_to_json(info: &ChainInfoSnapshot) -> Value {
    let mut obj = Map::new();
    obj.insert("chain".into(), json!(chain_name(info.network)));
    obj.insert("blocks".into(), json!(info.blocks));
    obj.insert("headers".into(), json!(info.headers));
    match &info.tip {
        Some(tip) => {
            obj.insert("bestblockhash".into(), json!(tip.entry.hash.to_string()));
            obj.insert("difficulty".into(), json!(tip.entry.header.difficulty_float()));
            obj.insert("mediantime".into(), json!(tip.median_time));
            obj.insert(
                "chainwork".into(),
                json!(hex::encode(tip.entry.chain_work.to_be_bytes())),
            );
        }
        None => {
            obj.insert("bestblockhash".into(), Value::Null);
        }
    }
    obj.insert("pruned".into(), json!(info.prune_height.is_some()));
    if let Some(height) = info.prune_height {
        obj.insert("pruneheight".into(), json!(height));
    }
    Value::Object(obj)
}

pub fn mempool_info_to_json(info: &MempoolInfoSnapshot) -> Value {
    let min_relay = Amount::from_sat(info.min_relay_fee);
    json!({
        "loaded": true,
        "size": info.size,
        "bytes": info.bytes,
        "usage": info.usage,
        "total_fee": btc(info.total_fee),
        "maxmempool": info.max_mempool,
        "mempoolminfee": btc(min_relay),
        "minrelaytxfee": btc(min_relay),
    })
}

/// Mempool contents keyed by txid
pub fn mempool_contents_to_json(contents: &[MempoolEntrySnapshot]) -> Value {
    let to_strings = |txids: &[bitcoin::Txid]| -> Vec<String> { txids.iter().map(|t| t.to_string()).collect() };
    let obj: Map<String, Value> = contents
        .iter()
        .map(|item| {
            let entry = &item.entry;
            (
                item.txid.to_string(),
                json!({
                    "vsize": entry.vsize(),
                    "weight": entry.weight(),
                    "fee": btc(entry.fee),
                    "time": entry.time,
                    "height": entry.height,
                    "depends": to_strings(&item.depends),
                    "spentby": to_strings(&item.spent_by),
                }),
            )
        })
        .collect();
    Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::blockdata::constants::genesis_block;
    use bitcoin::ScriptBuf;

    #[test]
    fn test_op_return_script() {
        let script = ScriptBuf::from_bytes(vec![0x6a, 0x01, 0x01]);
        let value = script_pubkey_to_json(&script, Network::Regtest);
        assert_eq!(value["type"], "nulldata");
        assert!(value.get("address").is_none());
    }

    #[test]
    fn test_genesis_coinbase_json() {
        let genesis = genesis_block(Network::Regtest);
        let tx = &genesis.txdata[0];
        let value = tx_to_json(tx, Network::Regtest);
        assert_eq!(value["txid"], tx.compute_txid().to_string());
        assert!(value["vin"][0].get("coinbase").is_some());
        assert_eq!(value["vout"][0]["value"], 50.0);
        assert_eq!(value["vout"][0]["scriptPubKey"]["type"], "pubkey");
    }

    #[test]
    fn test_chain_names() {
        assert_eq!(chain_name(Network::Bitcoin), "main");
        assert_eq!(chain_name(Network::Regtest), "regtest");
    }
}
