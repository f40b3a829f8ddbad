//! getutxos endpoint tests
//!
//! Covers URI and body input, the hit bitmap, mempool semantics and the
//! binary wire layout.

mod common;

use bitcoin::hashes::Hash;
use bitcoin::{Amount, OutPoint, Txid};
use chain_rest::rpc::rest::utxos::{UtxoRequest, MAX_GETUTXOS_OUTPOINTS};
use chain_rest::storage::MEMPOOL_HEIGHT;
use common::*;
use hyper::StatusCode;

fn uri(check_mempool: bool, outpoints: &[OutPoint], ext: &str) -> String {
    let mut path = String::from("/rest/getutxos");
    if check_mempool {
        path.push_str("/checkmempool");
    }
    for op in outpoints {
        path.push_str(&format!("/{}-{}", op.txid, op.vout));
    }
    path.push('.');
    path.push_str(ext);
    path
}

fn body(check_mempool: bool, outpoints: &[OutPoint]) -> Vec<u8> {
    UtxoRequest {
        check_mempool,
        outpoints: outpoints.to_vec(),
    }
    .to_bytes()
}

fn unknown(n: u8) -> OutPoint {
    OutPoint::new(Txid::from_byte_array([n; 32]), 0)
}

/// Bitmap bytes from a binary response (bitmap length fits in one byte)
fn bitmap_of(binary: &[u8]) -> Vec<u8> {
    let len = binary[36] as usize;
    binary[37..37 + len].to_vec()
}

#[test]
fn test_confirmed_coin_with_checkmempool_json() {
    let node = regtest_node();
    let block = mine(&node, Vec::new());
    let server = rest_server(node);

    let op = OutPoint::new(coinbase_txid(&block), 0);
    let response = get(&server, &uri(true, &[op], "json"));
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.content_type, "application/json");
    assert!(response.text().ends_with('\n'));

    let json = json_body(&response);
    assert_eq!(json["bitmap"], "1");
    assert_eq!(json["chainHeight"], 1);
    assert_eq!(json["chaintipHash"], block.block_hash().to_string());
    let utxos = json["utxos"].as_array().unwrap();
    assert_eq!(utxos.len(), 1);
    assert_eq!(utxos[0]["height"], 1);
    assert_eq!(utxos[0]["value"], 50.0);
    assert_eq!(utxos[0]["scriptPubKey"]["type"], "witness_v0_keyhash");
    assert!(utxos[0]["scriptPubKey"]["address"].as_str().unwrap().starts_with("bcrt1"));
}

#[test]
fn test_bitmap_size_and_bits_for_every_count() {
    let node = regtest_node();
    let known: Vec<OutPoint> = (0..8)
        .map(|_| OutPoint::new(coinbase_txid(&mine(&node, Vec::new())), 0))
        .collect();
    let server = rest_server(node);

    for n in 0..=MAX_GETUTXOS_OUTPOINTS {
        // Even positions are known coins, odd positions unknown
        let outpoints: Vec<OutPoint> = (0..n)
            .map(|i| if i % 2 == 0 { known[i / 2] } else { unknown(i as u8) })
            .collect();
        let response = post(&server, "/rest/getutxos.bin", body(false, &outpoints));
        assert_eq!(response.status, StatusCode::OK, "n = {n}");

        let bitmap = bitmap_of(&response.body);
        assert_eq!(bitmap.len(), n.div_ceil(8), "n = {n}");
        for i in 0..n {
            let bit = bitmap[i / 8] >> (i % 8) & 1;
            assert_eq!(bit == 1, i % 2 == 0, "n = {n}, i = {i}");
        }
    }
}

#[test]
fn test_hits_do_not_depend_on_query_order() {
    let node = regtest_node();
    let a = OutPoint::new(coinbase_txid(&mine(&node, Vec::new())), 0);
    let server = rest_server(node);

    let forward = json_body(&get(&server, &uri(false, &[a, unknown(1)], "json")));
    let backward = json_body(&get(&server, &uri(false, &[unknown(1), a], "json")));
    assert_eq!(forward["bitmap"], "10");
    assert_eq!(backward["bitmap"], "01");
}

#[test]
fn test_path_and_body_input_give_identical_responses() {
    let node = regtest_node();
    let a = OutPoint::new(coinbase_txid(&mine(&node, Vec::new())), 0);
    let b = OutPoint::new(coinbase_txid(&mine(&node, Vec::new())), 0);
    let server = rest_server(node);
    let outpoints = [a, unknown(7), b];

    for check_mempool in [false, true] {
        let from_path = get(&server, &uri(check_mempool, &outpoints, "bin"));
        let from_body = post(&server, "/rest/getutxos.bin", body(check_mempool, &outpoints));
        assert_eq!(from_path.status, StatusCode::OK);
        assert_eq!(from_path, from_body);

        let hex_body = hex::encode(body(check_mempool, &outpoints));
        let from_hex_path = get(&server, &uri(check_mempool, &outpoints, "hex"));
        let from_hex_body = post(&server, "/rest/getutxos.hex", hex_body);
        assert_eq!(from_hex_path, from_hex_body);
        assert_eq!(from_hex_path.text(), format!("{}\n", hex::encode(&from_path.body)));
    }
}

#[test]
fn test_repeated_queries_are_identical() {
    let node = regtest_node();
    let a = OutPoint::new(coinbase_txid(&mine(&node, Vec::new())), 0);
    let server = rest_server(node);

    let path = uri(true, &[a, unknown(3)], "json");
    assert_eq!(get(&server, &path), get(&server, &path));
}

#[test]
fn test_binary_response_layout() {
    let node = regtest_node();
    let block = mine(&node, Vec::new());
    let server = rest_server(node);

    let op = OutPoint::new(coinbase_txid(&block), 0);
    let response = get(&server, &uri(false, &[op], "bin"));
    assert_eq!(response.content_type, "application/octet-stream");
    let bytes = response.body.to_vec();

    assert_eq!(&bytes[0..4], &1i32.to_le_bytes());
    assert_eq!(&bytes[4..36], block.block_hash().as_byte_array());
    assert_eq!(&bytes[36..38], &[1, 1]);
    assert_eq!(bytes[38], 1);
    // Version placeholder, height, value, script
    assert_eq!(&bytes[39..43], &0u32.to_le_bytes());
    assert_eq!(&bytes[43..47], &1u32.to_le_bytes());
    assert_eq!(&bytes[47..55], &SUBSIDY_SAT.to_le_bytes());
    let script = p2wpkh(1);
    assert_eq!(bytes[55] as usize, script.len());
    assert_eq!(&bytes[56..], script.as_bytes());
}

#[test]
fn test_outpoint_limit() {
    let server = rest_server(regtest_node());

    let fifteen: Vec<OutPoint> = (0..15).map(unknown).collect();
    let response = get(&server, &uri(false, &fifteen, "json"));
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(json_body(&response)["bitmap"], "0".repeat(15));

    let sixteen: Vec<OutPoint> = (0..16).map(unknown).collect();
    for response in [
        get(&server, &uri(false, &sixteen, "json")),
        post(&server, "/rest/getutxos.bin", body(false, &sixteen)),
    ] {
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.text(),
            "Error: max outpoints exceeded (max: 15, tried: 16)\r\n"
        );
    }
}

#[test]
fn test_combined_input_rejected_for_every_format() {
    let server = rest_server(regtest_node());
    let outpoints = [unknown(1)];
    let raw = body(false, &outpoints);

    for (ext, payload) in [
        ("bin", raw.clone()),
        ("hex", hex::encode(&raw).into_bytes()),
        ("json", raw.clone()),
    ] {
        let response = post(&server, &uri(false, &outpoints, ext), payload);
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR, "{ext}");
        assert_eq!(
            response.text(),
            "Combination of URI scheme inputs and raw post data is not allowed\r\n"
        );
    }
}

#[test]
fn test_empty_requests() {
    let server = rest_server(regtest_node());
    for path in [
        "/rest/getutxos.bin",
        "/rest/getutxos.json",
        "/rest/getutxos/checkmempool.json",
    ] {
        let response = get(&server, path);
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(response.text(), "Error: empty request\r\n");
    }

    // JSON takes its input from the path only
    let response = post(&server, "/rest/getutxos.json", body(false, &[unknown(1)]));
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // A whitespace-only hex body carries nothing
    let response = post(&server, "/rest/getutxos.hex", " \n");
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[test]
fn test_zero_outpoint_body() {
    let node = regtest_node();
    mine_empty(&node, 2);
    let server = rest_server(node);

    let response = post(&server, "/rest/getutxos.bin", body(true, &[]));
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.len(), 4 + 32 + 1 + 1);
    assert_eq!(&response.body[0..4], &2i32.to_le_bytes());
}

#[test]
fn test_parse_errors() {
    let server = rest_server(regtest_node());
    let good = unknown(1).txid.to_string();

    let cases = [
        get(&server, &format!("/rest/getutxos/{good}-x.json")),
        get(&server, &format!("/rest/getutxos/{}-0.json", &good[..60])),
        get(&server, &format!("/rest/getutxos/{good}--1.json")),
        get(&server, &format!("/rest/getutxos/{good}.json")),
        post(&server, "/rest/getutxos.bin", vec![0u8, 2, 1, 2, 3]),
        post(&server, "/rest/getutxos.hex", "abc"),
        post(&server, "/rest/getutxos.hex", "zz"),
    ];
    for response in cases {
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.text(), "Parse error\r\n");
    }

    let mut trailing = body(false, &[unknown(1)]);
    trailing.push(0xff);
    let response = post(&server, "/rest/getutxos.bin", trailing);
    assert_eq!(response.text(), "Parse error\r\n");
}

#[test]
fn test_unsupported_format() {
    let server = rest_server(regtest_node());
    for path in ["/rest/getutxos.xyz", "/rest/getutxos/checkmempool"] {
        let response = get(&server, path);
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(response.text().contains("bin, hex"));
        assert_eq!(
            response.text(),
            "output format not found (available: bin, hex, json)\r\n"
        );
    }
}

#[test]
fn test_mempool_overlay() {
    let node = regtest_node();
    let block = mine(&node, Vec::new());
    let confirmed = OutPoint::new(coinbase_txid(&block), 0);

    let pending = spend(confirmed, &[1_000, 2_000]);
    let pending_txid = node.accept_to_mempool(pending, Amount::from_sat(500)).unwrap();
    let created = OutPoint::new(pending_txid, 1);
    let server = rest_server(node);

    // A pending spend hides the confirmed coin with or without the overlay
    let plain = json_body(&get(&server, &uri(false, &[confirmed, created], "json")));
    assert_eq!(plain["bitmap"], "00");

    let overlay = json_body(&get(&server, &uri(true, &[confirmed, created], "json")));
    assert_eq!(overlay["bitmap"], "01");
    assert_eq!(overlay["utxos"][0]["height"], MEMPOOL_HEIGHT as i64);
    assert_eq!(overlay["utxos"][0]["value"], 0.00002);
}

#[test]
fn test_mempool_output_spent_in_mempool() {
    let node = regtest_node();
    let block = mine(&node, Vec::new());
    let parent = spend(OutPoint::new(coinbase_txid(&block), 0), &[10_000]);
    let parent_txid = node.accept_to_mempool(parent, Amount::from_sat(100)).unwrap();
    let child_input = OutPoint::new(parent_txid, 0);
    node.accept_to_mempool(spend(child_input, &[9_000]), Amount::from_sat(100))
        .unwrap();
    let server = rest_server(node);

    let response = json_body(&get(&server, &uri(true, &[child_input], "json")));
    assert_eq!(response["bitmap"], "0");
    assert!(response["utxos"].as_array().unwrap().is_empty());
}

#[test]
fn test_block_conflict_drops_mempool_descendants() {
    let node = regtest_node();
    let block = mine(&node, Vec::new());
    let funding = OutPoint::new(coinbase_txid(&block), 0);
    let parent_txid = node
        .accept_to_mempool(spend(funding, &[10_000]), Amount::from_sat(100))
        .unwrap();
    let child_txid = node
        .accept_to_mempool(spend(OutPoint::new(parent_txid, 0), &[9_000]), Amount::from_sat(100))
        .unwrap();
    let child_output = OutPoint::new(child_txid, 0);

    let server = rest_server(node.clone());
    let before = json_body(&get(&server, &uri(true, &[child_output], "json")));
    assert_eq!(before["bitmap"], "1");

    // A different spend of the same coin confirms
    mine(&node, vec![spend(funding, &[7_000, 1_000])]);

    let after = json_body(&get(&server, &uri(true, &[child_output], "json")));
    assert_eq!(after["bitmap"], "0");
    let info = json_body(&get(&server, "/rest/mempool/info.json"));
    assert_eq!(info["size"], 0);
}

#[test]
fn test_spent_coin_disappears_after_block() {
    let node = regtest_node();
    let first = mine(&node, Vec::new());
    let coin = OutPoint::new(coinbase_txid(&first), 0);
    mine(&node, vec![spend(coin, &[1_000])]);
    let server = rest_server(node);

    let response = json_body(&get(&server, &uri(false, &[coin], "json")));
    assert_eq!(response["bitmap"], "0");
    assert_eq!(response["chainHeight"], 2);
}

#[test]
fn test_warmup_answers_first() {
    let node = std::sync::Arc::new(chain_rest::Node::with_genesis(bitcoin::Network::Regtest).unwrap());
    let server = rest_server(node);

    for path in ["/rest/getutxos.xyz", "/rest/getutxos.json"] {
        let response = get(&server, path);
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.text(),
            "Service temporarily unavailable: Loading block index...\r\n"
        );
    }
}
