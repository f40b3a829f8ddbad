//! UTXO set queries (BIP64)
//!
//! GET  /rest/getutxos[/checkmempool]/<txid>-<n>/...<.bin|.hex|.json>
//! POST /rest/getutxos.<bin|hex> with a serialized request body
//!
//! Outpoints come either from the path or from the body, never both. A hex
//! body is decoded to bytes first and then parsed like a binary body.

use crate::node::chain_access::{ChainAccess, CoinSnapshot};
use crate::rpc::errors::RestError;
use crate::rpc::json::coin_to_json;
use crate::rpc::rest::format::{negotiate, RetFormat, ALL_FORMATS};
use crate::rpc::rest::parse_hash;
use crate::rpc::rest::types::{RestRequest, RestResponse};
use crate::storage::Coin;
use bitcoin::consensus::encode::{deserialize, deserialize_partial, serialize, VarInt};
use bitcoin::{BlockHash, OutPoint};
use serde_json::{json, Value};
use tracing::debug;

/// Most outpoints accepted in one request
pub const MAX_GETUTXOS_OUTPOINTS: usize = 15;

/// Serialized outpoint size: 32-byte txid plus u32 index
const OUTPOINT_SIZE: usize = 36;

const CHECK_MEMPOOL: &str = "checkmempool";

/// Parsed query input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoRequest {
    pub check_mempool: bool,
    pub outpoints: Vec<OutPoint>,
}

impl UtxoRequest {
    /// Serialize in the request body layout: flag byte, CompactSize count, outpoints
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![u8::from(self.check_mempool)];
        out.extend(serialize(&VarInt(self.outpoints.len() as u64)));
        for outpoint in &self.outpoints {
            out.extend(serialize(outpoint));
        }
        out
    }
}

/// Query outcome, ready for encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoQueryResult {
    pub chain_height: i32,
    pub tip_hash: BlockHash,
    /// Bit i set when outpoint i was found unspent
    pub bitmap: Vec<u8>,
    /// The same hits as a string of '1' and '0'
    pub bitmap_string: String,
    /// Found coins in request order
    pub coins: Vec<Coin>,
}

impl UtxoQueryResult {
    /// Fold per-outpoint lookups into the bitmap and coin list
    pub fn from_snapshot(snapshot: CoinSnapshot) -> Self {
        let mut bitmap = vec![0u8; snapshot.coins.len().div_ceil(8)];
        let mut bitmap_string = String::with_capacity(snapshot.coins.len());
        let mut coins = Vec::new();

        for (i, coin) in snapshot.coins.into_iter().enumerate() {
            let hit = coin.is_some();
            bitmap[i / 8] |= u8::from(hit) << (i % 8);
            bitmap_string.push(if hit { '1' } else { '0' });
            coins.extend(coin);
        }

        Self {
            chain_height: snapshot.tip_height,
            tip_hash: snapshot.tip_hash,
            bitmap,
            bitmap_string,
            coins,
        }
    }

    /// Binary response: height, tip hash, bitmap, coin records
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend(serialize(&self.chain_height));
        out.extend(serialize(&self.tip_hash));
        out.extend(serialize(&self.bitmap));
        out.extend(serialize(&VarInt(self.coins.len() as u64)));
        for coin in &self.coins {
            // Transaction version placeholder, always zero on the wire
            out.extend(serialize(&0u32));
            out.extend(serialize(&coin.height));
            out.extend(serialize(&coin.output));
        }
        out
    }

    pub fn to_json(&self, network: bitcoin::Network) -> Value {
        let utxos: Vec<Value> = self.coins.iter().map(|coin| coin_to_json(coin, network)).collect();
        json!({
            "chainHeight": self.chain_height,
            "chaintipHash": self.tip_hash.to_string(),
            "bitmap": self.bitmap_string,
            "utxos": utxos,
        })
    }
}

/// Path segments after the prefix, without the leading separator
fn uri_segments(base: &str) -> Vec<&str> {
    let trimmed = base.strip_prefix('/').unwrap_or(base);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').collect()
}

/// Parse a `<txid>-<n>` segment
pub fn parse_outpoint(segment: &str) -> Result<OutPoint, RestError> {
    let (txid, vout) = segment.split_once('-').ok_or(RestError::Parse)?;
    let txid = parse_hash(txid).map_err(|_| RestError::Parse)?;
    let vout = vout.parse::<u32>().map_err(|_| RestError::Parse)?;
    Ok(OutPoint::new(txid, vout))
}

/// Parse path-encoded input. `None` when the path carries no segments.
pub fn parse_uri_request(base: &str) -> Result<Option<UtxoRequest>, RestError> {
    let segments = uri_segments(base);
    let Some((first, rest)) = segments.split_first() else {
        return Ok(None);
    };

    let (check_mempool, outpoint_segments) = if *first == CHECK_MEMPOOL {
        (true, rest)
    } else {
        (false, segments.as_slice())
    };
    if outpoint_segments.is_empty() {
        return Err(RestError::bad_request("Error: empty request"));
    }

    let outpoints = outpoint_segments
        .iter()
        .map(|segment| parse_outpoint(segment))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(UtxoRequest {
        check_mempool,
        outpoints,
    }))
}

/// Turn the request body into raw bytes for the requested format.
///
/// Hex bodies are trimmed and strictly decoded; other formats pass through.
pub fn normalize_body(body: &[u8], format: RetFormat) -> Result<Vec<u8>, RestError> {
    if format != RetFormat::Hex {
        return Ok(body.to_vec());
    }
    let text = std::str::from_utf8(body).map_err(|_| RestError::Parse)?;
    hex::decode(text.trim()).map_err(|_| RestError::Parse)
}

/// Parse a binary request body.
///
/// The body must hold exactly the announced number of outpoints.
pub fn decode_request_body(data: &[u8]) -> Result<UtxoRequest, RestError> {
    let (&flag, rest) = data.split_first().ok_or(RestError::Parse)?;
    let (VarInt(count), consumed) = deserialize_partial::<VarInt>(rest).map_err(|_| RestError::Parse)?;
    let payload = &rest[consumed..];

    let expected = usize::try_from(count)
        .ok()
        .and_then(|count| count.checked_mul(OUTPOINT_SIZE))
        .ok_or(RestError::Parse)?;
    if expected != payload.len() {
        return Err(RestError::Parse);
    }

    let outpoints = payload
        .chunks_exact(OUTPOINT_SIZE)
        .map(deserialize::<OutPoint>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| RestError::Parse)?;
    Ok(UtxoRequest {
        check_mempool: flag != 0,
        outpoints,
    })
}

/// Resolve the request's input from the path and the normalized body
pub fn parse_request(base: &str, body: &[u8], format: RetFormat) -> Result<UtxoRequest, RestError> {
    let body = normalize_body(body, format)?;
    if body.is_empty() && uri_segments(base).is_empty() {
        return Err(RestError::bad_request("Error: empty request"));
    }

    let uri_request = parse_uri_request(base)?;
    match (uri_request, body.is_empty()) {
        (Some(_), false) => Err(RestError::CombinedInput),
        (Some(request), true) => Ok(request),
        (None, _) if format == RetFormat::Json => Err(RestError::bad_request("Error: empty request")),
        (None, _) => decode_request_body(&body),
    }
}

/// Look up every outpoint and build the hit bitmap under one chain/mempool snapshot
pub fn query_utxos(access: &ChainAccess, request: &UtxoRequest) -> Result<UtxoQueryResult, RestError> {
    if request.outpoints.len() > MAX_GETUTXOS_OUTPOINTS {
        return Err(RestError::LimitExceeded {
            max: MAX_GETUTXOS_OUTPOINTS,
            tried: request.outpoints.len(),
        });
    }
    let snapshot = access.lookup_coins(request.check_mempool, &request.outpoints);
    Ok(UtxoQueryResult::from_snapshot(snapshot))
}

pub fn rest_getutxos(
    access: &ChainAccess,
    request: &RestRequest,
    residual: &str,
) -> Result<RestResponse, RestError> {
    access.check_warmup()?;
    let (base, format) = negotiate(residual, ALL_FORMATS)?;

    let query = parse_request(base, &request.body, format)?;
    let result = query_utxos(access, &query)?;
    debug!(
        "getutxos: {} outpoints, mempool={}, bitmap={}",
        query.outpoints.len(),
        query.check_mempool,
        result.bitmap_string
    );

    Ok(match format {
        RetFormat::Json => RestResponse::json(&result.to_json(access.node().network())),
        RetFormat::Hex => RestResponse::hex(&result.to_bytes()),
        _ => RestResponse::binary(result.to_bytes()),
    })
}
