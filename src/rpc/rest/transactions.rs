//! Transaction endpoint
//!
//! GET /rest/tx/<txid>.<bin|hex|json>

use crate::node::chain_access::ChainAccess;
use crate::rpc::errors::RestError;
use crate::rpc::json::tx_with_block_to_json;
use crate::rpc::rest::format::{negotiate, RetFormat, ALL_FORMATS};
use crate::rpc::rest::parse_hash;
use crate::rpc::rest::types::{RestRequest, RestResponse};
use bitcoin::consensus::encode::serialize;
use bitcoin::Txid;

/// Transaction from the mempool or the transaction index
pub fn rest_tx(access: &ChainAccess, _request: &RestRequest, residual: &str) -> Result<RestResponse, RestError> {
    access.check_warmup()?;
    let (hash_str, format) = negotiate(residual, ALL_FORMATS)?;
    let txid: Txid = parse_hash(hash_str)?;

    let found = access.lookup_transaction(&txid)?;
    Ok(match format {
        RetFormat::Json => RestResponse::json(&tx_with_block_to_json(
            &found.tx,
            found.block.as_ref(),
            access.node().network(),
        )),
        RetFormat::Hex => RestResponse::hex(&serialize(&found.tx)),
        _ => RestResponse::binary(serialize(&found.tx)),
    })
}
