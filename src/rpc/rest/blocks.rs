//! Block endpoints
//!
//! GET /rest/block/<hash>.<bin|hex|json>
//! GET /rest/block/notxdetails/<hash>.<bin|hex|json>
//! GET /rest/headers/<count>/<hash>.<bin|hex|json>

use crate::node::chain_access::ChainAccess;
use crate::rpc::errors::RestError;
use crate::rpc::json::{block_to_json, header_to_json};
use crate::rpc::rest::format::{negotiate, RetFormat, ALL_FORMATS};
use crate::rpc::rest::parse_hash;
use crate::rpc::rest::types::{RestRequest, RestResponse};
use bitcoin::consensus::encode::serialize;
use bitcoin::BlockHash;
use serde_json::Value;

/// Most headers returned by one request
pub const MAX_HEADERS_RESULTS: usize = 2000;

/// Block with full transaction objects in JSON
pub fn rest_block_extended(
    access: &ChainAccess,
    _request: &RestRequest,
    residual: &str,
) -> Result<RestResponse, RestError> {
    rest_block(access, residual, true)
}

/// Block with transaction ids only in JSON
pub fn rest_block_notxdetails(
    access: &ChainAccess,
    _request: &RestRequest,
    residual: &str,
) -> Result<RestResponse, RestError> {
    rest_block(access, residual, false)
}

fn rest_block(access: &ChainAccess, residual: &str, tx_details: bool) -> Result<RestResponse, RestError> {
    access.check_warmup()?;
    let (hash_str, format) = negotiate(residual, ALL_FORMATS)?;
    let hash: BlockHash = parse_hash(hash_str)?;

    let snapshot = access.resolve_block(&hash)?;
    Ok(match format {
        RetFormat::Json => RestResponse::json(&block_to_json(
            &snapshot.block,
            &snapshot.header,
            tx_details,
            access.node().network(),
        )),
        RetFormat::Hex => RestResponse::hex(&serialize(&snapshot.block)),
        _ => RestResponse::binary(serialize(&snapshot.block)),
    })
}

/// Up to `count` consecutive active-chain headers starting at `hash`
pub fn rest_headers(
    access: &ChainAccess,
    _request: &RestRequest,
    residual: &str,
) -> Result<RestResponse, RestError> {
    access.check_warmup()?;
    let (base, format) = negotiate(residual, ALL_FORMATS)?;

    let parts: Vec<&str> = base.split('/').collect();
    let [count_str, hash_str] = parts.as_slice() else {
        return Err(RestError::bad_request(
            "No header count specified. Use /rest/headers/<count>/<hash>.<ext>.",
        ));
    };
    let count = parse_header_count(count_str)?;
    let hash: BlockHash = parse_hash(hash_str)?;

    let headers = access.resolve_block_headers(&hash, count)?;
    Ok(match format {
        RetFormat::Json => {
            RestResponse::json(&Value::Array(headers.iter().map(header_to_json).collect()))
        }
        _ => {
            let mut raw = Vec::with_capacity(headers.len() * 80);
            for snapshot in &headers {
                raw.extend(serialize(&snapshot.entry.header));
            }
            if format == RetFormat::Hex {
                RestResponse::hex(&raw)
            } else {
                RestResponse::binary(raw)
            }
        }
    })
}

/// Plain decimal count in `1..=MAX_HEADERS_RESULTS`; signs are rejected
fn parse_header_count(text: &str) -> Result<usize, RestError> {
    let out_of_range = || RestError::bad_request(format!("Header count out of range: {text}"));
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(out_of_range());
    }
    match text.parse::<usize>() {
        Ok(count) if (1..=MAX_HEADERS_RESULTS).contains(&count) => Ok(count),
        _ => Err(out_of_range()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_count_bounds() {
        assert!(parse_header_count("0").is_err());
        assert_eq!(parse_header_count("1").unwrap(), 1);
        assert_eq!(parse_header_count("2000").unwrap(), 2000);
        assert!(parse_header_count("2001").is_err());
        assert!(parse_header_count("-5").is_err());
        assert!(parse_header_count("+1").is_err());
        assert!(parse_header_count("").is_err());
        assert_eq!(
            parse_header_count("abc").unwrap_err().to_string(),
            "Header count out of range: abc"
        );
    }
}
