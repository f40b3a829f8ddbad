//! Mempool endpoints
//!
//! GET /rest/mempool/info.json
//! GET /rest/mempool/contents.json

use crate::node::chain_access::ChainAccess;
use crate::rpc::errors::RestError;
use crate::rpc::json::{mempool_contents_to_json, mempool_info_to_json};
use crate::rpc::rest::format::{negotiate, JSON_ONLY};
use crate::rpc::rest::types::{RestRequest, RestResponse};

/// Pool size and fee settings
pub fn rest_mempool_info(
    access: &ChainAccess,
    _request: &RestRequest,
    residual: &str,
) -> Result<RestResponse, RestError> {
    access.check_warmup()?;
    negotiate(residual, JSON_ONLY)?;
    Ok(RestResponse::json(&mempool_info_to_json(&access.mempool_info())))
}

/// Every pending transaction with its fee and in-pool relations
pub fn rest_mempool_contents(
    access: &ChainAccess,
    _request: &RestRequest,
    residual: &str,
) -> Result<RestResponse, RestError> {
    access.check_warmup()?;
    negotiate(residual, JSON_ONLY)?;
    Ok(RestResponse::json(&mempool_contents_to_json(&access.mempool_contents())))
}
