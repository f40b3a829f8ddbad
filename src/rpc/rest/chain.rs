//! Chain summary endpoint
//!
//! GET /rest/chaininfo.json

use crate::node::chain_access::ChainAccess;
use crate::rpc::errors::RestError;
use crate::rpc::json::chain_info_to_json;
use crate::rpc::rest::format::{negotiate, JSON_ONLY};
use crate::rpc::rest::types::{RestRequest, RestResponse};

pub fn rest_chaininfo(
    access: &ChainAccess,
    _request: &RestRequest,
    residual: &str,
) -> Result<RestResponse, RestError> {
    access.check_warmup()?;
    negotiate(residual, JSON_ONLY)?;
    Ok(RestResponse::json(&chain_info_to_json(&access.chain_info())))
}
