//! REST interface
//!
//! Unauthenticated read-only endpoints under `/rest/`. Each endpoint picks
//! its representation from the path suffix (`.bin`, `.hex`, `.json`).

pub mod blocks;
pub mod chain;
pub mod format;
pub mod mempool;
pub mod routes;
pub mod server;
pub mod transactions;
pub mod types;
pub mod utxos;

pub use format::RetFormat;
pub use routes::RouteTable;
pub use server::RestServer;
pub use types::{RestRequest, RestResponse};

use crate::rpc::errors::RestError;
use std::str::FromStr;

/// Parse a 64-character hex hash in display order
pub fn parse_hash<T: FromStr>(text: &str) -> Result<T, RestError> {
    if text.len() != 64 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(RestError::invalid_hash(text));
    }
    text.parse().map_err(|_| RestError::invalid_hash(text))
}
