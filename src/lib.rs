//! chain-rest - read-only REST gateway for a Bitcoin node
//!
//! Exposes blocks, headers, transactions, mempool state and the UTXO set
//! over unauthenticated HTTP endpoints under `/rest/`, in binary, hex or
//! JSON form.
//!
//! ## Layout
//!
//! - [`storage`]: block index, block bodies, UTXO set, transaction index
//! - [`node`]: shared node state, mempool, coin views and the snapshot accessor
//! - [`rpc`]: the REST handlers, route table and HTTP server
//! - [`config`] / [`utils`]: configuration and logging

#![allow(clippy::module_inception)]

pub mod config;
pub mod node;
pub mod rpc;
pub mod storage;
pub mod utils;

pub use config::{GatewayConfig, LoggingConfig, MempoolConfig, RestConfig};
pub use node::Node;
pub use rpc::rest::{RestRequest, RestResponse, RestServer};
pub use rpc::RestError;
