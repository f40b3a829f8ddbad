//! Query interfaces
//!
//! - `rest`: the `/rest/` HTTP endpoints
//! - `json`: JSON views of chain objects
//! - `errors`: request error taxonomy

pub mod errors;
pub mod json;
pub mod rest;

pub use errors::RestError;
