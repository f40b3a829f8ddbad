//! REST error types
//!
//! Every failed request ends in exactly one plain-text response whose
//! status is derived from the error kind.

use crate::rpc::rest::types::{RestResponse, CONTENT_TYPE_TEXT};
use hyper::StatusCode;

/// REST handler errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RestError {
    /// Node has not finished warm-up
    #[error("Service temporarily unavailable: {0}")]
    WarmupUnavailable(String),

    /// Malformed or out-of-range input
    #[error("{0}")]
    BadRequest(String),

    /// Representation suffix not served by this endpoint
    #[error("output format not found (available: {0})")]
    UnsupportedFormat(String),

    /// Unknown hash or unroutable path
    #[error("{0}")]
    NotFound(String),

    /// Block known but its data was pruned
    #[error("{0} not available (pruned data)")]
    NotAvailable(String),

    /// Too many outpoints in one getutxos request
    #[error("Error: max outpoints exceeded (max: {max}, tried: {tried})")]
    LimitExceeded { max: usize, tried: usize },

    /// Outpoints supplied both in the path and in the body
    #[error("Combination of URI scheme inputs and raw post data is not allowed")]
    CombinedInput,

    /// Unreadable request input
    #[error("Parse error")]
    Parse,

    #[error("{0}")]
    Internal(String),
}

impl RestError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn invalid_hash(hash: &str) -> Self {
        Self::BadRequest(format!("Invalid hash: {hash}"))
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            RestError::WarmupUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RestError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RestError::UnsupportedFormat(_) | RestError::NotFound(_) | RestError::NotAvailable(_) => {
                StatusCode::NOT_FOUND
            }
            // Existing clients expect a server-error status for these
            RestError::LimitExceeded { .. }
            | RestError::CombinedInput
            | RestError::Parse
            | RestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plain-text error response
    pub fn into_response(self) -> RestResponse {
        RestResponse::new(
            self.status(),
            CONTENT_TYPE_TEXT,
            format!("{self}\r\n").into_bytes(),
        )
    }
}
