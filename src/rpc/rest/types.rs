//! REST request/response types
//!
//! The transport-facing abstraction: handlers consume a [`RestRequest`] and
//! produce a [`RestResponse`], independent of the HTTP library.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Method, Response, StatusCode};

/// Maximum request body size (1MB)
pub const MAX_REQUEST_SIZE: usize = 1_048_576;

pub const CONTENT_TYPE_BINARY: &str = "application/octet-stream";
pub const CONTENT_TYPE_TEXT: &str = "text/plain";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// An incoming request after the transport has read it completely
#[derive(Debug, Clone)]
pub struct RestRequest {
    pub method: Method,
    /// Path component of the URI, without query string
    pub path: String,
    pub body: Bytes,
}

impl RestRequest {
    pub fn new(method: Method, path: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            path: path.into(),
            body: body.into(),
        }
    }

    /// Body-less GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path, Bytes::new())
    }
}

/// A complete response ready to be written back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: Bytes,
}

impl RestResponse {
    pub fn new(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    /// Raw binary payload
    pub fn binary(data: Vec<u8>) -> Self {
        Self::new(StatusCode::OK, CONTENT_TYPE_BINARY, data)
    }

    /// Hex-encoded payload followed by a newline
    pub fn hex(data: &[u8]) -> Self {
        Self::new(StatusCode::OK, CONTENT_TYPE_TEXT, format!("{}\n", hex::encode(data)))
    }

    /// Compact JSON followed by a newline
    pub fn json(value: &serde_json::Value) -> Self {
        Self::new(StatusCode::OK, CONTENT_TYPE_JSON, format!("{value}\n"))
    }

    /// Body as UTF-8 text (lossy), for tests and logging
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Convert into a hyper response
    pub fn into_hyper(self) -> Response<Full<Bytes>> {
        let length = self.body.len();
        Response::builder()
            .status(self.status)
            .header("Content-Type", self.content_type)
            .header("Content-Length", length)
            .body(Full::new(self.body))
            .unwrap_or_else(|_| {
                let mut fallback = Response::new(Full::new(Bytes::from_static(b"Internal server error\r\n")));
                *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_response_has_trailing_newline() {
        let response = RestResponse::hex(&[0xde, 0xad]);
        assert_eq!(response.text(), "dead\n");
        assert_eq!(response.content_type, CONTENT_TYPE_TEXT);
    }

    #[test]
    fn test_json_response() {
        let response = RestResponse::json(&serde_json::json!({"a": 1}));
        assert_eq!(response.text(), "{\"a\":1}\n");
        assert_eq!(response.content_type, CONTENT_TYPE_JSON);
    }

    #[test]
    fn test_into_hyper_sets_headers() {
        let response = RestResponse::binary(vec![1, 2, 3]).into_hyper();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], CONTENT_TYPE_BINARY);
        assert_eq!(response.headers()["content-length"], "3");
    }
}
