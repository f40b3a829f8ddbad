//! REST server
//!
//! Binds the route table to an HTTP/1 listener. Every connection is served
//! on its own task; each request body is read completely (bounded by the
//! configured size limit) before dispatch.

use crate::config::RestConfig;
use crate::node::chain_access::ChainAccess;
use crate::node::Node;
use crate::rpc::rest::routes::RouteTable;
use crate::rpc::rest::types::{RestRequest, RestResponse, CONTENT_TYPE_TEXT, MAX_REQUEST_SIZE};
use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// REST server
#[derive(Clone)]
pub struct RestServer {
    addr: SocketAddr,
    access: ChainAccess,
    routes: Arc<RwLock<RouteTable>>,
    max_request_size: usize,
}

impl RestServer {
    /// Create a server for `node`; no routes are registered until it is started
    pub fn new(addr: SocketAddr, node: Arc<Node>) -> Self {
        Self {
            addr,
            access: ChainAccess::new(node),
            routes: Arc::new(RwLock::new(RouteTable::new())),
            max_request_size: MAX_REQUEST_SIZE,
        }
    }

    /// Create a server from the `[rest]` config section
    pub fn from_config(config: &RestConfig, node: Arc<Node>) -> Self {
        Self::new(config.listen_addr, node).with_max_request_size(config.max_request_size)
    }

    pub fn with_max_request_size(mut self, max_request_size: usize) -> Self {
        self.max_request_size = max_request_size;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn access(&self) -> &ChainAccess {
        &self.access
    }

    /// Register every REST endpoint
    pub fn register_routes(&self) {
        self.routes.write().start();
    }

    /// Unregister every REST endpoint; later requests are unroutable
    pub fn stop(&self) {
        self.routes.write().stop();
    }

    /// Number of registered routes
    pub fn route_count(&self) -> usize {
        self.routes.read().len()
    }

    /// Bind the configured address and serve until the process ends
    pub async fn start(&self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("Failed to bind REST server to {}", self.addr))?;
        self.serve(listener).await
    }

    /// Register the routes and serve connections from an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        self.register_routes();
        let local_addr = listener.local_addr().context("Failed to read listener address")?;
        info!("REST server listening on {}", local_addr);

        let server = Arc::new(self.clone());
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("New REST connection from {}", addr);
                    let server = Arc::clone(&server);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let service = service_fn(move |req| Self::handle_http(Arc::clone(&server), req));
                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            debug!("REST connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept REST connection: {}", e);
                }
            }
        }
    }

    /// Dispatch a fully read request
    pub fn handle(&self, request: RestRequest) -> RestResponse {
        if request.method != Method::GET && request.method != Method::POST {
            return plain(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
        }
        self.routes.read().dispatch(&self.access, &request)
    }

    async fn handle_http(
        server: Arc<Self>,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let request_id = Uuid::new_v4().to_string();
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        debug!("REST {} {} (request_id: {})", method, path, &request_id[..8]);

        let body = match Limited::new(req.into_body(), server.max_request_size).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                warn!(
                    "Rejecting REST request {} with body over {} bytes",
                    &request_id[..8],
                    server.max_request_size
                );
                return Ok(plain(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    &format!("Request body too large (max: {} bytes)", server.max_request_size),
                )
                .into_hyper());
            }
            Err(e) => {
                debug!("Failed to read REST request body: {}", e);
                return Ok(plain(StatusCode::BAD_REQUEST, "Failed to read request body").into_hyper());
            }
        };

        let response = server.handle(RestRequest::new(method, path, body));
        debug!(
            "REST request {} -> {}",
            &request_id[..8],
            response.status.as_u16()
        );
        Ok(response.into_hyper())
    }
}

fn plain(status: StatusCode, message: &str) -> RestResponse {
    RestResponse::new(status, CONTENT_TYPE_TEXT, format!("{message}\r\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::Network;

    fn server() -> RestServer {
        let node = Node::with_genesis(Network::Regtest).unwrap();
        node.set_warmup_finished();
        RestServer::new("127.0.0.1:0".parse().unwrap(), Arc::new(node))
    }

    #[test]
    fn test_unregistered_paths_are_not_found() {
        let server = server();
        let response = server.handle(RestRequest::get("/rest/chaininfo.json"));
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_register_then_stop() {
        let server = server();
        server.register_routes();
        assert_eq!(server.route_count(), 8);
        let response = server.handle(RestRequest::get("/rest/chaininfo.json"));
        assert_eq!(response.status, StatusCode::OK);

        server.stop();
        assert_eq!(server.route_count(), 0);
        let response = server.handle(RestRequest::get("/rest/chaininfo.json"));
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_method_not_allowed() {
        let server = server();
        server.register_routes();
        let response = server.handle(RestRequest::new(Method::DELETE, "/rest/chaininfo.json", Bytes::new()));
        assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
