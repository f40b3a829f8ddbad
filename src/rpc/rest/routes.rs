//! REST route table
//!
//! An ordered list of (prefix, handler) pairs. Dispatch walks the list in
//! registration order and the first prefix that matches wins, so
//! `/rest/block/notxdetails/` must be registered before `/rest/block/`.

use crate::node::chain_access::ChainAccess;
use crate::rpc::errors::RestError;
use crate::rpc::rest::types::{RestRequest, RestResponse};
use crate::rpc::rest::{blocks, chain, mempool, transactions, utxos};
use tracing::{debug, info};

/// Handler signature: chain accessor, full request, path after the prefix
pub type RestHandler = fn(&ChainAccess, &RestRequest, &str) -> Result<RestResponse, RestError>;

/// Registered route
#[derive(Clone, Copy)]
pub struct Route {
    pub prefix: &'static str,
    pub handler: RestHandler,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route").field("prefix", &self.prefix).finish()
    }
}

/// The REST endpoints, most specific prefixes first
pub const REST_ROUTES: &[Route] = &[
    Route { prefix: "/rest/tx/", handler: transactions::rest_tx },
    Route { prefix: "/rest/block/notxdetails/", handler: blocks::rest_block_notxdetails },
    Route { prefix: "/rest/block/", handler: blocks::rest_block_extended },
    Route { prefix: "/rest/chaininfo", handler: chain::rest_chaininfo },
    Route { prefix: "/rest/mempool/info", handler: mempool::rest_mempool_info },
    Route { prefix: "/rest/mempool/contents", handler: mempool::rest_mempool_contents },
    Route { prefix: "/rest/headers/", handler: blocks::rest_headers },
    Route { prefix: "/rest/getutxos", handler: utxos::rest_getutxos },
];

/// Ordered prefix → handler registry
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Re-registering a prefix replaces its handler in place.
    pub fn register(&mut self, prefix: &'static str, handler: RestHandler) {
        if let Some(route) = self.routes.iter_mut().find(|r| r.prefix == prefix) {
            route.handler = handler;
            return;
        }
        debug!("Registering REST handler for prefix {}", prefix);
        self.routes.push(Route { prefix, handler });
    }

    /// Remove a route; unknown prefixes are ignored
    pub fn unregister(&mut self, prefix: &str) -> bool {
        let before = self.routes.len();
        self.routes.retain(|r| r.prefix != prefix);
        before != self.routes.len()
    }

    /// Register every REST endpoint
    pub fn start(&mut self) {
        for route in REST_ROUTES {
            self.register(route.prefix, route.handler);
        }
        info!("REST interface started with {} routes", self.routes.len());
    }

    /// Unregister every REST endpoint
    pub fn stop(&mut self) {
        for route in REST_ROUTES {
            self.unregister(route.prefix);
        }
        info!("REST interface stopped");
    }

    /// First route whose prefix matches `path`, with the residual path
    pub fn find<'p>(&self, path: &'p str) -> Option<(&Route, &'p str)> {
        self.routes
            .iter()
            .find_map(|route| path.strip_prefix(route.prefix).map(|rest| (route, rest)))
    }

    /// Dispatch a request to its handler
    pub fn dispatch(&self, access: &ChainAccess, request: &RestRequest) -> RestResponse {
        let Some((route, residual)) = self.find(&request.path) else {
            return RestError::not_found(format!("Endpoint not found: {}", request.path)).into_response();
        };
        debug!("REST {} matched prefix {}", request.path, route.prefix);
        match (route.handler)(access, request, residual) {
            Ok(response) => response,
            Err(e) => {
                debug!("REST {} failed: {}", request.path, e);
                e.into_response()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered prefixes in dispatch order
    pub fn prefixes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.routes.iter().map(|r| r.prefix)
    }
}
