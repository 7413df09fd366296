//! Route table and lookup.
//!
//! # Responsibilities
//! - Store registered routes in registration order
//! - Look up the route for a request (literal pass, then pattern pass)
//! - Enforce the table capacity
//!
//! # Design Decisions
//! - A literal match always beats an earlier wildcard or parameter route
//! - Lookups clone the matched route so no lock is held while it runs
//! - Explicit `NoRouteMatched` rather than a silent default

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::http::message::{Method, Request};
use crate::http::websocket::WebSocketHandler;
use crate::routing::handler::Handler;
use crate::routing::matcher::{is_dynamic_pattern, path_matches_pattern};

/// Default route table capacity.
pub const MAX_ROUTES: usize = 256;

/// What a route dispatches to.
#[derive(Clone)]
pub enum Endpoint {
    Http(Arc<dyn Handler>),
    WebSocket(Arc<dyn WebSocketHandler>),
}

impl Endpoint {
    pub fn kind(&self) -> RouteKind {
        match self {
            Endpoint::Http(_) => RouteKind::Http,
            Endpoint::WebSocket(_) => RouteKind::WebSocket,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    Http,
    WebSocket,
}

#[derive(Clone)]
pub struct Route {
    pub method: Method,
    pub pattern: String,
    pub endpoint: Endpoint,
    pub description: String,
}

impl Route {
    pub fn new(
        method: Method,
        pattern: impl Into<String>,
        handler: impl Handler,
        description: impl Into<String>,
    ) -> Self {
        Self {
            method,
            pattern: pattern.into(),
            endpoint: Endpoint::Http(Arc::new(handler)),
            description: description.into(),
        }
    }

    pub fn websocket(
        pattern: impl Into<String>,
        handler: impl WebSocketHandler,
        description: impl Into<String>,
    ) -> Self {
        Self {
            method: Method::Get,
            pattern: pattern.into(),
            endpoint: Endpoint::WebSocket(Arc::new(handler)),
            description: description.into(),
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("kind", &self.endpoint.kind())
            .field("description", &self.description)
            .finish()
    }
}

/// Serializable view of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub method: Method,
    pub pattern: String,
    pub description: String,
    pub kind: RouteKind,
}

/// Ordered, bounded route table shared by all connections.
pub struct RouteTable {
    routes: Mutex<Vec<Route>>,
    capacity: usize,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::with_capacity(MAX_ROUTES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Route>> {
        // A panic while holding the lock cannot leave the Vec half-updated.
        self.routes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register an HTTP route. Fails when the table is full.
    pub fn register(
        &self,
        method: Method,
        pattern: &str,
        handler: impl Handler,
        description: &str,
    ) -> Result<()> {
        self.register_route(Route::new(method, pattern, handler, description))
    }

    /// Register a GET route served by a WebSocket handler.
    pub fn register_websocket(
        &self,
        pattern: &str,
        handler: impl WebSocketHandler,
        description: &str,
    ) -> Result<()> {
        self.register_route(Route::websocket(pattern, handler, description))
    }

    pub fn register_route(&self, route: Route) -> Result<()> {
        let mut routes = self.lock();
        if routes.len() >= self.capacity {
            tracing::warn!(
                method = %route.method,
                pattern = %route.pattern,
                capacity = self.capacity,
                "Route table full"
            );
            return Err(Error::CapacityExceeded {
                resource: "route table",
                capacity: self.capacity,
            });
        }
        tracing::debug!(method = %route.method, pattern = %route.pattern, "Route registered");
        routes.push(route);
        Ok(())
    }

    /// Register each route, returning how many were accepted.
    pub fn register_all(&self, routes: impl IntoIterator<Item = Route>) -> usize {
        routes
            .into_iter()
            .filter(|route| self.register_route(route.clone()).is_ok())
            .count()
    }

    /// Remove the route registered for exactly `(method, pattern)`.
    pub fn remove(&self, method: Method, pattern: &str) -> Result<()> {
        let mut routes = self.lock();
        let index = routes
            .iter()
            .position(|r| r.method == method && r.pattern == pattern)
            .ok_or_else(|| Error::NotFound(format!("route {method} {pattern}")))?;
        routes.remove(index);
        Ok(())
    }

    /// Find the route for `request`.
    pub fn find(&self, request: &Request) -> Result<Route> {
        let routes = self.lock();

        routes
            .iter()
            .find(|r| r.method == request.method && r.pattern == request.path)
            .or_else(|| {
                routes.iter().find(|r| {
                    r.method == request.method
                        && is_dynamic_pattern(&r.pattern)
                        && path_matches_pattern(&request.path, &r.pattern)
                })
            })
            .cloned()
            .ok_or_else(|| Error::NoRouteMatched {
                method: request.method,
                path: request.path.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn snapshot(&self) -> Vec<RouteInfo> {
        self.lock()
            .iter()
            .map(|r| RouteInfo {
                method: r.method,
                pattern: r.pattern.clone(),
                description: r.description.clone(),
                kind: r.endpoint.kind(),
            })
            .collect()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::message::{Response, StatusCode};
    use crate::routing::handler::RequestContext;

    fn ok(_ctx: &RequestContext<'_>) -> Result<Response> {
        Ok(Response::text(StatusCode::Ok, "ok"))
    }

    fn get(path: &str) -> Request {
        Request::new(Method::Get, path)
    }

    #[test]
    fn literal_beats_earlier_wildcard() {
        let table = RouteTable::new();
        table.register(Method::Get, "/api/*", ok, "catch-all").unwrap();
        table.register(Method::Get, "/api/status", ok, "status").unwrap();

        let route = table.find(&get("/api/status")).unwrap();
        assert_eq!(route.description, "status");

        let route = table.find(&get("/api/other")).unwrap();
        assert_eq!(route.description, "catch-all");
    }

    #[test]
    fn first_registered_pattern_wins() {
        let table = RouteTable::new();
        table.register(Method::Get, "/users/{id}", ok, "by id").unwrap();
        table.register(Method::Get, "/users/*", ok, "any").unwrap();
        assert_eq!(table.find(&get("/users/42/extra")).unwrap().description, "by id");
    }

    #[test]
    fn method_must_match() {
        let table = RouteTable::new();
        table.register(Method::Post, "/items", ok, "create").unwrap();
        assert!(matches!(
            table.find(&get("/items")),
            Err(Error::NoRouteMatched { method: Method::Get, .. })
        ));
    }

    #[test]
    fn capacity_is_enforced() {
        let table = RouteTable::new();
        for i in 0..MAX_ROUTES {
            table.register(Method::Get, &format!("/r/{i}"), ok, "").unwrap();
        }
        let before = table.snapshot();

        let err = table.register(Method::Get, "/one-too-many", ok, "").unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded { capacity: MAX_ROUTES, .. }));
        assert_eq!(table.len(), MAX_ROUTES);
        assert_eq!(table.snapshot(), before);
    }

    #[test]
    fn register_all_counts_successes() {
        let table = RouteTable::with_capacity(2);
        let routes = (0..3).map(|i| Route::new(Method::Get, format!("/{i}"), ok, ""));
        assert_eq!(table.register_all(routes), 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn remove_preserves_order() {
        let table = RouteTable::new();
        for path in ["/a", "/b", "/c"] {
            table.register(Method::Get, path, ok, path).unwrap();
        }
        table.remove(Method::Get, "/b").unwrap();
        let patterns: Vec<_> = table.snapshot().into_iter().map(|r| r.pattern).collect();
        assert_eq!(patterns, ["/a", "/c"]);

        assert!(matches!(table.remove(Method::Get, "/b"), Err(Error::NotFound(_))));
        assert!(matches!(table.remove(Method::Post, "/a"), Err(Error::NotFound(_))));
    }

    #[test]
    fn snapshot_reports_kind() {
        struct Silent;
        impl WebSocketHandler for Silent {
            fn on_message(
                &self,
                _request: &Request,
                _frame: &crate::http::websocket::Frame,
            ) -> Option<Vec<u8>> {
                None
            }
        }

        let table = RouteTable::new();
        table.register(Method::Get, "/", ok, "index").unwrap();
        table.register_websocket("/ws", Silent, "socket").unwrap();

        let info = table.snapshot();
        assert_eq!(info[0].kind, RouteKind::Http);
        assert_eq!(info[1].kind, RouteKind::WebSocket);
        assert_eq!(info[1].method, Method::Get);
    }
}
