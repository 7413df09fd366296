//! Request handler abstraction.

use crate::error::Result;
use crate::http::message::{Request, Response};
use crate::http::server::AppState;
use crate::routing::matcher::extract_path_param;
use crate::routing::router::Route;
use crate::session::Session;

/// Longest path parameter value handed to handlers.
pub const MAX_PARAM_LEN: usize = 256;

/// Everything a handler can see about the request it serves.
pub struct RequestContext<'a> {
    pub request: &'a Request,
    /// The route that matched.
    pub route: &'a Route,
    pub state: &'a AppState,
    /// Snapshot of the caller's session, when sessions are enabled and the
    /// cookie names a live one.
    pub session: Option<Session>,
}

impl<'a> RequestContext<'a> {
    /// Value of `{name}` in the matched pattern.
    pub fn path_param(&self, name: &str) -> Option<&'a str> {
        extract_path_param(&self.request.path, &self.route.pattern, name, MAX_PARAM_LEN).ok()
    }

    pub fn query_param(&self, name: &str) -> Option<&'a str> {
        self.request.query_param(name)
    }
}

/// Produces a response for a matched HTTP route.
///
/// Handlers run synchronously on the connection task and must not block
/// for long.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, ctx: &RequestContext<'_>) -> Result<Response>;
}

impl<F> Handler for F
where
    F: Fn(&RequestContext<'_>) -> Result<Response> + Send + Sync + 'static,
{
    fn handle(&self, ctx: &RequestContext<'_>) -> Result<Response> {
        self(ctx)
    }
}
