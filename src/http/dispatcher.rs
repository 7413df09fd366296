//! Per-connection request dispatch.
//!
//! # Responsibilities
//! - Parse one request per connection, bounded by the request timeout
//! - Apply rate limiting, session lookup and route matching
//! - Run HTTP handlers or hand the connection to a WebSocket handler
//! - Decorate, serialize and count the response
//!
//! # Data Flow
//! ```text
//! stream → parse_request ──(error)──────────────→ error page → close
//!            │
//!            ▼
//!        rate limit → session → RouteTable::find
//!            │                      │
//!            │         ┌────────────┴─────────────┐
//!            ▼         ▼                          ▼
//!        429 page   Endpoint::Http            Endpoint::WebSocket
//!                   handler → response        handshake → run_session
//!                      │
//!                      ▼
//!        security/CORS headers, X-Request-ID → write_response → close
//! ```
//!
//! # Design Decisions
//! - No keep-alive: every response carries `Connection: close`
//! - Handlers run synchronously; no lock is held while they do

use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncWrite};
use uuid::Uuid;

use crate::error::Error;
use crate::http::message::{ConnectionInfo, Request, Response, StatusCode};
use crate::http::parser::{parse_request, ParseLimits};
use crate::http::response::write_response;
use crate::http::server::AppState;
use crate::http::websocket::{handshake, is_upgrade_request, run_session, WebSocketHandler};
use crate::net::connection::ConnectionTracker;
use crate::observability::metrics;
use crate::routing::{Endpoint, RequestContext};
use crate::security::headers::{add_cors_headers, add_security_headers};

/// What the synchronous part of dispatch decided.
pub enum Outcome {
    Respond(Response),
    Upgrade(Arc<dyn WebSocketHandler>),
}

pub struct Dispatcher {
    state: AppState,
    tracker: ConnectionTracker,
}

impl Dispatcher {
    pub fn new(state: AppState, tracker: ConnectionTracker) -> Self {
        Self { state, tracker }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve a single request on `stream`, then return so the caller can close it.
    pub async fn serve<S>(&self, mut stream: S, peer: Option<SocketAddr>)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let guard = self.tracker.track();
        let _active = self.state.stats.connection_opened();
        let start = Instant::now();
        let conn = ConnectionInfo::new(guard.id(), peer);
        let request_id = conn.request_id;

        let limits = ParseLimits {
            read_buffer: self.state.config.limits.read_buffer,
            max_body: self.state.config.limits.max_body,
        };
        let deadline = Duration::from_secs(self.state.config.timeouts.request_secs);

        let request = match tokio::time::timeout(deadline, parse_request(&mut stream, conn, &limits)).await {
            Ok(Ok(request)) => request,
            Ok(Err(Error::ConnectionClosed)) => {
                tracing::trace!(connection_id = %guard.id(), "Connection closed before a request");
                return;
            }
            Ok(Err(Error::Io(e))) => {
                tracing::debug!(connection_id = %guard.id(), error = %e, "Read failed");
                self.state.stats.record_error("io");
                return;
            }
            Ok(Err(e)) => {
                tracing::warn!(connection_id = %guard.id(), error = %e, "Rejected request");
                self.state.stats.record_error("parse");
                let message = match e {
                    Error::BodyTooLarge { .. } => "Request body too large",
                    _ => "Invalid HTTP request",
                };
                let response = Response::error_page(e.status(), message);
                self.finish(&mut stream, response, request_id, "INVALID", start).await;
                return;
            }
            Err(_) => {
                tracing::debug!(connection_id = %guard.id(), "Request timed out");
                self.state.stats.record_error("timeout");
                return;
            }
        };

        self.state.stats.record_request(request.body_len());
        tracing::debug!(
            request_id = %request_id,
            connection_id = %guard.id(),
            method = %request.method,
            path = %request.path,
            body_bytes = request.body_len(),
            "Request received"
        );

        match self.route(&request) {
            Outcome::Respond(response) => {
                self.finish(&mut stream, response, request_id, request.method.as_str(), start)
                    .await;
            }
            Outcome::Upgrade(handler) => {
                if let Err(e) = handshake(&mut stream, &request).await {
                    tracing::warn!(request_id = %request_id, error = %e, "WebSocket handshake failed");
                    self.state.stats.record_error("upgrade");
                    return;
                }
                metrics::record_request(request.method.as_str(), 101, start);
                metrics::record_websocket_session();
                tracing::info!(request_id = %request_id, path = %request.path, "WebSocket session opened");

                let max_payload = self.state.config.limits.max_frame_payload;
                if let Err(e) = run_session(&mut stream, &request, handler.as_ref(), max_payload).await {
                    tracing::debug!(request_id = %request_id, error = %e, "WebSocket session ended with error");
                    self.state.stats.record_error("websocket");
                }
                tracing::info!(request_id = %request_id, "WebSocket session closed");
            }
        }
    }

    /// Decide the response for a parsed request without touching the stream.
    pub fn route(&self, request: &Request) -> Outcome {
        let features = &self.state.config.features;

        if features.rate_limiting {
            let client = request
                .connection
                .peer
                .map(|p| p.ip().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            if !self.state.rate_limiter.check(&client) {
                metrics::record_rate_limited();
                return Outcome::Respond(Response::error_page(
                    StatusCode::TooManyRequests,
                    "Too many requests",
                ));
            }
        }

        let session = if features.sessions {
            request
                .session_id
                .as_deref()
                .and_then(|id| self.state.sessions.get(id).ok())
        } else {
            None
        };

        let route = match self.state.routes.find(request) {
            Ok(route) => route,
            Err(e) => {
                tracing::debug!(error = %e, "No route matched");
                return Outcome::Respond(self.error_response(StatusCode::NotFound, "Page not found"));
            }
        };

        match &route.endpoint {
            Endpoint::WebSocket(handler) => {
                if !features.websockets {
                    Outcome::Respond(Response::error_page(
                        StatusCode::NotImplemented,
                        "WebSocket support is disabled",
                    ))
                } else if !is_upgrade_request(request) {
                    Outcome::Respond(Response::error_page(
                        StatusCode::BadRequest,
                        "Invalid WebSocket upgrade request",
                    ))
                } else {
                    Outcome::Upgrade(Arc::clone(handler))
                }
            }
            Endpoint::Http(handler) => {
                let ctx = RequestContext {
                    request,
                    route: &route,
                    state: &self.state,
                    session,
                };
                match handler.handle(&ctx) {
                    Ok(response) => Outcome::Respond(response),
                    Err(e) => {
                        tracing::error!(
                            pattern = %route.pattern,
                            error = %e,
                            "Handler failed"
                        );
                        self.state.stats.record_error("handler");
                        Outcome::Respond(
                            self.error_response(StatusCode::InternalServerError, "Handler error"),
                        )
                    }
                }
            }
        }
    }

    /// Generated error page, or the configured custom page for 404 and 500.
    fn error_response(&self, status: StatusCode, message: &str) -> Response {
        let pages = &self.state.config.error_pages;
        let custom = match status {
            StatusCode::NotFound => pages.not_found.as_deref(),
            StatusCode::InternalServerError => pages.internal_error.as_deref(),
            _ => None,
        };
        if let Some(path) = custom {
            match fs::read(path) {
                Ok(body) if !body.is_empty() => return Response::html(status, body),
                Ok(_) => tracing::warn!(path, "Custom error page is empty"),
                Err(e) => tracing::warn!(path, error = %e, "Custom error page unreadable"),
            }
        }
        Response::error_page(status, message)
    }

    /// Add the standard headers to `response`.
    pub fn decorate(&self, response: &mut Response, request_id: Uuid) {
        let features = &self.state.config.features;
        if features.csrf_protection || features.cors {
            add_security_headers(response);
        }
        if features.cors {
            add_cors_headers(response, &self.state.config.security.cors_allowed_origin);
        }
        response.set_header("X-Request-ID", request_id.to_string());
        response.set_header("Connection", "close");
    }

    async fn finish<S>(
        &self,
        stream: &mut S,
        mut response: Response,
        request_id: Uuid,
        method: &str,
        start: Instant,
    ) where
        S: AsyncWrite + Unpin,
    {
        self.decorate(&mut response, request_id);
        let status = response.status.as_u16();
        match write_response(stream, &response).await {
            Ok(sent) => {
                self.state.stats.record_sent(sent);
                metrics::record_request(method, status, start);
                tracing::debug!(request_id = %request_id, status, bytes = sent, "Response sent");
            }
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Failed to write response");
                self.state.stats.record_error("io");
            }
        }
    }
}
