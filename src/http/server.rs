//! HTTP server setup and accept loop.
//!
//! # Responsibilities
//! - Build shared state (routes, sessions, rate limiter, counters)
//! - Register the built-in routes
//! - Accept connections and hand each one to the dispatcher on its own task
//! - Stop on shutdown and drain in-flight connections

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::broadcast;

use crate::config::ServerConfig;
use crate::http::dispatcher::Dispatcher;
use crate::http::handlers::register_default_routes;
use crate::net::connection::ConnectionTracker;
use crate::net::listener::{Listener, ListenerError};
use crate::observability::ServerStats;
use crate::routing::RouteTable;
use crate::security::RateLimiter;
use crate::session::{spawn_sweeper, SessionStore};

/// State shared by every connection and handed to handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub routes: Arc<RouteTable>,
    pub sessions: Arc<SessionStore>,
    pub rate_limiter: Arc<RateLimiter>,
    pub stats: Arc<ServerStats>,
    pub started_at: SystemTime,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let sessions = SessionStore::new(
            config.sessions.max_sessions,
            Duration::from_secs(config.sessions.timeout_secs),
        );
        Self {
            routes: Arc::new(RouteTable::with_capacity(config.limits.max_routes)),
            sessions: Arc::new(sessions),
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limit.requests_per_minute)),
            stats: Arc::new(ServerStats::new()),
            started_at: SystemTime::now(),
            config: Arc::new(config),
        }
    }
}

/// The HTTP server.
pub struct HttpServer {
    state: AppState,
    tracker: ConnectionTracker,
}

impl HttpServer {
    /// Create a server with the built-in routes registered.
    pub fn new(config: ServerConfig) -> Self {
        let state = AppState::new(config);
        let registered = register_default_routes(&state.routes, &state.config.features);
        tracing::debug!(registered, "Built-in routes registered");
        Self {
            state,
            tracker: ConnectionTracker::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Route table, for registering application routes before `run`.
    pub fn routes(&self) -> &RouteTable {
        &self.state.routes
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// Accept connections until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        let addr = listener.local_addr().map_err(ListenerError::Bind)?;
        tracing::info!(
            address = %addr,
            routes = self.state.routes.len(),
            "HTTP server starting"
        );

        if self.state.config.features.sessions {
            spawn_sweeper(
                Arc::clone(&self.state.sessions),
                Duration::from_secs(self.state.config.sessions.sweep_interval_secs),
                shutdown.resubscribe(),
            );
        }

        let dispatcher = Arc::new(Dispatcher::new(self.state.clone(), self.tracker.clone()));

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        let dispatcher = Arc::clone(&dispatcher);
                        tokio::spawn(async move {
                            dispatcher.serve(stream, Some(peer)).await;
                            drop(permit);
                        });
                    }
                    Err(ListenerError::Closed) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                },
                _ = shutdown.recv() => {
                    tracing::info!("Stopped accepting connections");
                    break;
                }
            }
        }

        let grace = Duration::from_secs(self.state.config.timeouts.shutdown_grace_secs);
        let in_flight = self.tracker.active_count();
        if tokio::time::timeout(grace, self.tracker.wait_for_shutdown())
            .await
            .is_err()
        {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "Shutdown grace period elapsed with connections open"
            );
        } else if in_flight > 0 {
            tracing::info!(drained = in_flight, "In-flight connections drained");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
