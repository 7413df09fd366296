//! flarepath: an embeddable HTTP/1.1 server library.
//!
//! Raw bytes become a `Request`, a route table picks a handler, and the
//! handler's `Response` is written back. WebSocket upgrades, an expiring
//! session table and a handful of content helpers come along.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod net;
pub mod routing;
pub mod session;

// Handler helpers
pub mod content;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::ServerConfig;
pub use error::{Error, Result};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
