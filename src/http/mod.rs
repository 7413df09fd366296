//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (accept loop, one task per connection)
//!     → dispatcher.rs (orchestrates one request)
//!         → parser.rs (bytes → Request)
//!         → routing (Request → Route)
//!         → handler or websocket.rs (upgrade + frame loop)
//!         → response.rs (Response → bytes)
//!     → Close connection
//! ```

pub mod dispatcher;
pub mod handlers;
pub mod message;
pub mod parser;
pub mod response;
pub mod server;
pub mod websocket;

pub use message::{ContentType, Header, Method, Request, Response, StatusCode};
pub use server::{AppState, HttpServer};
