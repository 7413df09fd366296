//! Error taxonomy shared by the parser, router, WebSocket codec and session store.
//!
//! # Design Decisions
//! - One enum for the request path so the dispatcher can map any failure to a status
//! - Capacity and not-found conditions are ordinary `Err` values, never panics
//! - Config and listener failures keep their own error types

use thiserror::Error;

use crate::http::message::{Method, StatusCode};

/// Errors produced while handling a connection.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad request line or missing line terminator.
    #[error("malformed message: {0}")]
    MalformedMessage(&'static str),

    /// Request line carried a method we do not serve.
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    /// Declared `Content-Length` is at or above the configured limit.
    #[error("body of {length} bytes exceeds limit of {limit} bytes")]
    BodyTooLarge { length: usize, limit: usize },

    /// No registered route matched the request.
    #[error("no route matched {method} {path}")]
    NoRouteMatched { method: Method, path: String },

    /// A route handler reported an internal failure.
    #[error("handler failed: {0}")]
    HandlerFailure(String),

    /// Missing or invalid WebSocket upgrade headers.
    #[error("websocket upgrade rejected: {0}")]
    UpgradeRejected(&'static str),

    /// 64-bit length, unknown opcode or oversized payload.
    #[error("unsupported frame: {0}")]
    FrameUnsupported(String),

    /// Peer sent a close frame or disconnected.
    #[error("connection closed")]
    ConnectionClosed,

    /// A bounded table is full.
    #[error("{resource} is full ({capacity} entries)")]
    CapacityExceeded {
        resource: &'static str,
        capacity: usize,
    },

    /// Lookup of a route, session or path parameter failed.
    #[error("{0} not found")]
    NotFound(String),

    /// Request body could not be interpreted.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Status code the dispatcher answers with for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::MalformedMessage(_)
            | Error::UnsupportedMethod(_)
            | Error::UpgradeRejected(_)
            | Error::InvalidBody(_) => StatusCode::BadRequest,
            Error::BodyTooLarge { .. } => StatusCode::PayloadTooLarge,
            Error::NoRouteMatched { .. } | Error::NotFound(_) => StatusCode::NotFound,
            Error::CapacityExceeded { .. } => StatusCode::ServiceUnavailable,
            Error::HandlerFailure(_)
            | Error::FrameUnsupported(_)
            | Error::ConnectionClosed
            | Error::Io(_) => StatusCode::InternalServerError,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
