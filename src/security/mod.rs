//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-client window, 429 when exceeded)
//!     → csrf.rs (token helpers for handlers)
//! Outgoing response:
//!     → headers.rs (hardening and CORS headers)
//! ```

pub mod csrf;
pub mod headers;
pub mod rate_limit;

pub use rate_limit::RateLimiter;
