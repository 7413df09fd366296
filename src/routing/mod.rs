//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (pass 1: literal pattern equal to the path)
//!     → router.rs (pass 2: first `*` / `{name}` pattern that matches)
//!     → matcher.rs (glob expansion, parameter extraction)
//!     → Return: cloned Route or NoRouteMatched
//! ```
//!
//! # Design Decisions
//! - Routes can be registered and removed at runtime
//! - Deterministic: registration order decides ties within a pass
//! - No regex in the hot path

pub mod handler;
pub mod matcher;
pub mod router;

pub use handler::{Handler, RequestContext};
pub use router::{Endpoint, Route, RouteInfo, RouteKind, RouteTable, MAX_ROUTES};
