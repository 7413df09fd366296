//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher and stores produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms via the metrics facade)
//!     → stats.rs (atomic counters served at /api/stats)
//!
//! Consumers:
//!     → stdout log lines
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through log fields and the X-Request-ID header
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
pub mod stats;

pub use stats::{ServerStats, StatsSnapshot};
