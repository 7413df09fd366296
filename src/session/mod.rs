//! Session management.
//!
//! Sessions are identified by the `session_id` cookie, looked up by the
//! dispatcher and handed to handlers as snapshots.

pub mod store;

pub use store::{spawn_sweeper, Clock, ManualClock, Session, SessionStore, SystemClock};
