//! Structured logging.
//!
//! # Responsibilities
//! - Install the global tracing subscriber
//! - Take the level from `RUST_LOG`, falling back to the configured level
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - Installing twice is not an error (tests start several servers)

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global subscriber. Returns false if one was already set.
pub fn init(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&config.log_level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

fn default_filter(level: &str) -> String {
    format!("flarepath={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_targets_crate() {
        assert_eq!(default_filter("debug"), "flarepath=debug");
    }
}
