//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: ServerConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("limits.read_buffer ({read_buffer}) must be smaller than limits.max_body ({max_body})")]
    BufferExceedsBody { read_buffer: usize, max_body: usize },

    #[error("limits.max_frame_payload ({0}) exceeds the 16-bit frame length")]
    FramePayloadTooLarge(usize),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let positive = [
        ("listener.max_connections", config.listener.max_connections as u64),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("sessions.max_sessions", config.sessions.max_sessions as u64),
        ("sessions.timeout_secs", config.sessions.timeout_secs),
        ("sessions.sweep_interval_secs", config.sessions.sweep_interval_secs),
        ("rate_limit.requests_per_minute", config.rate_limit.requests_per_minute as u64),
        ("limits.max_routes", config.limits.max_routes as u64),
        ("limits.read_buffer", config.limits.read_buffer as u64),
        ("limits.max_body", config.limits.max_body as u64),
        ("limits.max_frame_payload", config.limits.max_frame_payload as u64),
    ];
    errors.extend(
        positive
            .into_iter()
            .filter(|(_, value)| *value == 0)
            .map(|(field, _)| ValidationError::Zero { field }),
    );

    if config.limits.read_buffer >= config.limits.max_body && config.limits.max_body > 0 {
        errors.push(ValidationError::BufferExceedsBody {
            read_buffer: config.limits.read_buffer,
            max_body: config.limits.max_body,
        });
    }
    if config.limits.max_frame_payload > u16::MAX as usize {
        errors.push(ValidationError::FramePayloadTooLarge(
            config.limits.max_frame_payload,
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
