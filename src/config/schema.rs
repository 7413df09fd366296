//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.
//! Every section is defaulted, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Filesystem locations for documents, templates and static files.
    pub paths: PathsConfig,

    /// Optional request-handling features.
    pub features: FeatureConfig,

    /// Security header settings.
    pub security: SecurityConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Session store settings.
    pub sessions: SessionConfig,

    /// Table sizes and buffer limits.
    pub limits: LimitsConfig,

    /// Custom error page files.
    pub error_pages: ErrorPagesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 1_000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to receive a request, in seconds.
    pub request_secs: u64,

    /// Time allowed for in-flight connections after shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_grace_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    pub document_root: String,
    pub template_directory: String,
    pub static_directory: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            document_root: "./www".to_string(),
            template_directory: "./templates".to_string(),
            static_directory: "./static".to_string(),
        }
    }
}

/// Feature switches consulted by the dispatcher.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub sessions: bool,
    pub websockets: bool,
    pub cors: bool,
    pub csrf_protection: bool,
    pub rate_limiting: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sessions: true,
            websockets: true,
            cors: false,
            csrf_protection: false,
            rate_limiting: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Value of `Access-Control-Allow-Origin` when CORS is enabled.
    pub cors_allowed_origin: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_allowed_origin: "*".to_string(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per client per minute.
    pub requests_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum live sessions.
    pub max_sessions: usize,

    /// Idle time after which a session expires, in seconds.
    pub timeout_secs: u64,

    /// Interval of the background expiry sweep, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: 1024,
            timeout_secs: 3600,
            sweep_interval_secs: 300,
        }
    }
}

/// Table sizes and buffer limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Route table capacity.
    pub max_routes: usize,

    /// Size of the single request read, in bytes.
    pub read_buffer: usize,

    /// Declared bodies at or above this size are rejected.
    pub max_body: usize,

    /// Largest WebSocket payload accepted from a peer.
    pub max_frame_payload: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_routes: 256,
            read_buffer: 16 * 1024,
            max_body: 10 * 1024 * 1024,
            max_frame_payload: 65_535,
        }
    }
}

/// Files served instead of the generated error pages.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ErrorPagesConfig {
    pub not_found: Option<String>,
    pub internal_error: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.limits.max_routes, 256);
        assert_eq!(config.limits.read_buffer, 16384);
        assert_eq!(config.sessions.timeout_secs, 3600);
        assert!(config.features.sessions);
        assert!(config.error_pages.not_found.is_none());
    }

    #[test]
    fn partial_sections_are_merged_with_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [features]
            cors = true

            [sessions]
            max_sessions = 8

            [error_pages]
            not_found = "www/404.html"
            "#,
        )
        .unwrap();
        assert!(config.features.cors);
        assert!(config.features.websockets);
        assert_eq!(config.sessions.max_sessions, 8);
        assert_eq!(config.sessions.timeout_secs, 3600);
        assert_eq!(config.error_pages.not_found.as_deref(), Some("www/404.html"));
    }
}
