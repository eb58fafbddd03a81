//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the exerciser.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the exerciser.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ExerciserConfig {
    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Caps applied to client-controlled sizes and delays.
    pub limits: LimitsConfig,

    /// Realms advertised by the auth endpoints.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// CORS header injection.
    pub cors: CorsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrently served requests (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed until response headers are produced, in seconds.
    /// Streaming bodies are not bounded by it.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Limits on client-controlled parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Cap for `/bytes`, `/stream-bytes` and `/range` lengths.
    pub max_bytes: u64,

    /// Cap for `/stream/<n>` messages.
    pub max_stream_messages: u64,

    /// Cap for `/delay/<secs>` and drip delays, in seconds.
    pub max_delay_secs: f64,

    /// Default chunk size for byte streams.
    pub default_chunk_size: u64,

    /// Cap for `/links/<n>`.
    pub max_links: u64,

    /// Cap for `/drip?numbytes=`.
    pub max_drip_bytes: u64,

    /// Largest request body read into memory.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_bytes: 100 * 1024,
            max_stream_messages: 100,
            max_delay_secs: 10.0,
            default_chunk_size: 10 * 1024,
            max_links: 200,
            max_drip_bytes: 10 * 1024 * 1024,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Authentication realms.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    pub basic_realm: String,
    pub digest_realm: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            basic_realm: "Fake Realm".to_string(),
            digest_realm: "me@kennethreitz.com".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Emit JSON log lines instead of the human format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "http_exerciser=info,tower_http=info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
