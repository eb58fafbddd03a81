//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, caps > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ExerciserConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ExerciserConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    MustBePositive { field: &'static str },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

/// Check every semantic rule and collect all violations.
pub fn validate_config(config: &ExerciserConfig) -> Result<(), Vec<ValidationError>> {
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

    let positive: [(&'static str, bool); 8] = [
        ("listener.max_connections", config.listener.max_connections > 0),
        ("timeouts.request_secs", config.timeouts.request_secs > 0),
        ("limits.max_bytes", config.limits.max_bytes > 0),
        ("limits.max_stream_messages", config.limits.max_stream_messages > 0),
        ("limits.default_chunk_size", config.limits.default_chunk_size > 0),
        ("limits.max_links", config.limits.max_links > 0),
        ("limits.max_drip_bytes", config.limits.max_drip_bytes > 0),
        ("limits.max_body_bytes", config.limits.max_body_bytes > 0),
    ];
    for (field, ok) in positive {
        if !ok {
            errors.push(ValidationError::MustBePositive { field });
        }
    }
    if !(config.limits.max_delay_secs.is_finite() && config.limits.max_delay_secs > 0.0) {
        errors.push(ValidationError::MustBePositive {
            field: "limits.max_delay_secs",
        });
    }

    if config.auth.basic_realm.is_empty() {
        errors.push(ValidationError::Empty {
            field: "auth.basic_realm",
        });
    }
    if config.auth.digest_realm.is_empty() {
        errors.push(ValidationError::Empty {
            field: "auth.digest_realm",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
