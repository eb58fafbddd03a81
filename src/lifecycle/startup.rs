//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration, then apply command-line overrides
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - No config file means defaults, not an error
//! - Overrides are re-validated with the rest of the config

use std::path::Path;

use crate::config::{load_config, validate_config, ConfigError, ExerciserConfig};

/// Build the effective configuration.
pub fn resolve_config(
    path: Option<&Path>,
    bind_override: Option<&str>,
) -> Result<ExerciserConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => ExerciserConfig::default(),
    };

    if let Some(bind) = bind_override {
        config.listener.bind_address = bind.to_string();
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    Ok(config)
}
