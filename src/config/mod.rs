//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ExerciserConfig (validated, immutable)
//!     → CLI overrides (--bind)
//!     → shared via Arc<AppContext> to every handler
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AuthConfig, CorsConfig, ExerciserConfig, LimitsConfig, ListenerConfig, ObservabilityConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
