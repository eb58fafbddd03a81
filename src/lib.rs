//! HTTP behavior exerciser library.
//!
//! Reproduces specific pieces of HTTP protocol behavior on demand so that
//! clients, proxies and test harnesses can be checked against known answers.

// Core engine
pub mod auth;
pub mod range;
pub mod routing;
pub mod selection;
pub mod streaming;

// Serving
pub mod error;
pub mod handlers;
pub mod http;
pub mod resources;
pub mod templates;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::ExerciserConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
