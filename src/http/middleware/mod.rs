//! Request/response middleware.

pub mod cors;
pub mod limit;

pub use cors::cors;
pub use limit::concurrency_limit;
