//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, catch-all dispatch)
//!     → request.rs (Exchange: buffered request + typed route params)
//!     → handlers (endpoint semantics)
//!     → response.rs / compression.rs (uniform bodies, gzip/deflate)
//!     → Send to client
//! ```

pub mod compression;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{Exchange, X_REQUEST_ID};
pub use server::{AppContext, HttpServer};
