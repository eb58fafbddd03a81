//! Lazy, paced response bodies.
//!
//! # Data Flow
//! ```text
//! handler intent ("emit N units, chunk size C, pacing P")
//!     → producer.rs (BodyProducer: pull-based next_chunk)
//!     → futures Stream adapter
//!     → axum Body (transport pulls one chunk at a time)
//! ```
//!
//! # Design Decisions
//! - At most one chunk in flight; nothing is buffered ahead of the consumer
//! - The only suspension points are the pacing sleep and the consumer pull
//! - Dropping the body (client gone) drops the producer: no further sleeps or unit calls

pub mod producer;

pub use producer::{BodyProducer, Chunk, Pacing};
