//! Byte-range resolution for range-serving endpoints.
//!
//! # Data Flow
//! ```text
//! Range header + total length (clamped to the configured cap)
//!     → resolver.rs (parse single range, validate bounds)
//!     → Satisfiable(first, last) | NoRangeRequested | Unsatisfiable
//!     → handler: 200/206 + Content-Range, or 416 + "bytes */N"
//!     → streaming producer over first..=last with deterministic_byte
//! ```
//!
//! # Design Decisions
//! - Single range only; multi-range and malformed headers are unsatisfiable
//! - Content is a pure function of absolute position, independent of any RNG seed
//! - Bounds are never clamped into range: out-of-bounds requests are rejected

pub mod resolver;

pub use resolver::{clamp_length, deterministic_byte, resolve, ByteRange, RangeResolution};
