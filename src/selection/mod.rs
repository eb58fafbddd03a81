//! Randomized outcome selection.
//!
//! # Data Flow
//! ```text
//! handler (e.g. /status/200:1,500:9, /bytes/<n>?seed=..)
//!     → random.rs (RandomSource: shared process generator, or request-scoped when seeded)
//!     → weighted.rs (cumulative-weight walk over (outcome, weight) pairs)
//!     → outcome
//! ```
//!
//! # Design Decisions
//! - An explicit seed never touches the shared generator; it builds a request-scoped one
//! - The shared generator sits behind a Mutex and is only locked per draw
//! - Choice sets are validated before any randomness is consumed

pub mod random;
pub mod weighted;

pub use random::{RandomSource, SeededRandom, SharedRandom};
pub use weighted::{select, SelectionError};
