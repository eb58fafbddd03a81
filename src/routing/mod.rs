//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route lookup, first registered first tried)
//!     → matcher.rs (walk compiled segment descriptors)
//!     → Return: Matched { route, params } | NotFound | MethodNotAllowed
//!
//! Route Registration (at startup):
//!     handlers::register_all
//!     → matcher.rs compiles "/links/<int:n>/<int:offset>" into segments
//!     → router.rs stores the route under its unique name
//!     → Table frozen behind an Arc, immutable at runtime
//!
//! Reverse Construction:
//!     (name, params) → router.rs → matcher.rs renders the same segments
//! ```
//!
//! # Design Decisions
//! - No regex: templates compile to an ordered list of literal/placeholder segments
//! - Placeholder types are fixed at registration and never widened at match time
//! - A placeholder that fails to parse rejects the template, not the request
//! - Forward matching and reverse construction share the same descriptors

pub mod matcher;
pub mod router;

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub use matcher::{PathTemplate, Placeholder, Segment};
pub use router::{MatchResult, Route, RouteMatch, RouteTable};

/// Errors raised by route registration and reverse construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// The template is malformed or the route name is already taken.
    #[error("route configuration error: {0}")]
    ConfigurationError(String),

    /// Reverse construction asked for a name that was never registered.
    #[error("no route named '{0}'")]
    RouteNotFound(String),

    /// Reverse construction received missing, extra or mistyped parameters.
    #[error("parameter mismatch for route '{route}': {reason}")]
    ParameterMismatch { route: String, reason: String },
}

/// A typed value bound to a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamValue {
    /// Non-negative integer from an `<int:..>` placeholder.
    Int(u64),
    /// Percent-decoded text from a string or path placeholder.
    Str(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<u64> for ParamValue {
    fn from(v: u64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// Placeholder name to typed value mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Integer value of `name`, if bound to an integer.
    pub fn int(&self, name: &str) -> Option<u64> {
        match self.0.get(name) {
            Some(ParamValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Text value of `name`, if bound to a string.
    pub fn str(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(ParamValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}
