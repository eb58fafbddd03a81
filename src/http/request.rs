//! Request-side view handed to endpoint handlers.
//!
//! # Responsibilities
//! - Carry one fully-read request (method, target, headers, body, peer)
//! - Expose the typed parameters resolved by the dispatcher
//! - Query, header and URL helpers shared by every endpoint
//!
//! # Design Decisions
//! - The body is read once, before dispatch; handlers never touch the wire
//! - Query lookups are case-insensitive on the key and take the first value
//! - Absolute URLs are built from the `Host` header, falling back to the peer address

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, Method, Uri};

use crate::error::HandlerError;
use crate::http::server::AppContext;
use crate::routing::Params;
use crate::selection::RandomSource;

/// Request ID header set on every request and echoed on every response.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// One inbound request after dispatch.
pub struct Exchange {
    pub ctx: Arc<AppContext>,
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub client_addr: SocketAddr,
    /// Typed placeholder values of the matched route.
    pub params: Params,
    /// Name of the matched route.
    pub route: String,
}

impl Exchange {
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Request target as sent: path plus query.
    pub fn path_and_query(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.uri.path())
    }

    /// Decoded query pairs in request order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(self.uri.query().unwrap_or("").as_bytes())
            .into_owned()
            .collect()
    }

    /// First value for `key`, compared case-insensitively.
    pub fn query(&self, key: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    pub fn has_query(&self, key: &str) -> bool {
        self.query(key).is_some()
    }

    /// Parse a query value, using `default` when absent.
    pub fn query_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, HandlerError> {
        match self.query(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| {
                HandlerError::bad_request(format!("invalid value for '{}': {}", key, raw))
            }),
        }
    }

    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Client address as reported by a forwarding proxy, or the peer IP.
    pub fn origin(&self) -> String {
        self.header("x-forwarded-for")
            .map(str::to_string)
            .unwrap_or_else(|| self.client_addr.ip().to_string())
    }

    pub fn host(&self) -> String {
        self.header(header::HOST)
            .map(str::to_string)
            .unwrap_or_else(|| self.client_addr.to_string())
    }

    /// Absolute URL of this request.
    pub fn url(&self) -> String {
        format!("http://{}{}", self.host(), self.path_and_query())
    }

    /// Path of another route, built by reverse construction.
    pub fn url_for(&self, name: &str, params: &Params) -> Result<String, HandlerError> {
        Ok(self.ctx.routes.reverse(name, params)?)
    }

    /// Absolute URL of another route on the host this request addressed.
    pub fn external_url_for(&self, name: &str, params: &Params) -> Result<String, HandlerError> {
        Ok(format!("http://{}{}", self.host(), self.url_for(name, params)?))
    }

    /// Random source for this request, request-scoped when `seed` is given.
    pub fn random(&self) -> Result<Box<dyn RandomSource>, HandlerError> {
        let seed = match self.query("seed") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                HandlerError::bad_request(format!("invalid seed: {}", raw))
            })?),
            None => None,
        };
        Ok(self.ctx.random.for_request(seed))
    }
}
