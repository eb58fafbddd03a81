//! Per-request spans.
//!
//! # Responsibilities
//! - Create one span per inbound request for `TraceLayer`
//! - Attach the request ID so every log line of a request correlates
//!
//! # Design Decisions
//! - The request ID layer runs before the trace layer, so the header is always set here

use axum::body::Body;
use axum::http::Request;

use crate::http::X_REQUEST_ID;

/// Span factory for `TraceLayer::make_span_with`.
pub fn request_span(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}
