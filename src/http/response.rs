//! Response construction helpers.
//!
//! # Responsibilities
//! - Uniform JSON bodies (pretty printed, trailing newline)
//! - Redirects and plain bodies with a fixed content type
//!
//! # Design Decisions
//! - Helpers are infallible where the inputs cannot produce an invalid response
//! - Client-supplied header values go through `header_value`, which rejects control characters

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::error::HandlerError;

pub const JSON: &str = "application/json";
pub const HTML: &str = "text/html; charset=utf-8";
pub const TEXT: &str = "text/plain; charset=utf-8";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Serialize a JSON document the way every endpoint renders it.
pub fn json_text(value: &Value) -> String {
    format!("{:#}\n", value)
}

/// 200 with a JSON body.
pub fn json(value: &Value) -> Response {
    json_status(StatusCode::OK, value)
}

pub fn json_status(status: StatusCode, value: &Value) -> Response {
    with_type(status, JSON, json_text(value))
}

/// Response with a body and explicit content type.
pub fn with_type(status: StatusCode, content_type: &'static str, body: impl Into<Body>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static(content_type))],
        body.into(),
    )
        .into_response()
}

/// Status only, empty body.
pub fn empty(status: StatusCode) -> Response {
    (status, Body::empty()).into_response()
}

/// Header value from text that may originate from the client.
pub fn header_value(value: &str) -> Result<HeaderValue, HandlerError> {
    HeaderValue::from_str(value)
        .map_err(|_| HandlerError::bad_request(format!("invalid header value: {:?}", value)))
}

/// 302 to `location`, emitted verbatim.
pub fn redirect(location: &str) -> Result<Response, HandlerError> {
    let mut response = empty(StatusCode::FOUND);
    response
        .headers_mut()
        .insert(header::LOCATION, header_value(location)?);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_body_is_pretty_with_newline() {
        let text = json_text(&json!({"a": 1}));
        assert_eq!(text, "{\n  \"a\": 1\n}\n");

        let response = json(&json!({}));
        assert_eq!(response.headers()[header::CONTENT_TYPE], JSON);
    }

    #[test]
    fn test_redirect_rejects_control_characters() {
        let response = redirect("/get").unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/get");

        assert!(matches!(
            redirect("/a\r\nSet-Cookie: x=y"),
            Err(HandlerError::BadRequest(_))
        ));
    }
}
