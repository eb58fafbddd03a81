//! Basic authentication (RFC 7617).

use axum::http::{header, HeaderMap};
use base64ct::{Base64, Encoding};

/// Decoded `user:password` pair from an `Authorization: Basic` header.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = Base64::decode_vec(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, passwd) = decoded.split_once(':')?;
    Some((user.to_string(), passwd.to_string()))
}

/// True when the request carries exactly `user` / `passwd`.
///
/// A missing header, bad encoding or mismatch all yield `false`.
pub fn check_basic_auth(headers: &HeaderMap, user: &str, passwd: &str) -> bool {
    match basic_credentials(headers) {
        Some((u, p)) => u == user && p == passwd,
        None => false,
    }
}
