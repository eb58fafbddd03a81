//! Status code endpoints.
//!
//! # Responsibilities
//! - `/status/<codes>`: one code, or a weighted random pick among `code[:weight],...`
//! - Canned headers and bodies for codes that conventionally carry them
//! - `/response-headers`: query pairs echoed as headers and as JSON
//!
//! # Design Decisions
//! - Zero weights are dropped before selection, so they can never be picked
//! - A set with nothing left is a selector error (500), not a client error
//! - The echoed `Content-Length` is iterated to a fixed point, at most 8 times

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use serde_json::json;

use crate::error::HandlerError;
use crate::handlers::inspect::semiflatten;
use crate::handlers::HandlerResult;
use crate::http::{response, Exchange};
use crate::routing::Params;
use crate::selection::select;

const ACCEPTED_MEDIA_TYPES: &[&str] = &[
    "image/webp",
    "image/svg+xml",
    "image/jpeg",
    "image/png",
    "image/*",
];

const TEAPOT: &str = r#"
    -=[ teapot ]=-

       _...._
     .'  _ _ `.
    | ."` ^ `". _,
    \_;`"---"`|//
      |       ;/
      \_     _/
        `"""`
"#;

const MAX_HEADER_PASSES: usize = 8;

/// Parse `/status/<codes>` into a choice set. Zero weights are dropped.
pub(crate) fn parse_choices(codes: &str) -> Result<Vec<(u16, f64)>, HandlerError> {
    let invalid = || HandlerError::bad_request(format!("invalid status code list: {}", codes));

    let mut choices = Vec::new();
    for choice in codes.split(',') {
        let (code, weight) = match choice.split_once(':') {
            Some((code, weight)) => {
                let weight: f64 = weight.trim().parse().map_err(|_| invalid())?;
                (code, weight)
            }
            None => (choice, 1.0),
        };
        let code: u16 = code.trim().parse().map_err(|_| invalid())?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(invalid());
        }
        if weight > 0.0 {
            choices.push((code, weight));
        }
    }
    Ok(choices)
}

/// Response for `code`, with the canned extras some codes carry.
pub(crate) fn status_code(ex: &Exchange, code: u16) -> HandlerResult {
    let status = StatusCode::from_u16(code)
        .map_err(|_| HandlerError::bad_request(format!("invalid status code: {}", code)))?;

    let realm = format!("Basic realm=\"{}\"", ex.ctx.config.auth.basic_realm);
    let response = match code {
        301 | 302 | 303 | 305 | 307 => {
            let location = ex.url_for("redirect", &Params::new().with("n", 1u64))?;
            let mut r = response::empty(status);
            r.headers_mut()
                .insert(header::LOCATION, response::header_value(&location)?);
            r
        }
        401 => {
            let mut r = response::empty(status);
            r.headers_mut()
                .insert(header::WWW_AUTHENTICATE, response::header_value(&realm)?);
            r
        }
        402 => {
            let mut r = response::with_type(status, response::TEXT, "Pay me!\n");
            r.headers_mut().insert(
                "x-more-info",
                HeaderValue::from_static("http://vimeo.com/22053820"),
            );
            r
        }
        406 => response::json_status(
            status,
            &json!({
                "message": "Client did not request a supported media type.",
                "accept": ACCEPTED_MEDIA_TYPES,
            }),
        ),
        407 => {
            let mut r = response::empty(status);
            r.headers_mut()
                .insert(header::PROXY_AUTHENTICATE, response::header_value(&realm)?);
            r
        }
        418 => {
            let mut r = response::with_type(status, response::TEXT, TEAPOT);
            r.headers_mut().insert(
                "x-more-info",
                HeaderValue::from_static("http://tools.ietf.org/html/rfc2324"),
            );
            r
        }
        _ => response::empty(status),
    };

    tracing::trace!(
        code,
        reason = status.canonical_reason().unwrap_or("unknown"),
        "Status response"
    );
    Ok(response)
}

/// `/status/<codes>`
pub async fn status(ex: Exchange) -> HandlerResult {
    let codes = ex.params.str("codes").unwrap_or("").to_string();
    let choices = parse_choices(&codes)?;

    let code = match choices.as_slice() {
        [(only, _)] => *only,
        _ => {
            let mut rng = ex.random()?;
            *select(&choices, rng.as_mut())?
        }
    };

    status_code(&ex, code)
}

/// `GET /response-headers?Name=value&...`
pub async fn response_headers(ex: Exchange) -> HandlerResult {
    let pairs = ex.query_pairs();
    let overrides_type = pairs
        .iter()
        .any(|(k, _)| k.eq_ignore_ascii_case("content-type"));

    let render = |content_length: usize| {
        let mut doc = Vec::with_capacity(pairs.len() + 2);
        if !overrides_type {
            doc.push(("Content-Type".to_string(), response::JSON.to_string()));
        }
        doc.push(("Content-Length".to_string(), content_length.to_string()));
        doc.extend(pairs.iter().cloned());
        response::json_text(&semiflatten(doc))
    };

    let mut shown = 0;
    let mut body = render(shown);
    let mut passes = 1;
    while body.len() != shown && passes < MAX_HEADER_PASSES {
        shown = body.len();
        body = render(shown);
        passes += 1;
    }
    if body.len() != shown {
        tracing::debug!(passes, "Content-Length echo did not converge");
    }

    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(response::JSON));

    let mut type_replaced = false;
    for (key, value) in &pairs {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| HandlerError::bad_request(format!("invalid header name: {:?}", key)))?;
        let value = response::header_value(value)?;
        // Framing is owned by the server; these stay in the echo only
        if name == header::CONTENT_LENGTH || name == header::TRANSFER_ENCODING {
            tracing::debug!(header = %name, "Skipping framing header");
            continue;
        }
        if name == header::CONTENT_TYPE && !type_replaced {
            headers.insert(name, value);
            type_replaced = true;
        } else {
            headers.append(name, value);
        }
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn test_parse_choices() {
        assert_eq!(parse_choices("418").unwrap(), vec![(418, 1.0)]);
        assert_eq!(
            parse_choices("200:1,500:9").unwrap(),
            vec![(200, 1.0), (500, 9.0)]
        );
        assert_eq!(parse_choices("200,201:0,202").unwrap(), vec![(200, 1.0), (202, 1.0)]);
        assert!(parse_choices("abc").is_err());
        assert!(parse_choices("200:x").is_err());
        assert!(parse_choices("200:-1").is_err());
        assert!(parse_choices("200:inf").is_err());
        assert!(parse_choices("200:0").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_code() {
        let response = testing::get("/status/204").await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let teapot = testing::get("/status/418").await;
        assert_eq!(teapot.status(), StatusCode::IM_A_TEAPOT);
        assert!(teapot.headers().contains_key("x-more-info"));
        let body = testing::body(teapot).await;
        assert!(String::from_utf8_lossy(&body).contains("teapot"));
    }

    #[tokio::test]
    async fn test_canned_headers() {
        let redirect = testing::get("/status/302").await;
        assert_eq!(redirect.headers()[header::LOCATION], "/redirect/1");

        let unauthorized = testing::get("/status/401").await;
        assert_eq!(
            unauthorized.headers()[header::WWW_AUTHENTICATE],
            "Basic realm=\"Fake Realm\""
        );

        let not_acceptable = testing::json(testing::get("/status/406").await).await;
        assert_eq!(not_acceptable["accept"][0], "image/webp");
    }

    #[tokio::test]
    async fn test_invalid_codes() {
        assert_eq!(testing::get("/status/abc").await.status(), StatusCode::BAD_REQUEST);
        assert_eq!(testing::get("/status/1000").await.status(), StatusCode::BAD_REQUEST);
        assert_eq!(testing::get("/status/99").await.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            testing::get("/status/200:0,500:0").await.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_weighted_distribution() {
        let router = testing::router();
        let trials = 1_000;
        let mut server_errors = 0;
        for _ in 0..trials {
            let response = router
                .clone()
                .oneshot(Request::get("/status/200:1,500:9").body(Body::empty()).unwrap())
                .await
                .unwrap();
            match response.status() {
                StatusCode::INTERNAL_SERVER_ERROR => server_errors += 1,
                StatusCode::OK => {}
                other => panic!("unexpected status {}", other),
            }
        }
        let ratio = server_errors as f64 / trials as f64;
        assert!((0.85..0.95).contains(&ratio), "ratio {}", ratio);
    }

    #[tokio::test]
    async fn test_zero_weight_never_chosen() {
        let router = testing::router();
        for _ in 0..200 {
            let response = router
                .clone()
                .oneshot(Request::get("/status/200:0,201:1,202:1").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_ne!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_response_headers_fixed_point() {
        let response = testing::get("/response-headers?X-Test=1&X-Test=2&Server=exerciser").await;
        assert_eq!(response.status(), StatusCode::OK);
        let values: Vec<_> = response.headers().get_all("x-test").iter().collect();
        assert_eq!(values, vec!["1", "2"]);
        assert_eq!(response.headers()["server"], "exerciser");

        let body = testing::body(response).await;
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(doc["Content-Length"], body.len().to_string());
        assert_eq!(doc["X-Test"], json!(["1", "2"]));
        assert_eq!(doc["Content-Type"], "application/json");
    }

    #[tokio::test]
    async fn test_response_headers_keeps_framing() {
        let response =
            testing::get("/response-headers?Content-Length=3&Transfer-Encoding=chunked").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get_all(header::CONTENT_LENGTH)
            .iter()
            .all(|v| v != "3"));
        assert!(!response.headers().contains_key(header::TRANSFER_ENCODING));

        let body = testing::body(response).await;
        assert!(body.len() > 3);
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(doc["Transfer-Encoding"], "chunked");
    }

    #[tokio::test]
    async fn test_response_headers_content_type_override() {
        let response = testing::get("/response-headers?Content-Type=text/plain").await;
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        let values: Vec<_> = response.headers().get_all(header::CONTENT_TYPE).iter().collect();
        assert_eq!(values.len(), 1);
    }
}
