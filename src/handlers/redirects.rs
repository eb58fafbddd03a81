//! Redirect chains built by reverse construction.
//!
//! `/redirect/<n>` hops through `relative_redirect` (or `absolute_redirect`
//! with `?absolute=true`) until `n` reaches 1, which lands on `get`. Every
//! chain of `n` is followed exactly `n` times.

use crate::error::HandlerError;
use crate::handlers::HandlerResult;
use crate::http::{response, Exchange};
use crate::routing::Params;

fn hops(ex: &Exchange) -> Result<u64, HandlerError> {
    match ex.params.int("n") {
        Some(0) => Err(HandlerError::bad_request("n must be greater than 0")),
        Some(n) => Ok(n),
        None => Err(HandlerError::Internal("route has no 'n' placeholder".into())),
    }
}

/// Location of the next hop of a chain, or of `get` when this is the last one.
fn next_hop(ex: &Exchange, chain: &str, n: u64, absolute: bool) -> Result<String, HandlerError> {
    let (name, params) = if n == 1 {
        ("get", Params::new())
    } else {
        (chain, Params::new().with("n", n - 1))
    };

    if absolute {
        ex.external_url_for(name, &params)
    } else {
        ex.url_for(name, &params)
    }
}

/// `GET /redirect/<n>`
pub async fn redirect_n_times(ex: Exchange) -> HandlerResult {
    let n = hops(&ex)?;
    let absolute = ex
        .query("absolute")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));

    let chain = if absolute {
        "absolute_redirect"
    } else {
        "relative_redirect"
    };
    response::redirect(&next_hop(&ex, chain, n, absolute)?)
}

/// `GET /relative-redirect/<n>`
pub async fn relative_redirect(ex: Exchange) -> HandlerResult {
    let n = hops(&ex)?;
    response::redirect(&next_hop(&ex, "relative_redirect", n, false)?)
}

/// `GET /absolute-redirect/<n>`
pub async fn absolute_redirect(ex: Exchange) -> HandlerResult {
    let n = hops(&ex)?;
    response::redirect(&next_hop(&ex, "absolute_redirect", n, true)?)
}

/// `GET /redirect-to?url=..`: the `Location` is the given URL, unaltered.
pub async fn redirect_to(ex: Exchange) -> HandlerResult {
    let url = ex
        .query("url")
        .ok_or_else(|| HandlerError::bad_request("missing 'url' query parameter"))?;
    response::redirect(&url)
}

#[cfg(test)]
mod tests {
    use crate::handlers::testing;
    use axum::http::{header, StatusCode};

    async fn location(uri: &str) -> String {
        let response = testing::get(uri).await;
        assert_eq!(response.status(), StatusCode::FOUND, "{}", uri);
        response.headers()[header::LOCATION]
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_relative_chain_terminates_after_n_hops() {
        let mut next = "/redirect/3".to_string();
        let mut hops = 0;
        while next != "/get" {
            next = location(&next).await;
            hops += 1;
        }
        assert_eq!(hops, 3);
    }

    #[tokio::test]
    async fn test_single_hop_goes_to_get() {
        assert_eq!(location("/redirect/1").await, "/get");
        assert_eq!(location("/relative-redirect/1").await, "/get");
        assert_eq!(location("/absolute-redirect/1").await, "http://test.local/get");
    }

    #[tokio::test]
    async fn test_absolute_chain() {
        assert_eq!(
            location("/redirect/2?absolute=true").await,
            "http://test.local/absolute-redirect/1"
        );
        assert_eq!(
            location("/absolute-redirect/4").await,
            "http://test.local/absolute-redirect/3"
        );
    }

    #[tokio::test]
    async fn test_zero_is_rejected() {
        assert_eq!(testing::get("/redirect/0").await.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            testing::get("/relative-redirect/0").await.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_redirect_to_is_verbatim() {
        assert_eq!(
            location("/redirect-to?url=http%3A%2F%2Fexample.com%2Fa%3Fb%3Dc").await,
            "http://example.com/a?b=c"
        );
        assert_eq!(testing::get("/redirect-to").await.status(), StatusCode::BAD_REQUEST);
    }
}
