//! Endpoints whose answer depends on time, request headers or parameters.
//!
//! # Responsibilities
//! - `/delay/<delay>`: sleep, capped, then echo
//! - `/base64/<value>`: URL-safe base64 decoding
//! - `/cache`, `/cache/<value>`: conditional requests and `Cache-Control`
//! - `/links/<n>/<offset>`: pages of links built by reverse construction

use std::time::SystemTime;

use axum::http::{header, HeaderValue, StatusCode};
use base64ct::{Base64Url, Base64UrlUnpadded, Encoding};
use serde_json::Value;
use uuid::Uuid;

use crate::error::HandlerError;
use crate::handlers::inspect::{get_dict, Field};
use crate::handlers::{streams, HandlerResult};
use crate::http::{response, Exchange};
use crate::routing::Params;

/// `GET /delay/<delay>`
pub async fn delay(ex: Exchange) -> HandlerResult {
    let raw = ex.params.str("delay").unwrap_or("");
    let requested: f64 = raw
        .parse()
        .ok()
        .filter(|d: &f64| d.is_finite())
        .ok_or_else(|| HandlerError::bad_request(format!("invalid delay: {}", raw)))?;
    let seconds = requested.min(ex.ctx.config.limits.max_delay_secs).max(0.0);

    tracing::debug!(requested, seconds, "Delaying response");
    tokio::time::sleep(streams::seconds(seconds)).await;

    let dict = get_dict(
        &ex,
        &[
            Field::Url,
            Field::Args,
            Field::Form,
            Field::Data,
            Field::Origin,
            Field::Headers,
            Field::Files,
        ],
    );
    Ok(response::json(&Value::Object(dict)))
}

/// `GET /base64/<value>`: padding is optional.
pub async fn base64(ex: Exchange) -> HandlerResult {
    let value = ex.params.str("value").unwrap_or("");
    let decoded = Base64Url::decode_vec(value)
        .or_else(|_| Base64UrlUnpadded::decode_vec(value))
        .map_err(|_| HandlerError::bad_request(format!("incorrect base64 data: {}", value)))?;

    Ok(response::with_type(
        StatusCode::OK,
        response::HTML,
        String::from_utf8_lossy(&decoded).into_owned(),
    ))
}

/// `GET /cache`: 304 for any conditional request.
pub async fn cache(ex: Exchange) -> HandlerResult {
    let conditional = ex.headers.contains_key(header::IF_MODIFIED_SINCE)
        || ex.headers.contains_key(header::IF_NONE_MATCH);
    if conditional {
        return Ok(response::empty(StatusCode::NOT_MODIFIED));
    }

    let dict = get_dict(&ex, &[Field::Url, Field::Args, Field::Headers, Field::Origin]);
    let mut response = response::json(&Value::Object(dict));
    let headers = response.headers_mut();
    headers.insert(
        header::LAST_MODIFIED,
        response::header_value(&httpdate::fmt_http_date(SystemTime::now()))?,
    );
    headers.insert(
        header::ETAG,
        response::header_value(&Uuid::new_v4().simple().to_string())?,
    );
    Ok(response)
}

/// `GET /cache/<value>`
pub async fn cache_control(ex: Exchange) -> HandlerResult {
    let seconds = ex.params.int("value").unwrap_or(0);
    let dict = get_dict(&ex, &[Field::Url, Field::Args, Field::Headers, Field::Origin]);
    let mut response = response::json(&Value::Object(dict));
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        response::header_value(&format!("public, max-age={}", seconds))?,
    );
    Ok(response)
}

/// `GET /links/<n>`: first page.
pub async fn links(ex: Exchange) -> HandlerResult {
    let n = ex.params.int("n").unwrap_or(1);
    let location = ex.url_for("link_page", &Params::new().with("n", n).with("offset", 0u64))?;
    response::redirect(&location)
}

/// `GET /links/<n>/<offset>`: `n` links, all but `offset` clickable.
pub async fn link_page(ex: Exchange) -> HandlerResult {
    let n = ex
        .params
        .int("n")
        .unwrap_or(1)
        .min(ex.ctx.config.limits.max_links)
        .max(1);
    let offset = ex.params.int("offset").unwrap_or(0);

    let mut html = String::from("<html><head><title>Links</title></head><body>");
    for i in 0..n {
        if i == offset {
            html.push_str(&format!("{} ", i));
        } else {
            let href = ex.url_for("link_page", &Params::new().with("n", n).with("offset", i))?;
            html.push_str(&format!("<a href='{}'>{}</a> ", href, i));
        }
    }
    html.push_str("</body></html>");

    let mut response = response::with_type(StatusCode::OK, response::HTML, html);
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    Ok(response)
}

#[cfg(test)]
mod tests {
    use crate::handlers::testing;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};

    #[tokio::test(start_paused = true)]
    async fn test_delay_echoes_after_sleep() {
        let response = testing::get("/delay/2?x=1").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = testing::json(response).await;
        assert_eq!(body["args"]["x"], "1");
        assert!(body.get("files").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_with_huge_cap_does_not_panic() {
        use crate::config::ExerciserConfig;
        use crate::http::HttpServer;
        use crate::selection::SharedRandom;
        use tower::ServiceExt;

        let mut config = ExerciserConfig::default();
        config.limits.max_delay_secs = 1e300;
        let router = HttpServer::with_random(config, SharedRandom::seeded(1))
            .unwrap()
            .router();

        let response = router
            .oneshot(Request::get("/delay/1e300").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_delay_rejects_garbage() {
        assert_eq!(testing::get("/delay/soon").await.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_base64_decodes_url_safe() {
        let response = testing::get("/base64/SFRUUEJJTiBpcyBhd2Vzb21l").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(&testing::body(response).await[..], b"HTTPBIN is awesome");

        let padded = testing::get("/base64/aGk=").await;
        assert_eq!(&testing::body(padded).await[..], b"hi");
        let unpadded = testing::get("/base64/aGk").await;
        assert_eq!(&testing::body(unpadded).await[..], b"hi");

        assert_eq!(testing::get("/base64/!!!").await.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cache_conditional() {
        let fresh = testing::get("/cache").await;
        assert_eq!(fresh.status(), StatusCode::OK);
        assert!(fresh.headers().contains_key(header::LAST_MODIFIED));
        assert_eq!(fresh.headers()[header::ETAG].len(), 32);

        let revalidated = testing::send(
            Request::get("/cache")
                .header("if-none-match", "abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(revalidated.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_cache_control() {
        let response = testing::get("/cache/60").await;
        assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=60");
    }

    #[tokio::test]
    async fn test_links() {
        let first = testing::get("/links/3").await;
        assert_eq!(first.status(), StatusCode::FOUND);
        assert_eq!(first.headers()[header::LOCATION], "/links/3/0");

        let page = testing::body(testing::get("/links/3/1").await).await;
        assert_eq!(
            String::from_utf8(page.to_vec()).unwrap(),
            "<html><head><title>Links</title></head><body>\
             <a href='/links/3/0'>0</a> 1 <a href='/links/3/2'>2</a> </body></html>"
        );
    }

    #[tokio::test]
    async fn test_links_are_capped() {
        let page = testing::body(testing::get("/links/5000/0").await).await;
        let text = String::from_utf8(page.to_vec()).unwrap();
        assert_eq!(text.matches("<a href=").count(), 199);
    }
}
