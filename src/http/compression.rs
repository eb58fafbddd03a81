//! Body compression collaborator.
//!
//! Runs an already-built response through tower-http's `CompressionLayer`
//! with a forced `Accept-Encoding`, so the endpoint's encoding does not
//! depend on what the client advertised.

use std::convert::Infallible;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use tower::{service_fn, Layer, ServiceExt};
use tower_http::compression::predicate::SizeAbove;
use tower_http::compression::CompressionLayer;

/// Content coding applied by [`encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Gzip,
    Deflate,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Gzip => "gzip",
            Encoding::Deflate => "deflate",
        }
    }
}

/// Compress `response` with `encoding`. Headers are updated by the layer
/// (`Content-Encoding` set, `Content-Length` dropped).
pub async fn encode(response: Response, encoding: Encoding) -> Response {
    let layer = CompressionLayer::new()
        .gzip(encoding == Encoding::Gzip)
        .deflate(encoding == Encoding::Deflate)
        .compress_when(SizeAbove::new(0));

    let mut prepared = Some(response);
    let inner = service_fn(move |_: Request<Body>| {
        let response = prepared.take().unwrap_or_default();
        async move { Ok::<_, Infallible>(response) }
    });

    let mut request = Request::new(Body::empty());
    request.headers_mut().insert(
        header::ACCEPT_ENCODING,
        header::HeaderValue::from_static(encoding.as_str()),
    );

    match layer.layer(inner).oneshot(request).await {
        Ok(compressed) => compressed.map(Body::new),
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_sets_content_encoding() {
        let plain = response::with_type(StatusCode::OK, response::JSON, "{\"gzipped\": true}\n");
        let encoded = encode(plain, Encoding::Gzip).await;
        assert_eq!(encoded.headers()[header::CONTENT_ENCODING], "gzip");

        let body = axum::body::to_bytes(encoded.into_body(), usize::MAX)
            .await
            .unwrap();
        // gzip magic
        assert_eq!(&body[..2], &[0x1f, 0x8b]);
    }

    #[tokio::test]
    async fn test_deflate() {
        let plain = response::with_type(StatusCode::OK, response::JSON, "{}\n");
        let encoded = encode(plain, Encoding::Deflate).await;
        assert_eq!(encoded.headers()[header::CONTENT_ENCODING], "deflate");
    }
}
