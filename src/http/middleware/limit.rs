//! Backpressure on concurrently served requests.
//!
//! A request holds its slot until the response body has been fully sent or
//! dropped, so paced streams count against the limit for their whole lifetime.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body::{Frame, SizeHint};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Waits for a slot before running the request.
pub async fn concurrency_limit(
    State(limit): State<Arc<Semaphore>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let permit = match limit.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            return (StatusCode::SERVICE_UNAVAILABLE, "Server shutting down\n").into_response();
        }
    };

    tracing::trace!(
        available_permits = limit.available_permits(),
        "Request slot acquired"
    );

    next.run(request)
        .await
        .map(|inner| Body::new(PermitBody { inner, _permit: permit }))
}

/// Response body that releases its request slot when dropped.
struct PermitBody {
    inner: Body,
    _permit: OwnedSemaphorePermit,
}

impl http_body::Body for PermitBody {
    type Data = Bytes;

    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Pin::new(&mut self.get_mut().inner).poll_frame(cx)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::routing::get;
    use axum::{middleware, Router};
    use http_body::Body as _;
    use tower::ServiceExt;

    fn limited(limit: Arc<Semaphore>) -> Router {
        Router::new()
            .route("/", get(|| async { "done" }))
            .layer(middleware::from_fn_with_state(limit, concurrency_limit))
    }

    #[tokio::test]
    async fn test_slot_held_until_body_consumed() {
        let limit = Arc::new(Semaphore::new(1));
        let response = limited(limit.clone())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(limit.available_permits(), 0);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"done");
        assert_eq!(limit.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_slot_released_when_body_dropped() {
        let limit = Arc::new(Semaphore::new(2));
        let response = limited(limit.clone())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(limit.available_permits(), 1);
        assert_eq!(response.body().size_hint().exact(), Some(4));

        drop(response);
        assert_eq!(limit.available_permits(), 2);
    }
}
