//! Endpoint handlers.
//!
//! # Data Flow
//! ```text
//! dispatch (http/server.rs)
//!     → RouteTable<Handler>::match_route
//!     → Handler(Exchange) → Result<Response, HandlerError>
//!         ├─ auth.rs      (Basic / Digest state machine)
//!         ├─ streams.rs   (BodyProducer, Range Resolver, RandomSource)
//!         ├─ status.rs    (Weighted Outcome Selector)
//!         ├─ redirects.rs (reverse construction)
//!         └─ inspect.rs, cookies.rs, dynamic.rs, content.rs
//! ```
//!
//! # Design Decisions
//! - Every route is registered here, once, in one explicit list
//! - Route names are stable identifiers used by reverse construction
//! - Handlers are plain async fns boxed behind one uniform signature

pub mod auth;
pub mod content;
pub mod cookies;
pub mod dynamic;
pub mod inspect;
pub mod redirects;
pub mod status;
pub mod streams;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::http::Method;
use axum::response::Response;

use crate::error::HandlerError;
use crate::http::Exchange;
use crate::routing::{RouteTable, RoutingError};

pub type HandlerResult = Result<Response, HandlerError>;
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// Uniform endpoint signature stored in the route table.
pub type Handler = Arc<dyn Fn(Exchange) -> HandlerFuture + Send + Sync>;

/// Box an async fn into a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Exchange) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |exchange| Box::pin(f(exchange)))
}

/// Methods for routes that only read.
pub const READ: &[Method] = &[Method::GET, Method::HEAD, Method::OPTIONS];

/// Register every endpoint in dispatch order.
pub fn register_all(routes: &mut RouteTable<Handler>) -> Result<(), RoutingError> {
    use Method as M;

    // Pages
    routes.register("landing", "/", READ, handler(content::landing))?;
    routes.register("html", "/html", READ, handler(content::html))?;
    routes.register("robots", "/robots.txt", READ, handler(content::robots))?;
    routes.register("deny", "/deny", READ, handler(content::deny))?;
    routes.register("encoding_utf8", "/encoding/utf8", READ, handler(content::encoding_utf8))?;
    routes.register("xml", "/xml", READ, handler(content::xml))?;
    routes.register("forms_post", "/forms/post", READ, handler(content::forms_post))?;

    // Request inspection
    routes.register("ip", "/ip", READ, handler(inspect::ip))?;
    routes.register("headers", "/headers", READ, handler(inspect::headers))?;
    routes.register("user_agent", "/user-agent", READ, handler(inspect::user_agent))?;
    routes.register("get", "/get", READ, handler(inspect::get))?;
    routes.register("post", "/post", &[M::POST, M::OPTIONS], handler(inspect::method_echo))?;
    routes.register("put", "/put", &[M::PUT, M::OPTIONS], handler(inspect::method_echo))?;
    routes.register("patch", "/patch", &[M::PATCH, M::OPTIONS], handler(inspect::method_echo))?;
    routes.register("delete", "/delete", &[M::DELETE, M::OPTIONS], handler(inspect::method_echo))?;
    routes.register("gzip", "/gzip", READ, handler(inspect::gzip))?;
    routes.register("deflate", "/deflate", READ, handler(inspect::deflate))?;

    // Redirects
    routes.register("redirect", "/redirect/<int:n>", READ, handler(redirects::redirect_n_times))?;
    routes.register("redirect_to", "/redirect-to", READ, handler(redirects::redirect_to))?;
    routes.register(
        "relative_redirect",
        "/relative-redirect/<int:n>",
        READ,
        handler(redirects::relative_redirect),
    )?;
    routes.register(
        "absolute_redirect",
        "/absolute-redirect/<int:n>",
        READ,
        handler(redirects::absolute_redirect),
    )?;

    // Status and headers
    routes.register(
        "status",
        "/status/<codes>",
        &[M::GET, M::HEAD, M::OPTIONS, M::POST, M::PUT, M::DELETE, M::PATCH, M::TRACE],
        handler(status::status),
    )?;
    routes.register(
        "response_headers",
        "/response-headers",
        READ,
        handler(status::response_headers),
    )?;

    // Cookies
    routes.register("cookies", "/cookies", READ, handler(cookies::view))?;
    routes.register("set_cookies", "/cookies/set", READ, handler(cookies::set_from_query))?;
    routes.register("delete_cookies", "/cookies/delete", READ, handler(cookies::delete))?;
    routes.register("set_cookie", "/cookies/set/<name>/<value>", READ, handler(cookies::set_one))?;

    // Auth
    routes.register("basic_auth", "/basic-auth/<user>/<passwd>", READ, handler(auth::basic))?;
    routes.register(
        "hidden_basic_auth",
        "/hidden-basic-auth/<user>/<passwd>",
        READ,
        handler(auth::hidden_basic),
    )?;
    routes.register(
        "digest_auth",
        "/digest-auth/<qop>/<user>/<passwd>",
        READ,
        handler(auth::digest),
    )?;

    // Dynamic data
    routes.register("delay", "/delay/<delay>", READ, handler(dynamic::delay))?;
    routes.register("base64", "/base64/<value>", READ, handler(dynamic::base64))?;
    routes.register("cache", "/cache", READ, handler(dynamic::cache))?;
    routes.register("cache_control", "/cache/<int:value>", READ, handler(dynamic::cache_control))?;
    routes.register("links", "/links/<int:n>", READ, handler(dynamic::links))?;
    routes.register("link_page", "/links/<int:n>/<int:offset>", READ, handler(dynamic::link_page))?;

    // Streams
    routes.register("stream", "/stream/<int:n>", READ, handler(streams::stream_messages))?;
    routes.register("drip", "/drip", READ, handler(streams::drip))?;
    routes.register("bytes", "/bytes/<int:n>", READ, handler(streams::random_bytes))?;
    routes.register("stream_bytes", "/stream-bytes/<int:n>", READ, handler(streams::stream_bytes))?;
    routes.register("range", "/range/<int:numbytes>", READ, handler(streams::range))?;

    // Images
    routes.register("image", "/image", READ, handler(content::image))?;
    routes.register("image_png", "/image/png", READ, handler(content::image_png))?;
    routes.register("image_jpeg", "/image/jpeg", READ, handler(content::image_jpeg))?;
    routes.register("image_webp", "/image/webp", READ, handler(content::image_webp))?;
    routes.register("image_svg", "/image/svg", READ, handler(content::image_svg))?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Drive the fully layered router without a socket.

    use axum::body::{to_bytes, Body, Bytes};
    use axum::http::Request;
    use axum::response::Response;
    use axum::Router;
    use tower::ServiceExt;

    use crate::config::ExerciserConfig;
    use crate::http::HttpServer;
    use crate::selection::SharedRandom;

    /// Fully layered router with a seeded process-wide generator.
    pub fn router() -> Router {
        HttpServer::with_random(ExerciserConfig::default(), SharedRandom::seeded(1))
            .expect("route table builds")
            .router()
    }

    pub async fn send(request: Request<Body>) -> Response {
        router().oneshot(request).await.expect("router is infallible")
    }

    pub async fn get(uri: &str) -> Response {
        send(
            Request::get(uri)
                .header("host", "test.local")
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn body(response: Response) -> Bytes {
        to_bytes(response.into_body(), usize::MAX).await.unwrap()
    }

    pub async fn json(response: Response) -> serde_json::Value {
        serde_json::from_slice(&body(response).await).unwrap()
    }
}
