//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the route table once at startup
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (tracing, timeout, request ID, concurrency, CORS)
//! - Dispatch each request through the route table
//! - Serve with graceful shutdown
//! - Observability (metrics, request IDs)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Method, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Semaphore};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ExerciserConfig;
use crate::handlers::{self, Handler};
use crate::http::middleware::{concurrency_limit, cors};
use crate::http::request::{Exchange, X_REQUEST_ID};
use crate::lifecycle::shutdown;
use crate::observability::{metrics, tracing::request_span};
use crate::routing::{RouteMatch, RouteTable, RoutingError};
use crate::selection::SharedRandom;
use crate::templates::{CompiledTemplates, Templates};

/// Everything a handler can reach besides its own request.
pub struct AppContext {
    pub config: ExerciserConfig,
    pub routes: RouteTable<Handler>,
    pub random: SharedRandom,
    pub templates: Box<dyn Templates>,
}

impl AppContext {
    /// Register every endpoint. Fails when the route table is inconsistent.
    pub fn new(config: ExerciserConfig, random: SharedRandom) -> Result<Self, RoutingError> {
        let mut routes = RouteTable::new();
        handlers::register_all(&mut routes)?;

        tracing::info!(routes = routes.len(), "Route table built");

        Ok(Self {
            config,
            routes,
            random,
            templates: Box::new(CompiledTemplates),
        })
    }
}

/// HTTP server for the exerciser.
pub struct HttpServer {
    router: Router,
    config: ExerciserConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ExerciserConfig) -> Result<Self, RoutingError> {
        Self::with_random(config, SharedRandom::from_entropy())
    }

    /// Same as [`HttpServer::new`] with an explicit process-wide generator.
    pub fn with_random(config: ExerciserConfig, random: SharedRandom) -> Result<Self, RoutingError> {
        let context = Arc::new(AppContext::new(config.clone(), random)?);
        let router = Self::build_router(&config, context);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ExerciserConfig, context: Arc<AppContext>) -> Router {
        let mut router = Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(context);

        if config.cors.enabled {
            router = router.layer(middleware::from_fn(cors));
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn_with_state(
                Arc::new(Semaphore::new(config.listener.max_connections)),
                concurrency_limit,
            ))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// The fully layered router, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_connections = self.config.listener.max_connections,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        // Serve with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ExerciserConfig {
        &self.config
    }
}

/// Catch-all handler: resolve the route, read the body, run the endpoint.
async fn dispatch(State(ctx): State<Arc<AppContext>>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0)
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 0)));

    let (parts, body) = request.into_parts();
    let method = parts.method.clone();
    let method_str = method.to_string();
    let path = parts.uri.path().to_string();

    // 1. Match Route
    let (route, handler, params) = match ctx.routes.match_route(&path, &method) {
        RouteMatch::Matched(m) if method == Method::OPTIONS => {
            let response = options_response(m.route.methods());
            metrics::record_request(&method_str, 200, m.name(), start_time);
            return response;
        }
        RouteMatch::Matched(m) => (m.name().to_string(), m.route.handler().clone(), m.params),
        RouteMatch::MethodNotAllowed(allowed) => {
            tracing::debug!(method = %method, path = %path, "Method not allowed");
            metrics::record_request(&method_str, 405, "none", start_time);
            return method_not_allowed(&allowed);
        }
        RouteMatch::NotFound => {
            tracing::debug!(path = %path, "No route matched");
            metrics::record_request(&method_str, 404, "none", start_time);
            return (StatusCode::NOT_FOUND, "Not Found\n").into_response();
        }
    };

    tracing::debug!(method = %method, path = %path, route = %route, "Dispatching request");

    // 2. Buffer Request Body
    let body = match axum::body::to_bytes(body, ctx.config.limits.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(route = %route, error = %e, "Failed to read request body");
            metrics::record_request(&method_str, 413, &route, start_time);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large\n").into_response();
        }
    };

    // 3. Run Endpoint
    let exchange = Exchange {
        ctx: Arc::clone(&ctx),
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
        client_addr,
        params,
        route: route.clone(),
    };

    let response = match handler(exchange).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };

    metrics::record_request(&method_str, response.status().as_u16(), &route, start_time);
    response
}

fn allow_header(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn method_not_allowed(allowed: &[Method]) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, allow_header(allowed))],
        "Method Not Allowed\n",
    )
        .into_response()
}

fn options_response(methods: &[Method]) -> Response {
    (StatusCode::OK, [(header::ALLOW, allow_header(methods))]).into_response()
}
