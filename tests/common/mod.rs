//! Shared utilities for integration tests.

use std::net::SocketAddr;

use http_exerciser::config::ExerciserConfig;
use http_exerciser::http::HttpServer;
use http_exerciser::lifecycle::Shutdown;
use tokio::net::TcpListener;

/// Start an exerciser on an ephemeral port.
///
/// The server stops when the returned `Shutdown` is triggered.
pub async fn start_server(config: ExerciserConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    (addr, shutdown)
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
