//! Live servers for integration tests, each on its own ephemeral port.

use std::net::SocketAddr;

use tokio::net::TcpListener;

async fn bind() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Working civic API; returns its `/api/v1` base URL.
pub async fn start_mock() -> String {
    let (listener, addr) = bind().await;
    tokio::spawn(mock_server::run(listener));
    format!("http://{addr}/api/v1")
}

#[allow(dead_code)]
/// Endpoint that answers 503 with a plain-text body to everything.
pub async fn start_unavailable() -> String {
    let (listener, addr) = bind().await;
    tokio::spawn(mock_server::serve(listener, mock_server::unavailable()));
    format!("http://{addr}/api/v1")
}

#[allow(dead_code)]
/// Base URL on a port nothing listens on, so connects are refused.
pub fn closed_port() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api/v1")
}
