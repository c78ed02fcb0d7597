//! Signaling end-to-end test harness
//!
//! Provides an embedded server on a random port plus a thin WebSocket
//! test client speaking the signaling event protocol.

pub mod test_client;

pub use test_client::TestClient;

use teleop_signaling::{ServerHandle, SignalingConfig, SignalingServer};

/// Result type for test harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Error type for test harness operations
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Timeout waiting for {0}")]
    Timeout(String),

    #[error("Connection closed")]
    Closed,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Start a server on an ephemeral localhost port
pub async fn start_test_server() -> ServerHandle {
    start_test_server_with(SignalingConfig {
        bind_address: "127.0.0.1".to_string(),
        port: 0,
        ..Default::default()
    })
    .await
}

/// Start a server on an ephemeral localhost port with a custom config
///
/// The configured `bind_address`/`port` are overridden to localhost:0 so
/// tests never collide on ports.
pub async fn start_test_server_with(mut config: SignalingConfig) -> ServerHandle {
    config.bind_address = "127.0.0.1".to_string();
    config.port = 0;
    SignalingServer::new(config)
        .expect("valid test config")
        .start()
        .await
        .expect("server start")
}
