//! Per-connection WebSocket handling
//!
//! Each accepted socket gets one handler task: it upgrades the connection
//! (checking the origin policy), dispatches inbound events against the
//! shared registry, and drains a bounded outbound channel back into the
//! socket through a forward task.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::config::SignalingConfig;
use crate::error::Result;
use crate::protocol::{ClientEvent, RelayKind, ServerEvent};
use crate::registry::{ConnectionHandle, ConnectionId, Role, SessionRegistry};

/// Shared state across all connections
pub struct SharedState {
    /// The two role slots, serialized behind a sync lock
    pub registry: parking_lot::Mutex<SessionRegistry>,

    /// Server configuration
    pub config: Arc<SignalingConfig>,
}

impl SharedState {
    /// Create shared state with an empty registry
    pub fn new(config: Arc<SignalingConfig>) -> Self {
        Self {
            registry: parking_lot::Mutex::new(SessionRegistry::new()),
            config,
        }
    }
}

/// Handle a single client connection from upgrade to disconnect
pub async fn handle_connection(stream: TcpStream, state: Arc<SharedState>) -> Result<()> {
    let addr = stream.peer_addr()?;

    let config = Arc::clone(&state.config);
    let ws_stream = tokio_tungstenite::accept_hdr_async(stream, |request: &Request, response| {
        check_origin(&config, request, response)
    })
    .await?;

    let conn_id = ConnectionId::new();
    info!(connection = %conn_id, peer = %addr, "Client connected");

    let (ws_tx, mut ws_rx) = ws_stream.split();

    // Outbound events are queued here and written by the forward task. The
    // registry holds a clone of `tx` while this connection occupies a slot.
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(state.config.channel_capacity);
    let handle = ConnectionHandle::new(conn_id, tx.clone());

    // The writer half is shared with the read loop for ping replies.
    let ws_tx = Arc::new(tokio::sync::Mutex::new(ws_tx));
    let ws_tx_forward = Arc::clone(&ws_tx);
    let forward_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match event.to_json() {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize outbound event: {}", e);
                    continue;
                }
            };
            if let Err(e) = ws_tx_forward.lock().await.send(Message::Text(text)).await {
                debug!("Outbound send failed: {}", e);
                break;
            }
        }
    });

    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if !dispatch_event(&text, &state, &handle) {
                    break;
                }
            }
            Ok(Message::Ping(data)) => {
                let _ = ws_tx.lock().await.send(Message::Pong(data)).await;
            }
            Ok(Message::Close(_)) => {
                debug!(connection = %conn_id, "Close frame received");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                debug!(connection = %conn_id, "WebSocket error: {}", e);
                break;
            }
        }
    }

    // Release the slot first so the registry drops its sender clone and the
    // surviving peer gets its disconnect notification.
    if let Some(role) = state.registry.lock().unregister(conn_id) {
        info!(connection = %conn_id, role = %role, "Registered client disconnected");
    }

    // Drain the outbound queue before closing: a rejection notification
    // must reach the client ahead of the close frame.
    drop(handle);
    drop(tx);
    let _ = forward_task.await;
    let _ = ws_tx.lock().await.close().await;

    info!(connection = %conn_id, "Client disconnected");
    Ok(())
}

/// Dispatch one inbound text frame
///
/// Returns `false` when the connection must be force-closed (registration
/// for an occupied role slot).
fn dispatch_event(text: &str, state: &SharedState, conn: &ConnectionHandle) -> bool {
    let event = match ClientEvent::from_json(text) {
        Ok(event) => event,
        Err(e) => {
            // Unknown event names and malformed frames are ignored.
            debug!(connection = %conn.id(), "Ignoring unparseable frame: {}", e);
            return true;
        }
    };

    let outcome = match event {
        ClientEvent::RegisterRobot => state.registry.lock().register(Role::Robot, conn.clone()),
        ClientEvent::RegisterFrontend => {
            state.registry.lock().register(Role::Frontend, conn.clone())
        }
        ClientEvent::CheckRobot => {
            let connected = state.registry.lock().is_occupied(Role::Robot);
            conn.send(ServerEvent::RobotStatus { connected });
            Ok(())
        }
        ClientEvent::Offer(payload) => {
            state.registry.lock().relay(RelayKind::Offer, conn.id(), payload)
        }
        ClientEvent::Answer(payload) => {
            state.registry.lock().relay(RelayKind::Answer, conn.id(), payload)
        }
        ClientEvent::Candidate(payload) => {
            state
                .registry
                .lock()
                .relay(RelayKind::Candidate, conn.id(), payload)
        }
    };

    match outcome {
        Ok(()) => true,
        Err(err) => {
            warn!(connection = %conn.id(), "Request failed: {}", err);
            conn.send(ServerEvent::ConnectionError {
                message: err.to_string(),
            });
            !err.is_fatal_to_connection()
        }
    }
}

/// Enforce the origin allow-list during the WebSocket upgrade
fn check_origin(
    config: &SignalingConfig,
    request: &Request,
    response: Response,
) -> std::result::Result<Response, ErrorResponse> {
    let origin = request
        .headers()
        .get("Origin")
        .and_then(|value| value.to_str().ok());

    if config.origin_allowed(origin) {
        Ok(response)
    } else {
        warn!(origin = ?origin, "Rejected upgrade from disallowed origin");
        let mut response = ErrorResponse::new(Some("origin not allowed".to_string()));
        *response.status_mut() = StatusCode::FORBIDDEN;
        Err(response)
    }
}
