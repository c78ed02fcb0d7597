//! WebSocket signaling server
//!
//! Binds a TCP listener and spawns one handler task per accepted
//! connection. The accept loop runs until the returned [`ServerHandle`]
//! is shut down.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::SignalingConfig;
use crate::error::Result;
use crate::handler::{handle_connection, SharedState};

/// WebSocket signaling server
pub struct SignalingServer {
    addr: SocketAddr,
    state: Arc<SharedState>,
}

impl SignalingServer {
    /// Create a server from a validated configuration
    pub fn new(config: SignalingConfig) -> Result<Self> {
        config.validate()?;
        let addr = config.socket_addr()?;
        let state = Arc::new(SharedState::new(Arc::new(config)));
        Ok(Self { addr, state })
    }

    /// Get shared state (for external occupancy reads)
    pub fn state(&self) -> Arc<SharedState> {
        Arc::clone(&self.state)
    }

    /// The configured bind address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Bind the listener and spawn the accept loop
    ///
    /// Returns once the listener is bound; accepting continues in a
    /// background task controlled through the returned handle. Binding
    /// port 0 selects an ephemeral port, reported by
    /// [`ServerHandle::local_addr`].
    pub async fn start(self) -> Result<ServerHandle> {
        let listener = TcpListener::bind(&self.addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Signaling server listening on ws://{}", local_addr);

        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
        let state = Arc::clone(&self.state);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, peer_addr)) => {
                                let state = Arc::clone(&state);
                                tokio::spawn(async move {
                                    if let Err(e) = handle_connection(stream, state).await {
                                        debug!(peer = %peer_addr, "Connection ended with error: {}", e);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept connection: {}", e);
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Signaling server accept loop stopping");
                        break;
                    }
                }
            }
        });

        Ok(ServerHandle {
            local_addr,
            shutdown_tx,
            task,
        })
    }
}

/// Handle for controlling a running signaling server
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// The address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for the accept loop to exit
    ///
    /// Connections already established keep running until their clients
    /// disconnect.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            error!("Accept loop task failed: {}", e);
        }
    }
}
