//! WebSocket test client speaking the signaling event protocol

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use teleop_signaling::{ClientEvent, Role, ServerEvent};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::{HarnessError, HarnessResult};

/// How long to wait for an expected event before failing the test
const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

/// Test client for signaling end-to-end tests
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Connect without an `Origin` header (a native client)
    pub async fn connect(addr: SocketAddr) -> HarnessResult<Self> {
        let (ws, _) = connect_async(format!("ws://{}", addr)).await?;
        Ok(Self { ws })
    }

    /// Connect presenting a browser-style `Origin` header
    pub async fn connect_with_origin(addr: SocketAddr, origin: &str) -> HarnessResult<Self> {
        let mut request = format!("ws://{}", addr).into_client_request()?;
        request.headers_mut().insert(
            "Origin",
            HeaderValue::from_str(origin)
                .map_err(|e| HarnessError::ConnectionError(e.to_string()))?,
        );
        let (ws, _) = connect_async(request).await?;
        Ok(Self { ws })
    }

    /// Send a protocol event
    pub async fn send(&mut self, event: &ClientEvent) -> HarnessResult<()> {
        let text = serde_json::to_string(event)?;
        self.ws.send(Message::Text(text)).await?;
        Ok(())
    }

    /// Send a raw text frame (for malformed-input tests)
    pub async fn send_raw(&mut self, text: &str) -> HarnessResult<()> {
        self.ws.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Wait for the next protocol event
    pub async fn next_event(&mut self) -> HarnessResult<ServerEvent> {
        let deadline = tokio::time::sleep(EVENT_TIMEOUT);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                frame = self.ws.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            return serde_json::from_str(&text).map_err(HarnessError::from);
                        }
                        Some(Ok(Message::Close(_))) | None => return Err(HarnessError::Closed),
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => return Err(HarnessError::from(e)),
                    }
                }
                _ = &mut deadline => return Err(HarnessError::Timeout("server event".to_string())),
            }
        }
    }

    /// Wait for the next event and assert it is exactly `expected`
    pub async fn expect_event(&mut self, expected: &ServerEvent) -> HarnessResult<()> {
        let event = self.next_event().await?;
        assert_eq!(&event, expected, "unexpected server event");
        Ok(())
    }

    /// Register a role and assert the acceptance names it
    pub async fn register(&mut self, role: Role) -> HarnessResult<()> {
        let event = match role {
            Role::Robot => ClientEvent::RegisterRobot,
            Role::Frontend => ClientEvent::RegisterFrontend,
        };
        self.send(&event).await?;
        match self.next_event().await? {
            ServerEvent::ConnectionAccepted { role: assigned, .. } if assigned == role => Ok(()),
            other => Err(HarnessError::ConnectionError(format!(
                "expected acceptance for {}, got {:?}",
                role, other
            ))),
        }
    }

    /// Assert the server closes the connection (after draining any
    /// remaining events)
    pub async fn expect_closed(&mut self) -> HarnessResult<()> {
        loop {
            match self.next_event().await {
                Err(HarnessError::Closed) => return Ok(()),
                Err(e) => return Err(e),
                Ok(_) => continue,
            }
        }
    }

    /// Assert nothing arrives for a short grace period
    pub async fn assert_silent(&mut self) -> HarnessResult<()> {
        match tokio::time::timeout(Duration::from_millis(250), self.ws.next()).await {
            Err(_) => Ok(()),
            Ok(Some(Ok(Message::Text(text)))) => Err(HarnessError::ConnectionError(format!(
                "expected silence, got {}",
                text
            ))),
            Ok(Some(Ok(_))) => Ok(()),
            Ok(Some(Err(e))) => Err(HarnessError::from(e)),
            Ok(None) => Err(HarnessError::Closed),
        }
    }

    /// Close the connection from the client side
    pub async fn close(mut self) -> HarnessResult<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}
