//! Configuration types for the signaling server

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default listening port, matching the conventional deployment
pub const DEFAULT_PORT: u16 = 9010;

/// Default per-connection outbound event channel capacity
pub const DEFAULT_CHANNEL_CAPACITY: usize = 128;

/// Main configuration for the signaling server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalingConfig {
    /// Interface to bind (default: 0.0.0.0)
    pub bind_address: String,

    /// Listening port (default: 9010; 0 selects an ephemeral port)
    pub port: u16,

    /// Origins admitted during the WebSocket upgrade.
    ///
    /// A browser sends its page origin in the `Origin` header; a handshake
    /// whose origin is not listed here is refused with 403. An empty list
    /// admits any origin, including clients that send no `Origin` header
    /// at all (native clients such as the robot endpoint).
    pub allowed_origins: Vec<String>,

    /// Per-connection outbound event channel capacity (default: 128)
    pub channel_capacity: usize,
}

impl SignalingConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.bind_address.is_empty() {
            return Err(Error::InvalidConfig("bind_address is empty".to_string()));
        }
        self.socket_addr()?;
        if self.channel_capacity == 0 {
            return Err(Error::InvalidConfig(
                "channel_capacity must be at least 1".to_string(),
            ));
        }
        for origin in &self.allowed_origins {
            if !origin.starts_with("http://") && !origin.starts_with("https://") {
                return Err(Error::InvalidConfig(format!(
                    "allowed origin '{}' must be an http:// or https:// origin",
                    origin
                )));
            }
        }
        Ok(())
    }

    /// Resolve the bind address and port into a socket address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| {
                Error::InvalidConfig(format!(
                    "invalid bind address '{}:{}': {}",
                    self.bind_address, self.port, e
                ))
            })
    }

    /// Check whether a handshake `Origin` header value is admitted
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        if self.allowed_origins.is_empty() {
            return true;
        }
        match origin {
            Some(origin) => self.allowed_origins.iter().any(|o| o == origin),
            None => false,
        }
    }
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            allowed_origins: Vec::new(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}
