//! Rendezvous signaling for robot/frontend WebRTC teleoperation
//!
//! This crate implements the small relay that lets exactly two peers (a
//! robot endpoint and an operator frontend) find each other and exchange
//! the session descriptions and ICE candidates needed to open a direct
//! peer-to-peer channel. The relay brokers only that handshake: it never
//! carries media, stores nothing, and serves one peer pair at a time.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │  SignalingServer (TCP accept loop)                │
//! │   └─ one handler task per WebSocket connection    │
//! │       ├─ inbound: ClientEvent dispatch            │
//! │       └─ outbound: bounded channel + forward task │
//! │  SessionRegistry (robot slot / frontend slot)     │
//! │   ├─ register: exclusive role claim               │
//! │   ├─ relay: offer / answer / candidate            │
//! │   └─ unregister: disconnect notification          │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! Clients speak JSON text frames of the form
//! `{"event": "offer", "data": {...}}`; see [`protocol`] for the full
//! event set. `offer` flows frontend → robot, `answer` robot → frontend,
//! `candidate` both ways.
//!
//! # Example
//!
//! ```
//! use teleop_signaling::SignalingConfig;
//!
//! let config = SignalingConfig {
//!     port: 9010,
//!     allowed_origins: vec!["http://localhost:5500".to_string()],
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Running a server
//!
//! ```no_run
//! use teleop_signaling::{SignalingConfig, SignalingServer};
//!
//! # async fn example() -> teleop_signaling::Result<()> {
//! let server = SignalingServer::new(SignalingConfig::default())?;
//! let handle = server.start().await?;
//! println!("listening on {}", handle.local_addr());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod server;

// Re-exports for public API
pub use config::SignalingConfig;
pub use error::{Error, Result};
pub use protocol::{ClientEvent, RelayKind, ServerEvent};
pub use registry::{ConnectionHandle, ConnectionId, Role, SessionRegistry};
pub use server::{ServerHandle, SignalingServer};

/// Get the version of this crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
