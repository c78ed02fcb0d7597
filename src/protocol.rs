//! Wire protocol for the signaling WebSocket
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`;
//! `data` is omitted for events that carry none. Handshake payloads
//! (offer/answer/candidate) are opaque to the server and forwarded
//! verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::Role;

/// Events received from clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Claim the robot role
    RegisterRobot,

    /// Claim the frontend role
    RegisterFrontend,

    /// Query whether a robot is currently registered
    CheckRobot,

    /// Session description offer, relayed frontend → robot
    Offer(Value),

    /// Session description answer, relayed robot → frontend
    Answer(Value),

    /// ICE candidate, relayed between the two registered peers
    Candidate(Value),
}

/// Events sent to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Registration accepted; names the assigned role
    ConnectionAccepted { message: String, role: Role },

    /// A request failed; describes the problem
    ConnectionError { message: String },

    /// Sent to the frontend once a robot is registered
    RobotReady,

    /// Sent to the robot once a frontend is registered
    FrontendReady,

    /// Sent to the frontend when the robot disconnects
    RobotDisconnected,

    /// Sent to the robot when the frontend disconnects
    FrontendDisconnected,

    /// Reply to `check-robot`
    RobotStatus { connected: bool },

    /// Forwarded session description offer
    Offer(Value),

    /// Forwarded session description answer
    Answer(Value),

    /// Forwarded ICE candidate
    Candidate(Value),
}

/// The three relayed handshake message kinds and their directional rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayKind {
    /// Frontend → robot
    Offer,
    /// Robot → frontend
    Answer,
    /// Either registered role → the other
    Candidate,
}

impl RelayKind {
    /// The role a sender must occupy, or `None` when either role may send
    pub fn expected_source(&self) -> Option<Role> {
        match self {
            RelayKind::Offer => Some(Role::Frontend),
            RelayKind::Answer => Some(Role::Robot),
            RelayKind::Candidate => None,
        }
    }

    /// Wire event name
    pub fn event_name(&self) -> &'static str {
        match self {
            RelayKind::Offer => "offer",
            RelayKind::Answer => "answer",
            RelayKind::Candidate => "candidate",
        }
    }

    /// Wrap a payload in the outbound event of the same kind
    pub fn into_server_event(self, payload: Value) -> ServerEvent {
        match self {
            RelayKind::Offer => ServerEvent::Offer(payload),
            RelayKind::Answer => ServerEvent::Answer(payload),
            RelayKind::Candidate => ServerEvent::Candidate(payload),
        }
    }
}

impl std::fmt::Display for RelayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.event_name())
    }
}

impl ClientEvent {
    /// Parse an event from a JSON text frame
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| crate::Error::SerializationError(format!("invalid client event: {}", e)))
    }
}

impl ServerEvent {
    /// Serialize the event to a JSON text frame
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self)
            .map_err(|e| crate::Error::SerializationError(format!("invalid server event: {}", e)))
    }
}
