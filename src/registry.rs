//! Rendezvous session registry
//!
//! The core of the server: two role slots (`robot`, `frontend`), each
//! holding at most one connection. Registration is exclusive per role,
//! handshake messages are relayed between the two occupants subject to
//! directional rules, and disconnects notify the surviving peer.
//!
//! The registry itself is synchronous; the server serializes access
//! through a mutex. Outbound delivery never blocks; see
//! [`ConnectionHandle::send`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::protocol::{RelayKind, ServerEvent};

/// One of the two fixed identities a connection may claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The camera/actuator endpoint offering media
    Robot,
    /// The operator UI initiating the handshake
    Frontend,
}

impl Role {
    /// The other role
    pub fn counterpart(&self) -> Role {
        match self {
            Role::Robot => Role::Frontend,
            Role::Frontend => Role::Robot,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Robot => f.write_str("robot"),
            Role::Frontend => f.write_str("frontend"),
        }
    }
}

/// Stable identifier for one client connection, compared by value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Addressable send capability for one connection
///
/// The registry holds these as non-owning references to the transport:
/// dropping a handle never tears down the socket, and the socket's real
/// lifetime belongs to its connection task.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::Sender<ServerEvent>,
}

impl ConnectionHandle {
    /// Create a handle from an id and the connection's outbound channel
    pub fn new(id: ConnectionId, tx: mpsc::Sender<ServerEvent>) -> Self {
        Self { id, tx }
    }

    /// The connection's stable id
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Fire-and-forget delivery
    ///
    /// A full or closed channel drops the event with a warning instead of
    /// blocking the registry.
    pub fn send(&self, event: ServerEvent) {
        if let Err(e) = self.tx.try_send(event) {
            warn!(connection = %self.id, "Dropping outbound event: {}", e);
        }
    }
}

/// Two-slot rendezvous registry
///
/// Holds at most one robot and one frontend connection. All methods are
/// synchronous; wrap the registry in a mutex to serialize access from
/// concurrent connection tasks.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    robot: Option<ConnectionHandle>,
    frontend: Option<ConnectionHandle>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, role: Role) -> Option<&ConnectionHandle> {
        match role {
            Role::Robot => self.robot.as_ref(),
            Role::Frontend => self.frontend.as_ref(),
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut Option<ConnectionHandle> {
        match role {
            Role::Robot => &mut self.robot,
            Role::Frontend => &mut self.frontend,
        }
    }

    /// The id occupying a role slot, if any
    pub fn occupant(&self, role: Role) -> Option<ConnectionId> {
        self.slot(role).map(ConnectionHandle::id)
    }

    /// Whether a role slot is occupied
    pub fn is_occupied(&self, role: Role) -> bool {
        self.slot(role).is_some()
    }

    /// The role a connection occupies, if any
    pub fn role_of(&self, id: ConnectionId) -> Option<Role> {
        if self.occupant(Role::Robot) == Some(id) {
            Some(Role::Robot)
        } else if self.occupant(Role::Frontend) == Some(id) {
            Some(Role::Frontend)
        } else {
            None
        }
    }

    /// Claim a role slot for a connection
    ///
    /// On success the connection receives `connection-accepted`, and if the
    /// counterpart slot is already occupied both peers receive their ready
    /// notification (frontend first, then robot; the order is fixed).
    ///
    /// Fails with [`Error::RoleTaken`] when the slot is occupied (the caller
    /// must then close the rejected connection) and with
    /// [`Error::AlreadyRegistered`] when the connection already holds a
    /// role. Neither failure changes any slot.
    pub fn register(&mut self, role: Role, conn: ConnectionHandle) -> Result<()> {
        if let Some(held) = self.role_of(conn.id()) {
            return Err(Error::AlreadyRegistered(held));
        }
        if self.is_occupied(role) {
            return Err(Error::RoleTaken(role));
        }

        let message = match role {
            Role::Robot => "Robot connection established",
            Role::Frontend => "Frontend connection established",
        };
        conn.send(ServerEvent::ConnectionAccepted {
            message: message.to_string(),
            role,
        });
        debug!(connection = %conn.id(), role = %role, "Connection registered");
        *self.slot_mut(role) = Some(conn);

        if self.is_occupied(role.counterpart()) {
            if let Some(frontend) = self.slot(Role::Frontend) {
                frontend.send(ServerEvent::RobotReady);
            }
            if let Some(robot) = self.slot(Role::Robot) {
                robot.send(ServerEvent::FrontendReady);
            }
            debug!("Both peers registered, handshake may begin");
        }

        Ok(())
    }

    /// Relay a handshake message from `sender` to the counterpart slot
    ///
    /// The payload is forwarded verbatim under the same event name. Fails
    /// with [`Error::InvalidRelaySource`] when the sender does not occupy
    /// the source role the kind requires, and [`Error::PeerNotConnected`]
    /// when the destination slot is empty. Failures change no state and
    /// forward nothing.
    pub fn relay(&self, kind: RelayKind, sender: ConnectionId, payload: Value) -> Result<()> {
        let sender_role = self.role_of(sender);
        let source = match kind.expected_source() {
            Some(required) => {
                if sender_role != Some(required) {
                    return Err(Error::InvalidRelaySource(format!(
                        "{} may only be sent by the {}",
                        kind, required
                    )));
                }
                required
            }
            None => sender_role.ok_or_else(|| {
                Error::InvalidRelaySource(format!("{} requires a registered role", kind))
            })?,
        };

        let destination = source.counterpart();
        let peer = self
            .slot(destination)
            .ok_or(Error::PeerNotConnected(destination))?;
        peer.send(kind.into_server_event(payload));
        debug!(kind = %kind, from = %source, to = %destination, "Relayed handshake message");
        Ok(())
    }

    /// Release whatever role slot a connection occupies
    ///
    /// Notifies a surviving counterpart that its peer disconnected. A
    /// connection holding no role is a silent no-op and returns `None`.
    pub fn unregister(&mut self, id: ConnectionId) -> Option<Role> {
        let role = self.role_of(id)?;
        *self.slot_mut(role) = None;

        if let Some(peer) = self.slot(role.counterpart()) {
            peer.send(match role {
                Role::Robot => ServerEvent::RobotDisconnected,
                Role::Frontend => ServerEvent::FrontendDisconnected,
            });
        }
        debug!(connection = %id, role = %role, "Connection unregistered");
        Some(role)
    }
}
