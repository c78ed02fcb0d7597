//! Error types for the signaling server

use crate::registry::Role;

/// Result type alias using the signaling Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in signaling operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Registration attempted for a role slot that is already occupied
    #[error("{0} already connected")]
    RoleTaken(Role),

    /// Registration attempted by a connection that already holds a role
    #[error("already registered as {0}")]
    AlreadyRegistered(Role),

    /// Relay attempted by a connection not occupying the expected source role
    #[error("invalid sender: {0}")]
    InvalidRelaySource(String),

    /// Relay attempted while the destination slot is empty
    #[error("{0} not connected")]
    PeerNotConnected(Role),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error must terminate the offending connection
    pub fn is_fatal_to_connection(&self) -> bool {
        matches!(self, Error::RoleTaken(_))
    }

    /// Check if this error is reported to the offending connection as a
    /// `connection-error` notification
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::RoleTaken(_)
                | Error::AlreadyRegistered(_)
                | Error::InvalidRelaySource(_)
                | Error::PeerNotConnected(_)
        )
    }

    /// Check if this error is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::InvalidConfig(_))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocketError(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::RoleTaken(Role::Robot).to_string(), "robot already connected");
        assert_eq!(
            Error::PeerNotConnected(Role::Frontend).to_string(),
            "frontend not connected"
        );
        assert_eq!(
            Error::InvalidConfig("bad port".to_string()).to_string(),
            "Invalid configuration: bad port"
        );
    }

    #[test]
    fn test_error_is_fatal_to_connection() {
        assert!(Error::RoleTaken(Role::Frontend).is_fatal_to_connection());
        assert!(!Error::AlreadyRegistered(Role::Robot).is_fatal_to_connection());
        assert!(!Error::PeerNotConnected(Role::Robot).is_fatal_to_connection());
    }

    #[test]
    fn test_error_is_client_error() {
        assert!(Error::RoleTaken(Role::Robot).is_client_error());
        assert!(Error::InvalidRelaySource("x".to_string()).is_client_error());
        assert!(!Error::InvalidConfig("x".to_string()).is_client_error());
        assert!(!Error::WebSocketError("x".to_string()).is_client_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::IoError(_)));
    }
}
