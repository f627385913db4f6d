//! Error types for device control. Every failure a controller can hit is one of
//! these; nothing is allowed to escape a controller as a panic.

use super::types::CommandType;

/// Failures raised by the transport clients
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Cannot resolve address: {0}")]
    Resolve(String),

    #[error("Connection to {address} failed: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Device returned status {0}")]
    Status(u16),
}

/// Coarse classification of a [`ControlError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing address or token, detected before any I/O
    Precondition,
    Transport,
    /// Payload did not map to a device action
    Translation,
    UnknownCommand,
}

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("Device has no IP address configured")]
    MissingAddress,

    #[error("Device has no auth token configured")]
    MissingAuthToken,

    #[error("No {kind} mapping for payload {payload:?}")]
    Unmapped {
        kind: CommandType,
        payload: Option<String>,
    },

    #[error("Unknown command type: {0}")]
    UnknownCommand(CommandType),

    #[error("No controller registered for device type: {0}")]
    UnknownDeviceType(String),

    #[error("Not supported: {0}")]
    Unsupported(&'static str),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ControlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ControlError::MissingAddress
            | ControlError::MissingAuthToken
            | ControlError::UnknownDeviceType(_)
            | ControlError::Unsupported(_) => ErrorKind::Precondition,
            ControlError::Unmapped { .. } => ErrorKind::Translation,
            ControlError::UnknownCommand(_) => ErrorKind::UnknownCommand,
            ControlError::Serialize(_) | ControlError::Transport(_) => ErrorKind::Transport,
        }
    }
}

pub type ControlResult<T> = Result<T, ControlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ControlError::MissingAddress.kind(), ErrorKind::Precondition);
        assert_eq!(ControlError::MissingAuthToken.kind(), ErrorKind::Precondition);
        assert_eq!(
            ControlError::Unmapped {
                kind: CommandType::Number,
                payload: Some("10".into()),
            }
            .kind(),
            ErrorKind::Translation
        );
        assert_eq!(
            ControlError::UnknownCommand(CommandType::Unknown).kind(),
            ErrorKind::UnknownCommand
        );
        assert_eq!(
            ControlError::from(TransportError::Timeout(3000)).kind(),
            ErrorKind::Transport
        );
    }

    #[test]
    fn test_transport_error_message() {
        let err = ControlError::from(TransportError::Timeout(3000));
        assert_eq!(err.to_string(), "Operation timed out after 3000ms");
    }
}
