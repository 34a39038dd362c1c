//! Error types
//!
//! Every failure in the stream engine falls into one of four classes:
//!
//! - [`TransportError`]: the session never opened, closed abruptly, or a send
//!   was attempted while it was closed
//! - [`CommandError`]: the REST collaborator rejected or failed a command
//! - [`DecodeError`]: a frame payload could not be turned into pixels
//! - [`AudioError`]: the output graph is missing or a cue cannot be played
//!
//! None of these is fatal. The engine turns each into a log line or a
//! [`Notice`](crate::engine::Notice); the worst observable outcome is a camera
//! that appears offline or a cue that does not sound.

use crate::store::CameraId;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport session failure
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// REST command failure
    #[error("command: {0}")]
    Command(#[from] CommandError),

    /// Frame decode failure
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),

    /// Audio failure
    #[error("audio: {0}")]
    Audio(#[from] AudioError),

    /// Malformed wire message
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Transport-level failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The connection could not be established
    #[error("connection failed: {0}")]
    ConnectFailed(String),

    /// A message was submitted while the session was not open
    #[error("session is not open")]
    NotOpen,

    /// The peer or the network closed the connection
    #[error("connection closed: {0}")]
    Closed(String),

    /// The underlying socket reported an error
    #[error("transport io: {0}")]
    Io(String),
}

/// Failures reported by the REST command collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The server answered with a non-success status
    #[error("rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Server-provided detail
        message: String,
    },

    /// The request never got an answer
    #[error("request failed: {0}")]
    Network(String),

    /// No bearer token was available
    #[error("not signed in")]
    Unauthenticated,

    /// The camera is not known to the collaborator
    #[error("camera not found: {0}")]
    NotFound(CameraId),

    /// Response body did not match the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Frame decode failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Payload was not valid base64
    #[error("invalid base64 payload: {0}")]
    Base64(String),

    /// Bytes did not form a supported image
    #[error("invalid image: {0}")]
    Image(String),

    /// The blocking decode task was cancelled or panicked
    #[error("decode task aborted")]
    Aborted,
}

/// Audio subsystem failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AudioError {
    /// No output has been attached or it is still suspended
    #[error("audio output not initialized")]
    NotInitialized,

    /// The registry has no cue with this name
    #[error("unknown cue: {0}")]
    UnknownCue(String),

    /// The output device rejected the buffer
    #[error("output failed: {0}")]
    Output(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;

        match e {
            WsError::ConnectionClosed | WsError::AlreadyClosed => {
                TransportError::Closed(e.to_string())
            }
            WsError::Io(io) => TransportError::Io(io.to_string()),
            other => TransportError::Io(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for CommandError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            CommandError::Rejected {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else if e.is_decode() {
            CommandError::InvalidResponse(e.to_string())
        } else {
            CommandError::Network(e.to_string())
        }
    }
}
