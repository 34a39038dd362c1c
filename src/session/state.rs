//! Session lifecycle types

use std::fmt;

/// Identity of one transport session
///
/// Command acknowledgements carry the id of the session they were issued
/// under, so results that outlive their session can be recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Transport open, messages flowing
    Open,
    /// Close requested, driver shutting down
    Closing,
    /// Session closed; it is never reopened
    Closed,
}

impl SessionPhase {
    pub fn is_open(self) -> bool {
        self == SessionPhase::Open
    }
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// [`Session::close`](super::Session::close) was called or the handle dropped
    Local,
    /// The peer closed the connection
    Remote,
    /// The transport failed
    Error(String),
}

impl CloseReason {
    /// Whether the close was unexpected from the client's point of view
    pub fn is_unexpected(&self) -> bool {
        !matches!(self, CloseReason::Local)
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::Local => write!(f, "closed by client"),
            CloseReason::Remote => write!(f, "closed by server"),
            CloseReason::Error(e) => write!(f, "{}", e),
        }
    }
}
