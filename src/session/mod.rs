//! Transport session
//!
//! One persistent, bidirectional message channel to the stream server. All
//! cameras share it: frames, detection results, and status changes for every
//! camera arrive interleaved, and the client sends keepalive probes and
//! per-camera subscriptions back over it.
//!
//! # Architecture
//!
//! ```text
//!                 Connector::connect(url)
//!                          │
//!                          ▼
//!   Session (handle) ── outbound ──► Driver task ◄──► Transport
//!        │                              │              (WebSocket or
//!        │ send / subscribe / close     │               in-memory pair)
//!        │                              ▼
//!        └───────────────►   mpsc::Receiver<SessionEvent>
//!                            Opened → Inbound(..)* → Closed
//! ```
//!
//! There is no automatic reconnection. After `Closed` the owner decides
//! whether to connect a fresh session.

pub mod config;
pub mod connection;
pub mod message;
pub mod state;
pub mod transport;
pub mod ws;

pub use config::SessionConfig;
pub use connection::{Session, SessionEvent};
pub use message::{parse_inbound, DetectionEvent, InboundEvent, OutboundMessage};
pub use state::{CloseReason, SessionId, SessionPhase};
pub use transport::{ChannelConnector, ChannelPeer, ChannelTransport, Connector, Transport};
pub use ws::{WsConnector, WsTransport};
