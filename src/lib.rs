//! camwatch-stream: real-time multiplexed camera stream engine
//!
//! One duplex session carries interleaved frame and detection events for any
//! number of cameras. The engine folds them into per-camera state, decodes
//! and presents frames, maps detection boxes onto clickable screen regions,
//! and plays short synthesized cues when new object classes appear.
//!
//! ```text
//!            WebSocket                         REST
//!               │                               │
//!          ┌────▼────┐                     ┌────▼─────┐
//!          │ session │                     │   api    │
//!          └────┬────┘                     └────┬─────┘
//!               │ InboundEvent                  │ CommandAck
//!               └──────────────┬────────────────┘
//!                         ┌────▼────┐
//!                         │ engine  │── store (reducer)
//!                         └────┬────┘
//!          ┌───────────────────┼────────────────────┐
//!     ┌────▼────┐         ┌────▼─────┐         ┌────▼────┐
//!     │ render  │         │ overlay  │         │  audio  │
//!     └─────────┘         └──────────┘         └─────────┘
//! ```
//!
//! Nothing in the engine is fatal: transport loss, rejected commands, broken
//! frames and audio failures all degrade to a log line or a
//! [`Notice`](engine::Notice).

pub mod api;
pub mod audio;
pub mod engine;
pub mod error;
pub mod overlay;
pub mod render;
pub mod session;
pub mod store;

pub use api::{ApiConfig, AuthState, CommandApi, HttpCommandApi, SharedToken};
pub use audio::{AudioSink, MemorySink, NullSink, SynthConfig, Synthesizer};
pub use engine::{DashboardEvent, Engine, EngineConfig, EngineHandle, Notice, UserCommand};
pub use error::{Error, Result};
pub use session::{SessionConfig, WsConnector};
pub use store::{CameraId, CameraStore};
