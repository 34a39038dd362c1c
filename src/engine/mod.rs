//! Dashboard engine
//!
//! Ties the session, store, render pipelines, overlay mapper and
//! synthesizer together on a single event loop. Hosts drive it through an
//! [`EngineHandle`] and observe it through [`DashboardEvent`]s.
//!
//! # Example
//!
//! ```ignore
//! let (engine, handle) = Engine::new(config, api, WsConnector::new(), NullSink, auth_rx);
//! let mut events = handle.subscribe();
//! tokio::spawn(engine.run());
//!
//! handle.start(CameraId::new("cam-1")).await;
//! while let Ok(event) = events.recv().await {
//!     // draw tiles, show notices
//! }
//! ```

pub mod command;
pub mod config;
pub mod dashboard;
pub mod notice;

pub use command::{CameraTile, DashboardSnapshot, UserCommand};
pub use config::EngineConfig;
pub use dashboard::{DashboardEvent, Engine, EngineHandle};
pub use notice::{Notice, NoticeLevel};
