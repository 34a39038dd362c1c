//! Per-camera state store
//!
//! The store folds three kinds of input into per-camera state: inbound
//! transport events, REST command acknowledgements, and local side effects
//! such as clearing detections when detection is switched off.
//!
//! # Architecture
//!
//! ```text
//!   Session events ──┐
//!                    │      ┌───────────────────────────────┐
//!   Command acks ────┼────► │ CameraStore                   │
//!                    │      │   cameras: HashMap<CameraId,  │
//!   Local effects ───┘      │     CameraEntry {             │
//!                           │       state, frame,           │
//!                           │       detections, counts,     │
//!                           │     }                         │
//!                           └──────────────┬────────────────┘
//!                                          │ read only
//!                    ┌─────────────────────┼─────────────────────┐
//!                    ▼                     ▼                     ▼
//!              FramePipeline        overlay mapper          Synthesizer
//! ```
//!
//! The store is a plain struct mutated through `&mut self`. It lives on the
//! engine's single event loop, so there is nothing to lock.

pub mod detection;
pub mod entry;
pub mod frame;
pub mod reducer;

pub use detection::{BoundingBox, Detection, DetectionSet, ObjectCounts};
pub use entry::{
    CameraEntry, CameraRuntimeState, CameraSnapshot, DetectionMode, DetectionView, Presence,
};
pub use frame::{parse_timestamp, CameraId, EncodedImage, Frame};
pub use reducer::{CameraStore, StoreChange};
