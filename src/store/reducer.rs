//! Camera store implementation
//!
//! The single source of truth for per-camera state. Every mutation goes
//! through one of the reducer methods below; render, overlay and audio code
//! only read.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::api::{CameraRecord, CameraSettings};
use crate::error::CommandError;
use crate::session::{DetectionEvent, InboundEvent};

use super::detection::{DetectionSet, ObjectCounts};
use super::entry::{
    CameraEntry, CameraRuntimeState, CameraSnapshot, DetectionView, PendingStream, Presence,
};
use super::frame::{CameraId, Frame};

/// What a reducer call changed, so callers know what to re-derive
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    /// Nothing observable changed
    Unchanged,
    /// A new frame replaced the cached one
    FrameReplaced {
        /// Sequence number of the new frame
        seq: u64,
    },
    /// A detection event replaced the set and counts
    DetectionsReplaced {
        /// Classes absent from the previous counts, with their best confidence
        new_classes: Vec<(String, f32)>,
    },
    /// The set and counts were cleared
    DetectionsCleared,
    /// Streaming stopped; frame and detections were cleared
    StreamCleared,
    /// Only flags or error text changed
    StatusChanged,
}

/// Store of live state for every known camera
///
/// Unknown camera ids in events are accepted and get a fresh entry, since
/// registration and event delivery are not linked.
#[derive(Debug, Default)]
pub struct CameraStore {
    /// Entries keyed by camera id
    cameras: HashMap<CameraId, CameraEntry>,

    /// Last frame sequence handed out
    next_frame_seq: u64,

    /// Whether the transport session is currently open
    connected: bool,
}

impl CameraStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed entries from the camera listing
    ///
    /// Existing entries keep their runtime state; only names are refreshed.
    pub fn bootstrap(&mut self, records: &[CameraRecord]) {
        for record in records {
            self.add_camera(record);
        }

        tracing::info!(cameras = self.cameras.len(), "Store bootstrapped");
    }

    /// Register a camera
    pub fn add_camera(&mut self, record: &CameraRecord) {
        let entry = self.entry_mut(&record.id);
        entry.name = Some(record.name.clone());
    }

    /// Remove a camera and everything derived from it
    ///
    /// Returns whether the camera was known.
    pub fn remove_camera(&mut self, id: &CameraId) -> bool {
        let removed = self.cameras.remove(id).is_some();
        if removed {
            tracing::info!(camera = %id, "Camera removed");
        }
        removed
    }

    /// Record whether the transport session is open
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Whether the transport session is open
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Fold one inbound transport event into the store
    pub fn apply_event(&mut self, event: &InboundEvent) -> StoreChange {
        match event {
            InboundEvent::Frame(frame) => self.apply_frame(frame),
            InboundEvent::Detection(detection) => self.apply_detection(detection),
            InboundEvent::DetectionStatus { camera_id, enabled } => {
                self.apply_detection_status(camera_id, *enabled)
            }
            InboundEvent::CameraStatus {
                camera_id,
                streaming,
            } => self.apply_camera_status(camera_id, *streaming),
            InboundEvent::CameraError { camera_id, message } => {
                let entry = self.entry_mut(camera_id);
                entry.state.error = Some(message.clone());
                StoreChange::StatusChanged
            }
            InboundEvent::KeepaliveAck
            | InboundEvent::Connected { .. }
            | InboundEvent::ServerError { .. }
            | InboundEvent::Subscribed { .. }
            | InboundEvent::Unsubscribed { .. } => StoreChange::Unchanged,
        }
    }

    fn apply_frame(&mut self, frame: &Frame) -> StoreChange {
        self.next_frame_seq += 1;
        let seq = self.next_frame_seq;

        let entry = self.entry_mut(&frame.camera_id);
        entry.touch(frame.timestamp);
        entry.state.is_streaming = true;
        entry.frame = Some(frame.clone());
        entry.frame_seq = seq;

        StoreChange::FrameReplaced { seq }
    }

    fn apply_detection(&mut self, event: &DetectionEvent) -> StoreChange {
        let entry = self.entry_mut(&event.camera_id);
        entry.touch(event.timestamp);
        entry.state.is_detecting = true;
        entry.awaiting_detections = false;

        let counts = event
            .object_counts
            .clone()
            .unwrap_or_else(|| ObjectCounts::from_detections(&event.detections));

        let new_classes: Vec<(String, f32)> = event
            .detections
            .best_confidence_by_class()
            .into_iter()
            .filter(|(class, _)| !entry.object_counts.contains(class))
            .collect();

        entry.detections = event.detections.clone();
        entry.object_counts = counts;

        StoreChange::DetectionsReplaced { new_classes }
    }

    fn apply_detection_status(&mut self, id: &CameraId, enabled: bool) -> StoreChange {
        let entry = self.entry_mut(id);

        if !enabled {
            entry.state.is_detecting = false;
            entry.awaiting_detections = false;
            entry.clear_detections();
            return StoreChange::DetectionsCleared;
        }

        if !entry.state.is_detecting {
            entry.state.is_detecting = true;
            entry.awaiting_detections = true;
            entry.clear_detections();
            return StoreChange::DetectionsCleared;
        }

        StoreChange::Unchanged
    }

    fn apply_camera_status(&mut self, id: &CameraId, streaming: bool) -> StoreChange {
        let entry = self.entry_mut(id);
        entry.state.is_streaming = streaming;

        if streaming {
            StoreChange::StatusChanged
        } else {
            entry.clear_frame();
            entry.clear_detections();
            StoreChange::StreamCleared
        }
    }

    /// Optimistically mark a camera as streaming before the start is acknowledged
    pub fn begin_start(&mut self, id: &CameraId) -> StoreChange {
        let entry = self.entry_mut(id);
        let prior = entry.state.is_streaming;
        entry.pending_stream = Some(PendingStream::Start { prior });
        entry.state.is_streaming = true;
        StoreChange::StatusChanged
    }

    /// Apply the start acknowledgement
    ///
    /// Failure reverts `is_streaming` to its pre-command value and records
    /// the error. The revert is unconditional, even if frames arrived while
    /// the command was in flight.
    pub fn ack_start(&mut self, id: &CameraId, result: &Result<(), CommandError>) -> StoreChange {
        let entry = self.entry_mut(id);
        let pending = entry.pending_stream.take();

        match result {
            Ok(()) => {
                entry.state.error = None;
                StoreChange::StatusChanged
            }
            Err(e) => {
                if let Some(PendingStream::Start { prior }) = pending {
                    entry.state.is_streaming = prior;
                }
                entry.state.error = Some(e.to_string());
                tracing::warn!(camera = %id, error = %e, "Start command failed");
                StoreChange::StatusChanged
            }
        }
    }

    /// Optimistically stop a camera and drop its frame and detections
    pub fn begin_stop(&mut self, id: &CameraId) -> StoreChange {
        let entry = self.entry_mut(id);
        let prior = entry.state.is_streaming;
        entry.pending_stream = Some(PendingStream::Stop { prior });
        entry.state.is_streaming = false;
        entry.clear_frame();
        entry.clear_detections();
        StoreChange::StreamCleared
    }

    /// Apply the stop acknowledgement
    ///
    /// Failure restores the streaming flag; the dropped frame is not
    /// restored and reappears with the next frame event.
    pub fn ack_stop(&mut self, id: &CameraId, result: &Result<(), CommandError>) -> StoreChange {
        let entry = self.entry_mut(id);
        let pending = entry.pending_stream.take();

        match result {
            Ok(()) => {
                entry.state.error = None;
                StoreChange::StatusChanged
            }
            Err(e) => {
                if let Some(PendingStream::Stop { prior }) = pending {
                    entry.state.is_streaming = prior;
                }
                entry.state.error = Some(e.to_string());
                tracing::warn!(camera = %id, error = %e, "Stop command failed");
                StoreChange::StatusChanged
            }
        }
    }

    /// Record a detection toggle request
    ///
    /// Switching off clears the set and counts immediately, before the
    /// command is acknowledged. `is_detecting` is left alone until the ack.
    pub fn begin_toggle(&mut self, id: &CameraId, enabled: bool) -> StoreChange {
        let entry = self.entry_mut(id);
        entry.pending_detection = Some(enabled);

        if enabled {
            StoreChange::Unchanged
        } else {
            entry.awaiting_detections = false;
            entry.clear_detections();
            StoreChange::DetectionsCleared
        }
    }

    /// Apply the detection toggle acknowledgement
    ///
    /// On success the flag takes the requested value and the camera starts
    /// out scanning with an empty set. On failure the flag keeps its
    /// pre-toggle value and the error is recorded.
    pub fn ack_toggle(
        &mut self,
        id: &CameraId,
        enabled: bool,
        result: &Result<(), CommandError>,
    ) -> StoreChange {
        let entry = self.entry_mut(id);
        entry.pending_detection = None;

        match result {
            Ok(()) => {
                entry.state.is_detecting = enabled;
                entry.state.error = None;
                entry.awaiting_detections = enabled;
                entry.clear_detections();
                StoreChange::DetectionsCleared
            }
            Err(e) => {
                entry.state.error = Some(e.to_string());
                tracing::warn!(camera = %id, enabled, error = %e, "Detection toggle failed");
                StoreChange::StatusChanged
            }
        }
    }

    /// Replace a camera's display and alert preferences
    pub fn set_settings(&mut self, id: &CameraId, settings: CameraSettings) {
        self.entry_mut(id).settings = settings;
    }

    /// Record a command failure that has no state to roll back
    pub fn record_error(&mut self, id: &CameraId, message: impl Into<String>) {
        self.entry_mut(id).state.error = Some(message.into());
    }

    /// Clear a camera's error text
    pub fn clear_error(&mut self, id: &CameraId) {
        if let Some(entry) = self.cameras.get_mut(id) {
            entry.state.error = None;
        }
    }

    /// Get a camera entry
    pub fn get(&self, id: &CameraId) -> Option<&CameraEntry> {
        self.cameras.get(id)
    }

    /// Runtime status of a camera
    pub fn state(&self, id: &CameraId) -> Option<&CameraRuntimeState> {
        self.cameras.get(id).map(|e| &e.state)
    }

    /// Display and alert preferences of a camera
    pub fn settings(&self, id: &CameraId) -> Option<&CameraSettings> {
        self.cameras.get(id).map(|e| &e.settings)
    }

    /// Newest frame for a camera
    pub fn frame(&self, id: &CameraId) -> Option<&Frame> {
        self.cameras.get(id).and_then(|e| e.frame.as_ref())
    }

    /// Newest detection set for a camera
    pub fn detections(&self, id: &CameraId) -> Option<&DetectionSet> {
        self.cameras.get(id).map(|e| &e.detections)
    }

    /// Newest object counts for a camera
    pub fn object_counts(&self, id: &CameraId) -> Option<&ObjectCounts> {
        self.cameras.get(id).map(|e| &e.object_counts)
    }

    /// Detection presentation for a camera
    ///
    /// `Unknown` while the session is down, like [`presence`](Self::presence).
    pub fn detection_view(&self, id: &CameraId) -> Option<DetectionView<'_>> {
        let entry = self.cameras.get(id)?;
        Some(if self.connected {
            entry.detection_view()
        } else {
            DetectionView::Unknown
        })
    }

    /// Streaming presentation for a camera
    ///
    /// While the session is down every camera reads as `Unknown`; the
    /// underlying flags and error text are left untouched.
    pub fn presence(&self, id: &CameraId) -> Option<Presence> {
        let entry = self.cameras.get(id)?;
        Some(if !self.connected {
            Presence::Unknown
        } else if entry.state.is_streaming {
            Presence::Live
        } else {
            Presence::Stopped
        })
    }

    /// Copy of a camera's state
    pub fn snapshot(&self, id: &CameraId) -> Option<CameraSnapshot> {
        self.cameras.get(id).map(CameraSnapshot::from)
    }

    /// Known camera ids, sorted
    pub fn camera_ids(&self) -> Vec<CameraId> {
        let mut ids: Vec<CameraId> = self.cameras.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of known cameras
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    /// Whether no camera is known
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Last-seen time for a camera
    pub fn last_seen(&self, id: &CameraId) -> Option<DateTime<Utc>> {
        self.cameras.get(id).and_then(|e| e.state.last_seen)
    }

    fn entry_mut(&mut self, id: &CameraId) -> &mut CameraEntry {
        self.cameras.entry(id.clone()).or_insert_with(|| {
            tracing::debug!(camera = %id, "New camera entry");
            CameraEntry::new()
        })
    }
}
