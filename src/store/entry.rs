//! Per-camera entry and state types
//!
//! This module defines the live state the store keeps for each camera.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::CameraSettings;

use super::detection::{DetectionSet, ObjectCounts};
use super::frame::Frame;

/// Runtime status of one camera
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CameraRuntimeState {
    /// Frames are expected (or arriving) for this camera
    pub is_streaming: bool,
    /// Detection is switched on for this camera
    pub is_detecting: bool,
    /// Time of the newest frame or detection event (None until the first one)
    pub last_seen: Option<DateTime<Utc>>,
    /// Last command or camera-side failure
    pub error: Option<String>,
}

/// What the detection area of a camera tile should show
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectionView<'a> {
    /// Detection is off
    Off,
    /// Detection is on but nothing has arrived since it was switched on
    Scanning,
    /// Detection is on and this is the newest set
    Live(&'a DetectionSet),
    /// The session is down, so the set may be stale
    Unknown,
}

/// Owned form of [`DetectionView`] for handing across tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    Off,
    Scanning,
    Live,
    Unknown,
}

impl From<DetectionView<'_>> for DetectionMode {
    fn from(view: DetectionView<'_>) -> Self {
        match view {
            DetectionView::Off => DetectionMode::Off,
            DetectionView::Scanning => DetectionMode::Scanning,
            DetectionView::Live(_) => DetectionMode::Live,
            DetectionView::Unknown => DetectionMode::Unknown,
        }
    }
}

/// How a camera's streaming flag should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Streaming according to the store
    Live,
    /// Not streaming according to the store
    Stopped,
    /// The session is down, so the store can't be trusted
    Unknown,
}

/// An optimistic command awaiting acknowledgement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PendingStream {
    /// Start issued; holds the pre-command streaming flag
    Start { prior: bool },
    /// Stop issued; holds the pre-command streaming flag
    Stop { prior: bool },
}

/// Entry for a single camera in the store
#[derive(Debug, Clone)]
pub struct CameraEntry {
    /// Runtime status
    pub state: CameraRuntimeState,

    /// Display name from the registry, if known
    pub name: Option<String>,

    /// Newest frame (last-write-wins)
    pub frame: Option<Frame>,

    /// Store-wide sequence number of `frame`; 0 when there is none
    pub frame_seq: u64,

    /// Newest detection set
    pub detections: DetectionSet,

    /// Counts delivered with (or derived from) `detections`
    pub object_counts: ObjectCounts,

    /// Detection was switched on and no detection event has arrived since
    pub awaiting_detections: bool,

    /// Display and alert preferences
    pub settings: CameraSettings,

    /// Start/stop awaiting acknowledgement
    pub(super) pending_stream: Option<PendingStream>,

    /// Requested detection flag awaiting acknowledgement
    pub(super) pending_detection: Option<bool>,
}

impl CameraEntry {
    /// Create an empty entry
    pub(super) fn new() -> Self {
        Self {
            state: CameraRuntimeState::default(),
            name: None,
            frame: None,
            frame_seq: 0,
            detections: DetectionSet::default(),
            object_counts: ObjectCounts::default(),
            awaiting_detections: false,
            settings: CameraSettings::default(),
            pending_stream: None,
            pending_detection: None,
        }
    }

    /// Detection presentation from the entry's own flags
    ///
    /// Never `Unknown`; the store adds that when the session is down.
    pub fn detection_view(&self) -> DetectionView<'_> {
        if !self.state.is_detecting {
            DetectionView::Off
        } else if self.awaiting_detections {
            DetectionView::Scanning
        } else {
            DetectionView::Live(&self.detections)
        }
    }

    /// Whether a start or stop is awaiting acknowledgement
    pub fn has_pending_stream_command(&self) -> bool {
        self.pending_stream.is_some()
    }

    /// Drop the detection set and counts
    pub(super) fn clear_detections(&mut self) {
        self.detections = DetectionSet::default();
        self.object_counts = ObjectCounts::default();
    }

    /// Drop the cached frame
    pub(super) fn clear_frame(&mut self) {
        self.frame = None;
        self.frame_seq = 0;
    }

    /// Advance `last_seen`, never moving it backwards
    pub(super) fn touch(&mut self, at: DateTime<Utc>) {
        if self.state.last_seen.map_or(true, |seen| at > seen) {
            self.state.last_seen = Some(at);
        }
    }
}

/// Read-only copy of a camera entry, safe to hand across tasks
#[derive(Debug, Clone, Serialize)]
pub struct CameraSnapshot {
    pub state: CameraRuntimeState,
    pub name: Option<String>,
    pub has_frame: bool,
    pub detections: DetectionSet,
    pub object_counts: ObjectCounts,
    /// Detection is on and waiting for its first set (ignores the session)
    pub scanning: bool,
    pub settings: CameraSettings,
}

impl From<&CameraEntry> for CameraSnapshot {
    fn from(entry: &CameraEntry) -> Self {
        Self {
            state: entry.state.clone(),
            name: entry.name.clone(),
            has_frame: entry.frame.is_some(),
            detections: entry.detections.clone(),
            object_counts: entry.object_counts.clone(),
            scanning: matches!(entry.detection_view(), DetectionView::Scanning),
            settings: entry.settings.clone(),
        }
    }
}
