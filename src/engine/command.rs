//! Engine inputs: user commands and REST acknowledgements

use std::collections::BTreeMap;

use tokio::sync::oneshot;

use crate::api::{CameraRecord, CameraSettings, NewCamera};
use crate::error::CommandError;
use crate::overlay::{ClickableRegion, Point, Size};
use crate::render::RenderState;
use crate::session::SessionId;
use crate::store::{CameraId, CameraSnapshot, DetectionMode, Presence};

/// Something the user asked for
#[derive(Debug)]
pub enum UserCommand {
    /// Start streaming a camera
    Start(CameraId),
    /// Stop streaming a camera
    Stop(CameraId),
    /// Switch detection on or off
    SetDetection { camera: CameraId, enabled: bool },
    /// Register a camera
    AddCamera(NewCamera),
    /// Delete a camera and everything derived from it
    RemoveCamera(CameraId),
    /// Replace a camera's display and alert preferences
    UpdateSettings {
        camera: CameraId,
        settings: CameraSettings,
    },
    /// The camera tile was laid out at a new size or position
    Resize {
        camera: CameraId,
        displayed: Size,
        offset: Point,
    },
    /// A click at container coordinates on a camera tile
    Click { camera: CameraId, x: f64, y: f64 },
    /// Switch audio cues on or off
    SetSoundEnabled(bool),
    /// Set the master volume
    SetMasterVolume(f32),
    /// Unlock audio output after a user gesture
    ResumeAudio,
    /// Open a new session after the previous one closed
    Reconnect,
    /// Read the current dashboard state
    Snapshot(oneshot::Sender<DashboardSnapshot>),
    /// Stop the engine
    Shutdown,
}

/// Result of a REST command, tagged with the session it was issued under
#[derive(Debug)]
pub(crate) struct CommandAck {
    pub session: SessionId,
    pub outcome: AckOutcome,
}

#[derive(Debug)]
pub(crate) enum AckOutcome {
    Start {
        camera: CameraId,
        result: Result<(), CommandError>,
    },
    Stop {
        camera: CameraId,
        result: Result<(), CommandError>,
    },
    Toggle {
        camera: CameraId,
        enabled: bool,
        result: Result<(), CommandError>,
    },
    Added(Result<CameraRecord, CommandError>),
    Removed {
        camera: CameraId,
        result: Result<(), CommandError>,
    },
    SettingsSaved {
        camera: CameraId,
        result: Result<CameraSettings, CommandError>,
    },
    SettingsLoaded {
        camera: CameraId,
        result: Result<CameraSettings, CommandError>,
    },
}

/// One camera as the dashboard shows it
#[derive(Debug, Clone)]
pub struct CameraTile {
    pub snapshot: CameraSnapshot,
    pub presence: Presence,
    /// Detection presentation; `Unknown` while the session is down
    pub detection: DetectionMode,
    pub render: RenderState,
    /// Clickable regions from the last render pass
    pub regions: Vec<ClickableRegion>,
}

/// Point-in-time copy of the whole dashboard
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    /// Whether the transport session is open
    pub connected: bool,
    /// Session the engine is on (the last one opened; 0 before any)
    pub session_id: SessionId,
    pub sound_enabled: bool,
    pub master_volume: f32,
    pub cameras: BTreeMap<CameraId, CameraTile>,
}

impl DashboardSnapshot {
    pub fn camera(&self, id: &CameraId) -> Option<&CameraTile> {
        self.cameras.get(id)
    }
}
