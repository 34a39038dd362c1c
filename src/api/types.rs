//! Request and response bodies for the camera REST collaborator

use serde::{Deserialize, Serialize};

use crate::store::CameraId;

/// Camera as listed by the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    pub id: CameraId,
    pub name: String,
    pub ip_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Stored flag; says nothing about whether frames are flowing right now
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body for registering a camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCamera {
    pub name: String,
    pub ip_address: String,
    pub port: u16,
}

impl NewCamera {
    /// Camera on the default IP-webcam port
    pub fn new(name: impl Into<String>, ip_address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip_address: ip_address.into(),
            port: default_port(),
        }
    }

    /// Override the port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

fn default_port() -> u16 {
    8080
}

/// Per-camera display and alert preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Classes that may raise a cue; empty means all
    pub enabled_classes: Vec<String>,
    /// Minimum confidence for a detection to raise a cue
    pub confidence_threshold: f32,
    /// Draw annotation boxes over the frame
    pub show_boxes: bool,
    /// Play detection cues for this camera
    pub sound_alerts: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            enabled_classes: Vec::new(),
            confidence_threshold: 0.5,
            show_boxes: true,
            sound_alerts: true,
        }
    }
}

impl CameraSettings {
    /// Whether a detection of `class` at `confidence` should sound a cue
    pub fn allows_cue(&self, class: &str, confidence: f32) -> bool {
        if !self.sound_alerts || confidence < self.confidence_threshold {
            return false;
        }

        self.enabled_classes.is_empty()
            || self
                .enabled_classes
                .iter()
                .any(|c| c.eq_ignore_ascii_case(class))
    }
}

/// Plain `{"message": ...}` acknowledgement body
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

/// Error body, `{"detail": ...}` or `{"message": ...}`
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        self.detail.or(self.message)
    }
}
