//! User-visible notifications

use std::fmt;

use crate::store::CameraId;

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A transient message for the user
///
/// Notices are how failures reach the user; nothing the engine does raises
/// past them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    /// Camera the notice is about, if any
    pub camera: Option<CameraId>,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            camera: None,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            camera: None,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            camera: None,
            message: message.into(),
        }
    }

    /// Attach the camera this notice concerns
    pub fn for_camera(mut self, camera: CameraId) -> Self {
        self.camera = Some(camera);
        self
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.camera {
            Some(camera) => write!(f, "[{}] {}", camera, self.message),
            None => f.write_str(&self.message),
        }
    }
}
