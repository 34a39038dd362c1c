//! Per-camera frame pipeline
//!
//! Sequences decodes for one camera. Decodes may finish out of order, so
//! each carries the store sequence number of its frame and a result older
//! than the picture already on screen is dropped.
//!
//! ```text
//!   Store frame (seq n) ──► request() ──► DecodeJob ──► blocking pool
//!                                                          │
//!   surface (last good picture) ◄── complete(seq, result) ◄┘
//!          older than shown?     → Stale, dropped
//!          decode failed?        → Failed, previous picture kept
//!          not streaming?        → Stale, placeholder stays
//! ```

use image::RgbaImage;

use crate::error::DecodeError;
use crate::store::{CameraId, Frame};

use super::decode::DecodeJob;
use super::surface::RenderSurface;

/// What the camera tile currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// Not streaming; no decode is attempted
    Placeholder,
    /// Streaming but no frame has decoded yet
    Waiting,
    /// A decoded picture is on the surface
    Showing,
}

/// Result of completing a decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// The picture on the surface was replaced
    Rendered,
    /// A newer picture is already shown or the camera stopped; result dropped
    Stale,
    /// Decoding failed; the previous picture stays
    Failed(DecodeError),
}

/// Frame pipeline for one camera
#[derive(Debug)]
pub struct FramePipeline {
    camera_id: CameraId,
    surface: RenderSurface,
    state: RenderState,
    /// Newest sequence handed out as a decode job
    requested_seq: u64,
    /// Sequence of the picture on the surface
    shown_seq: u64,
    /// Decodes at or below this sequence predate the last placeholder
    floor_seq: u64,
}

impl FramePipeline {
    /// Create a pipeline that starts on the placeholder
    pub fn new(camera_id: CameraId) -> Self {
        Self {
            camera_id,
            surface: RenderSurface::new(),
            state: RenderState::Placeholder,
            requested_seq: 0,
            shown_seq: 0,
            floor_seq: 0,
        }
    }

    pub fn camera_id(&self) -> &CameraId {
        &self.camera_id
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    /// Sequence of the picture on screen (0 if none)
    pub fn shown_seq(&self) -> u64 {
        self.shown_seq
    }

    /// Ask for a frame to be decoded
    ///
    /// Returns `None` if the frame is not newer than what was already
    /// requested.
    pub fn request(&mut self, seq: u64, frame: &Frame) -> Option<DecodeJob> {
        if seq <= self.requested_seq {
            return None;
        }

        self.requested_seq = seq;
        if self.state == RenderState::Placeholder {
            self.state = RenderState::Waiting;
        }

        Some(DecodeJob {
            camera_id: self.camera_id.clone(),
            seq,
            image: frame.image.clone(),
        })
    }

    /// Apply a finished decode
    pub fn complete(&mut self, seq: u64, result: Result<RgbaImage, DecodeError>) -> DecodeOutcome {
        if self.state == RenderState::Placeholder || seq <= self.shown_seq.max(self.floor_seq) {
            tracing::trace!(camera = %self.camera_id, seq, "Dropping stale decode");
            return DecodeOutcome::Stale;
        }

        match result {
            Ok(image) => {
                self.surface.blit(&image);
                self.shown_seq = seq;
                self.state = RenderState::Showing;
                DecodeOutcome::Rendered
            }
            Err(e) => {
                tracing::debug!(camera = %self.camera_id, seq, error = %e, "Frame decode failed");
                DecodeOutcome::Failed(e)
            }
        }
    }

    /// Switch to the placeholder and drop the picture
    ///
    /// Returns whether anything changed.
    pub fn show_placeholder(&mut self) -> bool {
        if self.state == RenderState::Placeholder {
            return false;
        }

        self.state = RenderState::Placeholder;
        self.surface.clear();
        self.shown_seq = 0;
        self.floor_seq = self.requested_seq;
        true
    }
}
