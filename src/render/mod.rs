//! Frame decode and render pipeline
//!
//! Each camera gets a [`FramePipeline`] holding a [`RenderSurface`] sized to
//! the native resolution of its newest decoded frame. Decoding is async
//! (blocking pool); the pipeline only decides which results to keep.
//!
//! A camera that is not streaming shows a placeholder and nothing is
//! decoded for it. A failed decode leaves the previous picture in place.

pub mod decode;
pub mod pipeline;
pub mod surface;

pub use decode::{decode_frame, decode_image, DecodeJob, DecodedFrame};
pub use pipeline::{DecodeOutcome, FramePipeline, RenderState};
pub use surface::RenderSurface;
