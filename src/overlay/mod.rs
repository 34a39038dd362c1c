//! Detection overlay and coordinate mapper
//!
//! Turns a camera's [`DetectionSet`](crate::store::DetectionSet) into two
//! things: hit-testable [`ClickableRegion`]s in screen space and boxes drawn
//! onto the native picture.
//!
//! ```text
//!   DetectionSet ──┬─► map_detections(layout) ──► Vec<ClickableRegion> ──► hit_test(x, y)
//!                  │
//!                  └─► draw_annotations(&mut RgbaImage)
//! ```
//!
//! Both skip detections without a class name or bounding box and keep set
//! order, so the last entry is on top.

pub mod annotate;
pub mod mapper;

pub use annotate::{class_color, draw_annotations};
pub use mapper::{hit_test, map_detections, ClickableRegion, Point, Size, SurfaceLayout};
