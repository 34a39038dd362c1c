//! Source-image to screen coordinate mapping
//!
//! Detection boxes are reported in the pixel space of the source image. The
//! surface is displayed at some other size, possibly with a different aspect
//! ratio, so each axis gets its own scale factor:
//!
//! ```text
//!   scale_x = displayed.width  / native.width
//!   scale_y = displayed.height / native.height
//!
//!   screen = (x1 * scale_x + offset.x,
//!             y1 * scale_y + offset.y,
//!             width  * scale_x,
//!             height * scale_y)
//! ```
//!
//! Regions are recomputed on every render and resize and never cached.

use serde::Serialize;

use crate::store::DetectionSet;

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether either side is zero, negative or not finite
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width as f64, height as f64)
    }
}

/// Position in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// How a render surface is laid out on screen
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceLayout {
    /// Native pixel size of the image on the surface
    pub native: Size,
    /// Size the surface is displayed at
    pub displayed: Size,
    /// Position of the surface within its container
    pub offset: Point,
}

impl SurfaceLayout {
    /// Layout displayed at native size at the container origin
    pub fn native(native: Size) -> Self {
        Self {
            native,
            displayed: native,
            offset: Point::default(),
        }
    }

    pub fn new(native: Size, displayed: Size) -> Self {
        Self {
            native,
            displayed,
            offset: Point::default(),
        }
    }

    pub fn with_offset(mut self, offset: Point) -> Self {
        self.offset = offset;
        self
    }

    /// Per-axis scale factors, or `None` if either size is degenerate
    pub fn scale(&self) -> Option<(f64, f64)> {
        if self.native.is_degenerate() || self.displayed.is_degenerate() {
            return None;
        }
        Some((
            self.displayed.width / self.native.width,
            self.displayed.height / self.native.height,
        ))
    }
}

/// Screen-space rectangle tied to one detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClickableRegion {
    /// Index of the detection in its set
    pub detection_index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ClickableRegion {
    /// Whether the point lies inside (edges inclusive)
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// Map every renderable detection to a screen region, in set order
///
/// Detections without a class name or box are skipped. Nothing is produced
/// while the layout is degenerate (no picture yet, or a collapsed surface).
pub fn map_detections(set: &DetectionSet, layout: &SurfaceLayout) -> Vec<ClickableRegion> {
    let Some((scale_x, scale_y)) = layout.scale() else {
        return Vec::new();
    };

    set.renderable()
        .map(|(index, _, bbox)| ClickableRegion {
            detection_index: index,
            x: bbox.x1 * scale_x + layout.offset.x,
            y: bbox.y1 * scale_y + layout.offset.y,
            width: bbox.width * scale_x,
            height: bbox.height * scale_y,
        })
        .collect()
}

/// Detection index under the point
///
/// Later regions are drawn on top, so the last match wins.
pub fn hit_test(regions: &[ClickableRegion], x: f64, y: f64) -> Option<usize> {
    regions
        .iter()
        .rev()
        .find(|region| region.contains(x, y))
        .map(|region| region.detection_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BoundingBox, Detection};

    fn person_set() -> DetectionSet {
        DetectionSet::new(vec![Detection::new(
            "person",
            0.92,
            BoundingBox::from_corners(100.0, 50.0, 200.0, 300.0),
        )])
    }

    #[test]
    fn test_identity_mapping() {
        let layout = SurfaceLayout::native(Size::new(640.0, 480.0));
        let regions = map_detections(&person_set(), &layout);

        assert_eq!(
            regions,
            vec![ClickableRegion {
                detection_index: 0,
                x: 100.0,
                y: 50.0,
                width: 100.0,
                height: 250.0,
            }]
        );
    }

    #[test]
    fn test_independent_axis_scaling() {
        let layout = SurfaceLayout::new(Size::new(640.0, 480.0), Size::new(320.0, 360.0));
        let region = map_detections(&person_set(), &layout)[0];

        assert_eq!(region.width, 100.0 * 320.0 / 640.0);
        assert_eq!(region.height, 250.0 * 360.0 / 480.0);
        assert_eq!(region.x, 50.0);
        assert_eq!(region.y, 37.5);
    }

    #[test]
    fn test_offset_moves_origin_only() {
        let layout = SurfaceLayout::new(Size::new(640.0, 480.0), Size::new(1280.0, 960.0))
            .with_offset(Point::new(10.0, 20.0));
        let region = map_detections(&person_set(), &layout)[0];

        assert_eq!((region.x, region.y), (210.0, 120.0));
        assert_eq!((region.width, region.height), (200.0, 500.0));
    }

    #[test]
    fn test_size_ratio_holds_for_many_layouts() {
        let native = Size::new(1920.0, 1080.0);
        let bbox = BoundingBox::from_origin_size(13.0, 7.0, 333.0, 77.0);
        let set = DetectionSet::new(vec![Detection::new("car", 0.5, bbox)]);

        for (w, h) in [(1.0, 1.0), (640.0, 360.0), (1000.0, 300.0), (3840.0, 2160.0)] {
            let layout = SurfaceLayout::new(native, Size::new(w, h));
            let region = map_detections(&set, &layout)[0];

            assert!((region.width - 333.0 * w / 1920.0).abs() < 1e-9);
            assert!((region.height - 77.0 * h / 1080.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_incomplete_detections_produce_no_region() {
        let set = DetectionSet::new(vec![
            Detection {
                class_name: None,
                confidence: Some(0.9),
                bbox: Some(BoundingBox::from_corners(0.0, 0.0, 10.0, 10.0)),
            },
            Detection {
                class_name: Some("dog".into()),
                confidence: None,
                bbox: None,
            },
        ]);
        let layout = SurfaceLayout::native(Size::new(100.0, 100.0));

        assert!(map_detections(&set, &layout).is_empty());
    }

    #[test]
    fn test_degenerate_layout_maps_nothing() {
        let layout = SurfaceLayout::new(Size::default(), Size::new(100.0, 100.0));
        assert!(map_detections(&person_set(), &layout).is_empty());

        let layout = SurfaceLayout::new(Size::new(640.0, 480.0), Size::new(0.0, 100.0));
        assert!(map_detections(&person_set(), &layout).is_empty());
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let set = DetectionSet::new(vec![
            Detection::new("person", 0.9, BoundingBox::from_corners(0.0, 0.0, 100.0, 100.0)),
            Detection {
                class_name: None,
                confidence: None,
                bbox: None,
            },
            Detection::new("dog", 0.9, BoundingBox::from_corners(50.0, 50.0, 150.0, 150.0)),
        ]);
        let regions = map_detections(&set, &SurfaceLayout::native(Size::new(200.0, 200.0)));

        assert_eq!(hit_test(&regions, 75.0, 75.0), Some(2));
        assert_eq!(hit_test(&regions, 10.0, 10.0), Some(0));
        assert_eq!(hit_test(&regions, 190.0, 10.0), None);
    }
}
