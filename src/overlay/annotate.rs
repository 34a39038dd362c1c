//! Drawn annotations
//!
//! Boxes are stroked directly into the native-resolution picture, so they
//! scale with it when displayed. Each class keeps one colour from a small
//! palette.

use image::{Rgba, RgbaImage};

use crate::store::{BoundingBox, DetectionSet};

/// Stroke width in native pixels
pub const STROKE_WIDTH: i64 = 2;

const PALETTE: [[u8; 3]; 10] = [
    [255, 0, 0],
    [0, 255, 0],
    [0, 0, 255],
    [255, 255, 0],
    [255, 0, 255],
    [0, 255, 255],
    [128, 0, 128],
    [255, 165, 0],
    [255, 192, 203],
    [0, 128, 0],
];

/// Stable colour for a class name
pub fn class_color(class: &str) -> Rgba<u8> {
    // FNV-1a, so colours do not change between builds
    let hash = class
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325u64, |acc, b| {
            (acc ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
        });
    let [r, g, b] = PALETTE[(hash % PALETTE.len() as u64) as usize];
    Rgba([r, g, b, 255])
}

/// Stroke every renderable detection, in set order
///
/// Later boxes overwrite earlier ones where they overlap. Boxes are clipped
/// to the image.
pub fn draw_annotations(image: &mut RgbaImage, set: &DetectionSet) -> usize {
    let mut drawn = 0;
    for (_, class, bbox) in set.renderable() {
        stroke_rect(image, bbox, class_color(class));
        drawn += 1;
    }
    drawn
}

fn stroke_rect(image: &mut RgbaImage, bbox: &BoundingBox, color: Rgba<u8>) {
    let x2 = bbox.x1 + bbox.width;
    let y2 = bbox.y1 + bbox.height;
    if ![bbox.x1, bbox.y1, x2, y2].iter().all(|v| v.is_finite()) {
        return;
    }

    // Edges further out than one stroke never reach the image
    let margin = STROKE_WIDTH as f64;
    let max_x = f64::from(image.width()) + margin;
    let max_y = f64::from(image.height()) + margin;
    let left = bbox.x1.round().clamp(-margin, max_x) as i64;
    let top = bbox.y1.round().clamp(-margin, max_y) as i64;
    let right = x2.round().clamp(-margin, max_x) as i64 - 1;
    let bottom = y2.round().clamp(-margin, max_y) as i64 - 1;

    if right < left || bottom < top {
        return;
    }

    let inner = STROKE_WIDTH - 1;
    fill_rect(image, left, top, right, (top + inner).min(bottom), color);
    fill_rect(image, left, (bottom - inner).max(top), right, bottom, color);
    fill_rect(image, left, top, (left + inner).min(right), bottom, color);
    fill_rect(image, (right - inner).max(left), top, right, bottom, color);
}

fn fill_rect(image: &mut RgbaImage, left: i64, top: i64, right: i64, bottom: i64, color: Rgba<u8>) {
    let width = i64::from(image.width());
    let height = i64::from(image.height());

    let left = left.max(0);
    let top = top.max(0);
    let right = right.min(width - 1);
    let bottom = bottom.min(height - 1);

    for y in top..=bottom {
        for x in left..=right {
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}
