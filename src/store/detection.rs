//! Detection types
//!
//! A [`DetectionSet`] is the complete list attached to the newest detection
//! event for a camera. Each event replaces the previous set and its
//! [`ObjectCounts`] wholesale; nothing is merged across events.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Axis-aligned box in source-image pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Build from the two corners
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Build from origin and size
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y + height,
            width,
            height,
        }
    }
}

/// One detected object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Object class, e.g. "person"
    pub class_name: Option<String>,
    /// Model confidence in `0..=1`
    pub confidence: Option<f32>,
    /// Location in the source image
    pub bbox: Option<BoundingBox>,
}

impl Detection {
    /// Create a fully populated detection
    pub fn new(class_name: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            class_name: Some(class_name.into()),
            confidence: Some(confidence),
            bbox: Some(bbox),
        }
    }

    /// Class and box, if both are present
    ///
    /// Detections lacking either are never drawn and never clickable.
    pub fn renderable(&self) -> Option<(&str, &BoundingBox)> {
        match (&self.class_name, &self.bbox) {
            (Some(class), Some(bbox)) => Some((class.as_str(), bbox)),
            _ => None,
        }
    }
}

/// Ordered detections from the newest detection event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectionSet(Vec<Detection>);

impl DetectionSet {
    /// Create a set from detections in event order
    pub fn new(detections: Vec<Detection>) -> Self {
        Self(detections)
    }

    /// Number of detections, renderable or not
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Detection at `index`
    pub fn get(&self, index: usize) -> Option<&Detection> {
        self.0.get(index)
    }

    /// Iterate in event order
    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.0.iter()
    }

    /// Renderable detections with their index in the set
    pub fn renderable(&self) -> impl Iterator<Item = (usize, &str, &BoundingBox)> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.renderable().map(|(class, bbox)| (i, class, bbox)))
    }

    /// Highest confidence seen per class
    ///
    /// Detections without a confidence count as 0.
    pub fn best_confidence_by_class(&self) -> BTreeMap<String, f32> {
        let mut best: BTreeMap<String, f32> = BTreeMap::new();
        for detection in &self.0 {
            if let Some(class) = &detection.class_name {
                let confidence = detection.confidence.unwrap_or(0.0);
                let slot = best.entry(class.clone()).or_insert(confidence);
                if confidence > *slot {
                    *slot = confidence;
                }
            }
        }
        best
    }
}

/// Per-class object counts for one camera
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectCounts(BTreeMap<String, u32>);

impl ObjectCounts {
    /// Wrap an existing mapping
    pub fn new(counts: BTreeMap<String, u32>) -> Self {
        Self(counts)
    }

    /// Count classes in a detection set
    pub fn from_detections(set: &DetectionSet) -> Self {
        let mut counts = BTreeMap::new();
        for class in set.iter().filter_map(|d| d.class_name.as_ref()) {
            *counts.entry(class.clone()).or_insert(0) += 1;
        }
        Self(counts)
    }

    /// Count for a class (0 if absent)
    pub fn get(&self, class: &str) -> u32 {
        self.0.get(class).copied().unwrap_or(0)
    }

    /// Whether the class has a non-zero count
    pub fn contains(&self, class: &str) -> bool {
        self.get(class) > 0
    }

    /// Whether no class is counted
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum over all classes
    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    /// Iterate `(class, count)` in class order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(confidence: f32) -> Detection {
        Detection::new("person", confidence, BoundingBox::from_corners(0.0, 0.0, 10.0, 20.0))
    }

    #[test]
    fn test_bbox_constructors_agree() {
        let a = BoundingBox::from_corners(100.0, 50.0, 200.0, 300.0);
        let b = BoundingBox::from_origin_size(100.0, 50.0, 100.0, 250.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_renderable_skips_incomplete() {
        let set = DetectionSet::new(vec![
            Detection {
                class_name: None,
                confidence: Some(0.9),
                bbox: Some(BoundingBox::from_corners(0.0, 0.0, 1.0, 1.0)),
            },
            person(0.7),
            Detection {
                class_name: Some("car".into()),
                confidence: Some(0.9),
                bbox: None,
            },
        ]);

        let indices: Vec<usize> = set.renderable().map(|(i, _, _)| i).collect();
        assert_eq!(indices, vec![1]);
    }

    #[test]
    fn test_counts_from_detections() {
        let set = DetectionSet::new(vec![person(0.5), person(0.9)]);
        let counts = ObjectCounts::from_detections(&set);
        assert_eq!(counts.get("person"), 2);
        assert_eq!(counts.get("dog"), 0);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn test_best_confidence_by_class() {
        let set = DetectionSet::new(vec![person(0.5), person(0.9), person(0.6)]);
        let best = set.best_confidence_by_class();
        assert_eq!(best.get("person"), Some(&0.9));
    }
}
