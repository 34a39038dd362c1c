//! Wire messages
//!
//! Every message is a JSON object discriminated by its `type` field.
//!
//! Inbound:
//!
//! | `type`              | Fields                                              |
//! |---------------------|-----------------------------------------------------|
//! | `frame`             | `camera_id`, `frame` (base64), `timestamp`          |
//! | `detection`         | `camera_id`, `detections`, `object_counts`, `timestamp` |
//! | `detection_status`  | `camera_id`, `enabled`                              |
//! | `pong`              | (keepalive acknowledgement)                         |
//! | `connected`         | `client_id`                                         |
//! | `camera_status`     | `camera_id`, `status` (`started` / `stopped`)       |
//! | `error`             | `camera_id` (optional), `message`                   |
//! | `subscribed`        | `camera_id`                                         |
//! | `unsubscribed`      | `camera_id`                                         |
//!
//! Outbound: `ping`, `subscribe_camera`, `unsubscribe_camera`.
//!
//! Senders disagree on some details, so parsing is lenient: `cameraId` is
//! accepted for `camera_id`, `class` for `class_name`, and a bounding box may
//! be an object with corners or a `[x, y, width, height]` array.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{
    parse_timestamp, BoundingBox, CameraId, Detection, DetectionSet, EncodedImage, Frame,
    ObjectCounts,
};

/// Payload of a `detection` message
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionEvent {
    /// Camera the detections belong to
    pub camera_id: CameraId,
    /// Detections in sender order
    pub detections: DetectionSet,
    /// Counts sent alongside, if any
    pub object_counts: Option<ObjectCounts>,
    /// Sender timestamp (receipt time if absent)
    pub timestamp: DateTime<Utc>,
}

/// Typed inbound event
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// Newest still for a camera
    Frame(Frame),
    /// Newest detection set for a camera
    Detection(DetectionEvent),
    /// Detection switched on or off server-side
    DetectionStatus { camera_id: CameraId, enabled: bool },
    /// Reply to a keepalive probe
    KeepaliveAck,
    /// Server confirmed the session
    Connected { client_id: Option<String> },
    /// Camera started or stopped server-side
    CameraStatus { camera_id: CameraId, streaming: bool },
    /// Camera-side failure
    CameraError { camera_id: CameraId, message: String },
    /// Failure not tied to a camera
    ServerError { message: String },
    /// Subscription confirmed
    Subscribed { camera_id: CameraId },
    /// Unsubscription confirmed
    Unsubscribed { camera_id: CameraId },
}

impl InboundEvent {
    /// Camera this event is about, if any
    pub fn camera_id(&self) -> Option<&CameraId> {
        match self {
            InboundEvent::Frame(frame) => Some(&frame.camera_id),
            InboundEvent::Detection(event) => Some(&event.camera_id),
            InboundEvent::DetectionStatus { camera_id, .. }
            | InboundEvent::CameraStatus { camera_id, .. }
            | InboundEvent::CameraError { camera_id, .. }
            | InboundEvent::Subscribed { camera_id }
            | InboundEvent::Unsubscribed { camera_id } => Some(camera_id),
            InboundEvent::KeepaliveAck
            | InboundEvent::Connected { .. }
            | InboundEvent::ServerError { .. } => None,
        }
    }

    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::Frame(_) => "frame",
            InboundEvent::Detection(_) => "detection",
            InboundEvent::DetectionStatus { .. } => "detection_status",
            InboundEvent::KeepaliveAck => "pong",
            InboundEvent::Connected { .. } => "connected",
            InboundEvent::CameraStatus { .. } => "camera_status",
            InboundEvent::CameraError { .. } | InboundEvent::ServerError { .. } => "error",
            InboundEvent::Subscribed { .. } => "subscribed",
            InboundEvent::Unsubscribed { .. } => "unsubscribed",
        }
    }
}

/// Message sent to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Keepalive probe
    Ping,
    /// Ask for frames of one camera
    SubscribeCamera { camera_id: CameraId },
    /// Stop frames of one camera
    UnsubscribeCamera { camera_id: CameraId },
}

impl OutboundMessage {
    /// Encode for the wire
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireInbound {
    Frame {
        #[serde(alias = "cameraId")]
        camera_id: CameraId,
        frame: String,
        #[serde(default)]
        timestamp: Option<String>,
    },
    Detection {
        #[serde(alias = "cameraId")]
        camera_id: CameraId,
        #[serde(default)]
        detections: Vec<WireDetection>,
        #[serde(default, alias = "objectCounts")]
        object_counts: Option<BTreeMap<String, u32>>,
        #[serde(default)]
        timestamp: Option<String>,
    },
    #[serde(alias = "detectionStatus")]
    DetectionStatus {
        #[serde(alias = "cameraId")]
        camera_id: CameraId,
        enabled: bool,
    },
    #[serde(alias = "keepalive_ack", alias = "keepaliveAck")]
    Pong,
    Connected {
        #[serde(default)]
        client_id: Option<String>,
    },
    CameraStatus {
        #[serde(alias = "cameraId")]
        camera_id: CameraId,
        status: String,
    },
    Error {
        #[serde(default, alias = "cameraId")]
        camera_id: Option<CameraId>,
        #[serde(default)]
        message: String,
    },
    Subscribed {
        #[serde(alias = "cameraId")]
        camera_id: CameraId,
    },
    Unsubscribed {
        #[serde(alias = "cameraId")]
        camera_id: CameraId,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct WireDetection {
    #[serde(default, alias = "class", alias = "className")]
    class_name: Option<String>,
    #[serde(default)]
    confidence: Option<serde_json::Value>,
    #[serde(default, alias = "bounding_box", alias = "boundingBox")]
    bbox: Option<WireBox>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireBox {
    Corners {
        x1: f64,
        y1: f64,
        #[serde(default)]
        x2: Option<f64>,
        #[serde(default)]
        y2: Option<f64>,
        #[serde(default)]
        width: Option<f64>,
        #[serde(default)]
        height: Option<f64>,
    },
    Array(Vec<f64>),
}

impl WireBox {
    fn into_bbox(self) -> Option<BoundingBox> {
        match self {
            WireBox::Corners {
                x1,
                y1,
                x2,
                y2,
                width,
                height,
            } => {
                let width = width.or_else(|| x2.map(|x2| x2 - x1))?;
                let height = height.or_else(|| y2.map(|y2| y2 - y1))?;
                Some(BoundingBox {
                    x1,
                    y1,
                    x2: x2.unwrap_or(x1 + width),
                    y2: y2.unwrap_or(y1 + height),
                    width,
                    height,
                })
            }
            WireBox::Array(values) => match values.as_slice() {
                [x, y, w, h] => Some(BoundingBox::from_origin_size(*x, *y, *w, *h)),
                _ => None,
            },
        }
    }
}

impl From<WireDetection> for Detection {
    fn from(wire: WireDetection) -> Self {
        Detection {
            class_name: wire.class_name.filter(|c| !c.is_empty()),
            confidence: wire
                .confidence
                .and_then(|v| v.as_f64())
                .map(|c| c as f32),
            bbox: wire.bbox.and_then(WireBox::into_bbox),
        }
    }
}

fn timestamp_or_now(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(parse_timestamp).unwrap_or_else(Utc::now)
}

/// Parse one inbound text message
///
/// Returns `Ok(None)` for well-formed messages of a type this client does
/// not handle.
pub fn parse_inbound(text: &str) -> Result<Option<InboundEvent>, serde_json::Error> {
    let wire: WireInbound = serde_json::from_str(text)?;

    let event = match wire {
        WireInbound::Frame {
            camera_id,
            frame,
            timestamp,
        } => InboundEvent::Frame(Frame::new(
            camera_id,
            EncodedImage::from_text(frame),
            timestamp_or_now(timestamp.as_deref()),
        )),
        WireInbound::Detection {
            camera_id,
            detections,
            object_counts,
            timestamp,
        } => InboundEvent::Detection(DetectionEvent {
            camera_id,
            detections: DetectionSet::new(detections.into_iter().map(Detection::from).collect()),
            object_counts: object_counts.map(ObjectCounts::new),
            timestamp: timestamp_or_now(timestamp.as_deref()),
        }),
        WireInbound::DetectionStatus { camera_id, enabled } => {
            InboundEvent::DetectionStatus { camera_id, enabled }
        }
        WireInbound::Pong => InboundEvent::KeepaliveAck,
        WireInbound::Connected { client_id } => InboundEvent::Connected { client_id },
        WireInbound::CameraStatus { camera_id, status } => InboundEvent::CameraStatus {
            camera_id,
            streaming: matches!(status.as_str(), "started" | "streaming" | "active"),
        },
        WireInbound::Error { camera_id, message } => match camera_id {
            Some(camera_id) => InboundEvent::CameraError { camera_id, message },
            None => InboundEvent::ServerError { message },
        },
        WireInbound::Subscribed { camera_id } => InboundEvent::Subscribed { camera_id },
        WireInbound::Unsubscribed { camera_id } => InboundEvent::Unsubscribed { camera_id },
        WireInbound::Unknown => return Ok(None),
    };

    Ok(Some(event))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame() {
        let event = parse_inbound(
            r#"{"type":"frame","camera_id":"cam-1","frame":"AAEC","timestamp":"2024-05-01T10:00:00Z"}"#,
        )
        .unwrap()
        .unwrap();

        match event {
            InboundEvent::Frame(frame) => {
                assert_eq!(frame.camera_id, CameraId::new("cam-1"));
                assert_eq!(frame.image.to_image_bytes().unwrap(), vec![0, 1, 2]);
                assert_eq!(frame.timestamp.to_rfc3339(), "2024-05-01T10:00:00+00:00");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_parse_detection_object_bbox() {
        let text = r#"{
            "type": "detection",
            "cameraId": "cam-1",
            "detections": [{
                "class_name": "person",
                "confidence": 0.92,
                "bbox": {"x1": 100, "y1": 50, "x2": 200, "y2": 300, "width": 100, "height": 250}
            }],
            "object_counts": {"person": 1},
            "timestamp": "2024-05-01T10:00:00"
        }"#;

        let Some(InboundEvent::Detection(event)) = parse_inbound(text).unwrap() else {
            panic!("expected detection");
        };

        assert_eq!(event.camera_id, CameraId::new("cam-1"));
        let detection = event.detections.get(0).unwrap();
        assert_eq!(detection.class_name.as_deref(), Some("person"));
        assert!((detection.confidence.unwrap() - 0.92).abs() < 1e-6);
        assert_eq!(
            detection.bbox,
            Some(BoundingBox::from_corners(100.0, 50.0, 200.0, 300.0))
        );
        assert_eq!(event.object_counts.unwrap().get("person"), 1);
    }

    #[test]
    fn test_parse_detection_legacy_array_bbox() {
        let text = r#"{"type":"detection","camera_id":7,"detections":[
            {"camera_id":7,"class":"car","confidence":0.8,"bbox":[10,20,30,40]},
            {"class":"dog","confidence":"high","bbox":[1,2,3]}
        ],"object_counts":{"car":1,"dog":1}}"#;

        let Some(InboundEvent::Detection(event)) = parse_inbound(text).unwrap() else {
            panic!("expected detection");
        };

        assert_eq!(event.camera_id, CameraId::new("7"));
        let car = event.detections.get(0).unwrap();
        assert_eq!(car.class_name.as_deref(), Some("car"));
        assert_eq!(car.bbox, Some(BoundingBox::from_origin_size(10.0, 20.0, 30.0, 40.0)));

        let dog = event.detections.get(1).unwrap();
        assert_eq!(dog.confidence, None);
        assert_eq!(dog.bbox, None);
    }

    #[test]
    fn test_parse_bbox_missing_size_is_derived() {
        let text = r#"{"type":"detection","camera_id":"c","detections":[
            {"class_name":"cat","bbox":{"x1":5,"y1":5,"x2":15,"y2":25}}
        ]}"#;

        let Some(InboundEvent::Detection(event)) = parse_inbound(text).unwrap() else {
            panic!("expected detection");
        };
        let bbox = event.detections.get(0).unwrap().bbox.unwrap();
        assert_eq!(bbox.width, 10.0);
        assert_eq!(bbox.height, 20.0);
        assert!(event.object_counts.is_none());
    }

    #[test]
    fn test_parse_status_messages() {
        let status = parse_inbound(r#"{"type":"detection_status","camera_id":"c","enabled":false}"#)
            .unwrap()
            .unwrap();
        assert!(matches!(
            status,
            InboundEvent::DetectionStatus { enabled: false, .. }
        ));

        let pong = parse_inbound(r#"{"type":"pong","timestamp":"2024-05-01T10:00:00"}"#)
            .unwrap()
            .unwrap();
        assert!(matches!(pong, InboundEvent::KeepaliveAck));

        let ack = parse_inbound(r#"{"type":"keepalive_ack"}"#).unwrap().unwrap();
        assert!(matches!(ack, InboundEvent::KeepaliveAck));

        let started = parse_inbound(r#"{"type":"camera_status","camera_id":3,"status":"started"}"#)
            .unwrap()
            .unwrap();
        assert!(matches!(
            started,
            InboundEvent::CameraStatus { streaming: true, .. }
        ));
    }

    #[test]
    fn test_parse_error_with_and_without_camera() {
        let camera = parse_inbound(r#"{"type":"error","camera_id":"c","message":"Camera error: timeout"}"#)
            .unwrap()
            .unwrap();
        assert!(matches!(camera, InboundEvent::CameraError { .. }));

        let server = parse_inbound(r#"{"type":"error","message":"overloaded"}"#)
            .unwrap()
            .unwrap();
        assert!(matches!(server, InboundEvent::ServerError { .. }));
    }

    #[test]
    fn test_unknown_type_is_ignored() {
        assert!(parse_inbound(r#"{"type":"chat_reply","text":"hi"}"#)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_malformed_is_error() {
        assert!(parse_inbound("not json").is_err());
        assert!(parse_inbound(r#"{"type":"frame"}"#).is_err());
    }

    #[test]
    fn test_outbound_encoding() {
        assert_eq!(OutboundMessage::Ping.to_json().unwrap(), r#"{"type":"ping"}"#);
        assert_eq!(
            OutboundMessage::SubscribeCamera {
                camera_id: CameraId::new("cam-1")
            }
            .to_json()
            .unwrap(),
            r#"{"type":"subscribe_camera","camera_id":"cam-1"}"#
        );
    }
}
