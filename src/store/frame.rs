//! Camera identity and frame types
//!
//! Frames arrive as text-encoded stills. Only the newest frame per camera is
//! kept; the payload stays encoded until the render pipeline asks for pixels.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DecodeError;

/// Opaque, stable camera identifier assigned by the camera registry
///
/// Some backends number their cameras, so numeric ids on the wire are
/// accepted and kept in their decimal form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CameraId(String);

impl CameraId {
    /// Create a camera id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CameraId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CameraId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CameraId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'de> Deserialize<'de> for CameraId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => CameraId(s),
            RawId::Number(n) => CameraId(n.to_string()),
        })
    }
}

/// Text-encoded still image (base64, optionally wrapped in a data URL)
///
/// Cloning is cheap: the payload is reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage(Bytes);

impl EncodedImage {
    /// Wrap a base64 payload exactly as it arrived on the wire
    pub fn from_text(text: impl Into<String>) -> Self {
        Self(Bytes::from(text.into()))
    }

    /// Encode raw image bytes (JPEG, PNG, ...) into the wire form
    pub fn from_image_bytes(raw: &[u8]) -> Self {
        Self::from_text(BASE64.encode(raw))
    }

    /// Size of the encoded payload in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recover the raw image bytes
    ///
    /// A leading `data:<mime>;base64,` prefix is stripped first.
    pub fn to_image_bytes(&self) -> Result<Vec<u8>, DecodeError> {
        let text = std::str::from_utf8(&self.0).map_err(|e| DecodeError::Base64(e.to_string()))?;
        let payload = match text.strip_prefix("data:") {
            Some(rest) => rest
                .split_once(',')
                .map(|(_, data)| data)
                .ok_or_else(|| DecodeError::Base64("data URL without payload".into()))?,
            None => text,
        };

        BASE64
            .decode(payload.trim())
            .map_err(|e| DecodeError::Base64(e.to_string()))
    }
}

/// Most recent still for one camera
#[derive(Debug, Clone)]
pub struct Frame {
    /// Camera the frame belongs to
    pub camera_id: CameraId,
    /// Encoded still
    pub image: EncodedImage,
    /// Capture time reported by the sender (receipt time if absent or unparsable)
    pub timestamp: DateTime<Utc>,
}

impl Frame {
    /// Create a frame
    pub fn new(camera_id: CameraId, image: EncodedImage, timestamp: DateTime<Utc>) -> Self {
        Self {
            camera_id,
            image,
            timestamp,
        }
    }
}

/// Parse a wire timestamp
///
/// Accepts RFC 3339 and the offset-less ISO form some senders emit, which is
/// read as local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_id_from_number() {
        let id: CameraId = serde_json::from_str("42").unwrap();
        assert_eq!(id.as_str(), "42");

        let id: CameraId = serde_json::from_str("\"cam-1\"").unwrap();
        assert_eq!(id, CameraId::new("cam-1"));
    }

    #[test]
    fn test_encoded_image_strips_data_url() {
        let raw = [0xFFu8, 0xD8, 0xFF, 0xE0];
        let plain = EncodedImage::from_image_bytes(&raw);
        assert_eq!(plain.to_image_bytes().unwrap(), raw);

        let wrapped = EncodedImage::from_text(format!("data:image/jpeg;base64,{}", BASE64.encode(raw)));
        assert_eq!(wrapped.to_image_bytes().unwrap(), raw);
    }

    #[test]
    fn test_encoded_image_rejects_garbage() {
        let bad = EncodedImage::from_text("not base64 at all!");
        assert!(matches!(bad.to_image_bytes(), Err(DecodeError::Base64(_))));

        let empty_url = EncodedImage::from_text("data:image/png;base64");
        assert!(empty_url.to_image_bytes().is_err());
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let ts = parse_timestamp("2024-05-01T10:00:00Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-01T10:00:00+00:00");

        assert!(parse_timestamp("2024-05-01T10:00:00.123456").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
