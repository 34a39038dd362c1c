//! Frame decoding
//!
//! Turns the text-encoded payload of a frame event into RGBA pixels.
//! Decoding runs on the blocking pool so a large JPEG never stalls the
//! engine loop.

use image::RgbaImage;

use crate::error::DecodeError;
use crate::store::{CameraId, EncodedImage};

/// Decode an encoded frame into pixels on the current thread
pub fn decode_image(image: &EncodedImage) -> Result<RgbaImage, DecodeError> {
    let bytes = image.to_image_bytes()?;

    let decoded =
        image::load_from_memory(&bytes).map_err(|e| DecodeError::Image(e.to_string()))?;

    Ok(decoded.to_rgba8())
}

/// Decode an encoded frame on the blocking pool
pub async fn decode_frame(image: EncodedImage) -> Result<RgbaImage, DecodeError> {
    tokio::task::spawn_blocking(move || decode_image(&image))
        .await
        .map_err(|_| DecodeError::Aborted)?
}

/// A decode the pipeline asked for
#[derive(Debug, Clone)]
pub struct DecodeJob {
    pub camera_id: CameraId,
    /// Store frame sequence the payload belongs to
    pub seq: u64,
    pub image: EncodedImage,
}

/// Result of a [`DecodeJob`]
#[derive(Debug)]
pub struct DecodedFrame {
    pub camera_id: CameraId,
    pub seq: u64,
    pub result: Result<RgbaImage, DecodeError>,
}

impl DecodeJob {
    /// Run the decode
    pub async fn run(self) -> DecodedFrame {
        let result = decode_frame(self.image).await;
        DecodedFrame {
            camera_id: self.camera_id,
            seq: self.seq,
            result,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba};

    use super::*;

    fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    /// Encode a solid image the way a server would put it on the wire
    pub(crate) fn encoded_png(width: u32, height: u32, color: [u8; 4]) -> EncodedImage {
        EncodedImage::from_image_bytes(&png_bytes(width, height, color))
    }

    /// Base64 text of a solid PNG, for building wire messages
    pub(crate) fn png_base64(width: u32, height: u32, color: [u8; 4]) -> String {
        use base64::Engine as _;
        base64::engine::general_purpose::STANDARD.encode(png_bytes(width, height, color))
    }

    #[test]
    fn test_decode_png() {
        let encoded = encoded_png(64, 48, [10, 20, 30, 255]);
        let image = decode_image(&encoded).unwrap();

        assert_eq!(image.dimensions(), (64, 48));
        assert_eq!(image.get_pixel(5, 5), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_decode_garbage() {
        let encoded = EncodedImage::from_image_bytes(b"definitely not an image");
        assert!(matches!(decode_image(&encoded), Err(DecodeError::Image(_))));

        let encoded = EncodedImage::from_text("@@@not base64@@@");
        assert!(matches!(decode_image(&encoded), Err(DecodeError::Base64(_))));
    }

    #[tokio::test]
    async fn test_decode_job_on_blocking_pool() {
        let job = DecodeJob {
            camera_id: CameraId::new("cam-1"),
            seq: 9,
            image: encoded_png(640, 480, [0, 0, 0, 255]),
        };

        let decoded = job.run().await;
        assert_eq!(decoded.seq, 9);
        assert_eq!(decoded.result.unwrap().dimensions(), (640, 480));
    }
}
