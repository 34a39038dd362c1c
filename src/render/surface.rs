//! Render surface

use image::{imageops, RgbaImage};

/// Pixel surface a camera's frames are drawn onto
///
/// Always sized to the native resolution of the last image blitted; starts
/// out empty (0×0).
#[derive(Debug, Clone, Default)]
pub struct RenderSurface {
    pixels: RgbaImage,
}

impl RenderSurface {
    /// Create an empty surface
    pub fn new() -> Self {
        Self::default()
    }

    /// Resize to the image's dimensions and copy it in at the origin
    ///
    /// Prior contents are fully replaced.
    pub fn blit(&mut self, image: &RgbaImage) {
        if self.pixels.dimensions() != image.dimensions() {
            let (width, height) = image.dimensions();
            tracing::trace!(width, height, "Resizing render surface");
            self.pixels = RgbaImage::new(width, height);
        }
        imageops::replace(&mut self.pixels, image, 0, 0);
    }

    /// Drop the picture
    pub fn clear(&mut self) {
        self.pixels = RgbaImage::default();
    }

    /// Whether nothing has been drawn
    pub fn is_empty(&self) -> bool {
        self.pixels.width() == 0 || self.pixels.height() == 0
    }

    /// Native `(width, height)`
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    #[test]
    fn test_blit_resizes_and_replaces() {
        let mut surface = RenderSurface::new();
        assert!(surface.is_empty());

        surface.blit(&RgbaImage::from_pixel(4, 3, Rgba([255, 0, 0, 255])));
        assert_eq!(surface.dimensions(), (4, 3));

        surface.blit(&RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 255])));
        assert_eq!(surface.dimensions(), (2, 2));
        assert!(surface.pixels().pixels().all(|p| *p == Rgba([0, 255, 0, 255])));

        surface.clear();
        assert!(surface.is_empty());
    }
}
