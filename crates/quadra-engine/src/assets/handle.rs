use std::sync::Arc;

use image::RgbaImage;

/// Decoded RGBA8 image shared between nodes and the renderer.
///
/// Cloning is cheap (reference counted). Two handles compare equal when they
/// point at the same decoded image.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    name: Arc<str>,
    pixels: Arc<RgbaImage>,
}

impl ImageHandle {
    pub fn new(name: impl Into<Arc<str>>, pixels: RgbaImage) -> Self {
        Self {
            name: name.into(),
            pixels: Arc::new(pixels),
        }
    }

    /// Builds a `width × height` image filled with one RGBA8 color.
    pub fn solid(name: impl Into<Arc<str>>, width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self::new(name, RgbaImage::from_pixel(width, height, image::Rgba(rgba)))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    #[inline]
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Tightly packed RGBA8 rows, top row first.
    #[inline]
    pub fn rgba(&self) -> &[u8] {
        self.pixels.as_raw()
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}
