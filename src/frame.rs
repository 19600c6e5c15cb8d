//! Decoded frame type.

use image::RgbImage;

/// A single frame handed from a [`FrameSource`](crate::FrameSource) to the
/// extraction loop.
///
/// The frame is transient: the controller either persists it or drops it
/// before asking for the next one.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// 1-based position of the frame in decode order.
    pub index: u64,
    /// Pixel data at the stream's native resolution.
    pub image: RgbImage,
}

impl DecodedFrame {
    /// Wrap a decoded raster.
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
