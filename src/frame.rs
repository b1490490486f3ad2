//! Frames and still images.
//!
//! - `Frame`: one decoded RGB frame from the frame source. Owned by the loop for one tick.
//! - `StillImage`: fixed-size square crop handed to classifiers and kept in capture history.
//! - `Rasterizer`: turns a bounding box of a frame into a `StillImage`.

use anyhow::{anyhow, Result};
use image::imageops::{self, FilterType};
use image::{codecs::jpeg::JpegEncoder, RgbImage};
use std::sync::Arc;

use crate::detect::BoundingBox;

/// Canvas size assumed when a frame does not report its dimensions.
pub const DEFAULT_FRAME_WIDTH: u32 = 640;
pub const DEFAULT_FRAME_HEIGHT: u32 = 480;

/// Side length of the square stills fed to classifiers.
pub const DEFAULT_STILL_SIZE: u32 = 224;

// ----------------------------------------------------------------------------
// Frame
// ----------------------------------------------------------------------------

/// Packed RGB8 frame.
///
/// A frame with zero width or height carries no pixels; consumers treat it
/// as a `DEFAULT_FRAME_WIDTH` x `DEFAULT_FRAME_HEIGHT` canvas.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
    /// Monotonic frame number assigned by the source.
    pub index: u64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: u64) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if data.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{} frame, received {}",
                expected,
                width,
                height,
                data.len()
            ));
        }
        Ok(Self {
            data: data.into(),
            width,
            height,
            index,
        })
    }

    /// Frame with no pixel payload and unknown dimensions.
    pub fn empty(index: u64) -> Self {
        Self {
            data: Arc::from(Vec::<u8>::new()),
            width: 0,
            height: 0,
            index,
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn has_pixels(&self) -> bool {
        !self.data.is_empty()
    }

    /// Effective canvas size, falling back to 640x480.
    pub fn canvas_size(&self) -> (u32, u32) {
        if self.width == 0 || self.height == 0 {
            (DEFAULT_FRAME_WIDTH, DEFAULT_FRAME_HEIGHT)
        } else {
            (self.width, self.height)
        }
    }

    fn to_rgb_image(&self) -> Option<RgbImage> {
        if !self.has_pixels() {
            return None;
        }
        RgbImage::from_raw(self.width, self.height, self.data.to_vec())
    }
}

// ----------------------------------------------------------------------------
// StillImage
// ----------------------------------------------------------------------------

/// Opaque handle to an extracted still. Clones share the pixel buffer.
#[derive(Clone, Debug)]
pub struct StillImage {
    image: Arc<RgbImage>,
}

impl StillImage {
    pub fn new(image: RgbImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    /// Black square still, used for model warm-up and unusable regions.
    pub fn blank(size: u32) -> Self {
        Self::new(RgbImage::new(size, size))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }

    /// Encode as JPEG for display in a capture history.
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
        encoder
            .encode_image(self.image.as_ref())
            .map_err(|e| anyhow!("jpeg encode failed: {}", e))?;
        Ok(out)
    }
}

// ----------------------------------------------------------------------------
// Rasterizer
// ----------------------------------------------------------------------------

/// Extracts the region under a bounding box as a `target_size` square still.
///
/// Extraction is infallible: regions that do not overlap the frame yield a blank still.
pub trait Rasterizer {
    fn extract(&self, frame: &Frame, bbox: &BoundingBox, target_size: u32) -> StillImage;
}

/// Crop-and-scale rasterizer backed by the `image` crate.
#[derive(Clone, Copy, Debug)]
pub struct CropResizeRasterizer {
    filter: FilterType,
}

impl CropResizeRasterizer {
    pub fn new() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }
}

impl Default for CropResizeRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for CropResizeRasterizer {
    fn extract(&self, frame: &Frame, bbox: &BoundingBox, target_size: u32) -> StillImage {
        let Some(source) = frame.to_rgb_image() else {
            return StillImage::blank(target_size);
        };
        let Some((x, y, w, h)) = bbox.clamp_to(source.width(), source.height()) else {
            log::debug!("bbox {:?} outside frame {}; blank still", bbox, frame.index);
            return StillImage::blank(target_size);
        };
        let region = imageops::crop_imm(&source, x, y, w, h).to_image();
        let scaled = imageops::resize(&region, target_size, target_size, self.filter);
        StillImage::new(scaled)
    }
}
