//! Synthetic frame source (`stub://`).

use anyhow::Result;

use super::{FrameSource, SourceStats};
use crate::frame::Frame;

/// Generates a drifting gradient "pasture" that changes scene every 50 frames.
pub struct SyntheticSource {
    url: String,
    width: u32,
    height: u32,
    frame_count: u64,
    scene_state: u8,
    limit: Option<u64>,
}

impl SyntheticSource {
    pub fn new(url: &str, width: u32, height: u32) -> Self {
        Self {
            url: url.to_string(),
            width,
            height,
            frame_count: 0,
            scene_state: 0,
            limit: None,
        }
    }

    /// Stop after `frames` frames.
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    fn generate_pixels(&mut self) -> Vec<u8> {
        let pixel_count = (self.width as usize) * (self.height as usize) * 3;
        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            let channel = i % 3;
            let base = match channel {
                0 => 60,
                1 => 140,
                _ => 50,
            };
            *pixel = ((base + i / 3 % 64 + self.frame_count as usize + self.scene_state as usize)
                % 256) as u8;
        }
        pixels
    }
}

impl FrameSource for SyntheticSource {
    fn connect(&mut self) -> Result<()> {
        log::info!("frame source: connected to {} (synthetic)", self.url);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.limit.is_some_and(|limit| self.frame_count >= limit) {
            return Ok(None);
        }
        self.frame_count += 1;
        let pixels = self.generate_pixels();
        Frame::new(pixels, self.width, self.height, self.frame_count).map(Some)
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: self.url.clone(),
        }
    }
}
