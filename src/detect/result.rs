use serde::{Deserialize, Serialize};

/// Axis-aligned box in frame pixel coordinates: top-left corner plus size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Integer pixel rectangle `(x, y, w, h)` of the part of this box that lies
    /// inside a `frame_width` x `frame_height` frame. `None` when nothing overlaps.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<(u32, u32, u32, u32)> {
        if !(self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite())
        {
            return None;
        }
        let x0 = self.x.max(0.0).floor();
        let y0 = self.y.max(0.0).floor();
        let x1 = (self.x + self.width).min(frame_width as f32).ceil();
        let y1 = (self.y + self.height).min(frame_height as f32).ceil();
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

/// One object found in a frame. Produced per tick and never retained.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detector class name, e.g. `cow`.
    pub class: String,
    /// Detector confidence in `[0, 1]`.
    pub score: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(class: impl Into<String>, score: f32, bbox: BoundingBox) -> Self {
        Self {
            class: class.into(),
            score,
            bbox,
        }
    }
}
