use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::detect::backend::ObjectDetector;
use crate::detect::result::{BoundingBox, Detection};
use crate::frame::Frame;

const STUB_CLASSES: [&str; 3] = ["cow", "cow", "person"];

/// Stub detector for demos. Emits a seeded, random scatter of objects.
pub struct StubDetector {
    rng: StdRng,
    presence: f64,
}

impl StubDetector {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            presence: 0.4,
        }
    }

    /// Probability that a frame contains any objects at all.
    pub fn with_presence(mut self, presence: f64) -> Self {
        self.presence = presence.clamp(0.0, 1.0);
        self
    }

    fn random_box(&mut self, canvas_w: f32, canvas_h: f32) -> BoundingBox {
        let width = self.rng.gen_range(canvas_w * 0.1..canvas_w * 0.4);
        let height = self.rng.gen_range(canvas_h * 0.1..canvas_h * 0.4);
        let x = self.rng.gen_range(0.0..canvas_w - width);
        let y = self.rng.gen_range(0.0..canvas_h - height);
        BoundingBox::new(x, y, width, height)
    }
}

impl Default for StubDetector {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ObjectDetector for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        if !self.rng.gen_bool(self.presence) {
            return Ok(Vec::new());
        }
        let (w, h) = frame.canvas_size();
        let count = self.rng.gen_range(1..=3);
        let mut detections = Vec::with_capacity(count);
        for _ in 0..count {
            let class = STUB_CLASSES[self.rng.gen_range(0..STUB_CLASSES.len())];
            let score = self.rng.gen_range(0.3f32..0.99);
            let bbox = self.random_box(w as f32, h as f32);
            detections.push(Detection::new(class, score, bbox));
        }
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_detector_is_reproducible_per_seed() {
        let frame = Frame::empty(0);
        let mut a = StubDetector::new(7).with_presence(1.0);
        let mut b = StubDetector::new(7).with_presence(1.0);
        for _ in 0..5 {
            assert_eq!(a.detect(&frame).unwrap(), b.detect(&frame).unwrap());
        }
    }

    #[test]
    fn stub_detector_boxes_stay_on_canvas() {
        let frame = Frame::empty(0);
        let mut detector = StubDetector::new(1).with_presence(1.0);
        for _ in 0..20 {
            for det in detector.detect(&frame).unwrap() {
                assert!(det.bbox.x >= 0.0 && det.bbox.x + det.bbox.width <= 640.0);
                assert!(det.bbox.y >= 0.0 && det.bbox.y + det.bbox.height <= 480.0);
                assert!((0.0..=1.0).contains(&det.score));
            }
        }
    }

    #[test]
    fn zero_presence_never_detects() {
        let mut detector = StubDetector::new(3).with_presence(0.0);
        assert!(detector.detect(&Frame::empty(0)).unwrap().is_empty());
    }
}
