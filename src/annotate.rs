//! Frame overlay annotations.

use crate::detect::{BoundingBox, Detection};

/// Overlay text for a detection, e.g. `cow (75%)`.
pub fn annotation_label(detection: &Detection) -> String {
    format!(
        "{} ({}%)",
        detection.class,
        (detection.score * 100.0).round() as i64
    )
}

/// Fire-and-forget drawing surface for detection overlays.
pub trait AnnotationSink {
    /// A new frame is about to be annotated; previous overlays are stale.
    fn begin_frame(&mut self, _frame_index: u64) {}

    fn draw(&mut self, bbox: &BoundingBox, label: &str);
}

/// Sink that discards annotations.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl AnnotationSink for NullSink {
    fn draw(&mut self, _bbox: &BoundingBox, _label: &str) {}
}

/// Sink that logs annotations at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl AnnotationSink for LogSink {
    fn draw(&mut self, bbox: &BoundingBox, label: &str) {
        log::debug!(
            "annotate {} at ({:.0},{:.0}) {:.0}x{:.0}",
            label,
            bbox.x,
            bbox.y,
            bbox.width,
            bbox.height
        );
    }
}

/// Sink that remembers what was drawn on the current frame.
#[derive(Clone, Debug, Default)]
pub struct OverlaySink {
    pub frame_index: Option<u64>,
    pub drawn: Vec<(BoundingBox, String)>,
}

impl AnnotationSink for OverlaySink {
    fn begin_frame(&mut self, frame_index: u64) {
        self.frame_index = Some(frame_index);
        self.drawn.clear();
    }

    fn draw(&mut self, bbox: &BoundingBox, label: &str) {
        self.drawn.push((*bbox, label.to_string()));
    }
}
