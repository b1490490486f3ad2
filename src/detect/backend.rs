use anyhow::Result;

use crate::detect::result::Detection;
use crate::frame::Frame;

/// Object detector capability.
///
/// Called once per tick with the current frame. Implementations return every
/// object they see; filtering by class and score happens in the detection loop.
/// An `Err` is a detection fault for that tick only.
pub trait ObjectDetector {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
