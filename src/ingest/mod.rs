//! Frame sources.
//!
//! The detection loop pulls one frame per tick from a `FrameSource`:
//! - `stub://<name>`: synthetic pasture frames (tests, demos)
//! - a local directory path: still images played back in file-name order
//!
//! Real camera drivers are not part of this crate; they plug in by
//! implementing `FrameSource`.

pub mod file;
pub mod synthetic;

use anyhow::{anyhow, Result};

use crate::frame::Frame;

pub use file::{DirectorySource, SUPPORTED_EXTENSIONS};
pub use synthetic::SyntheticSource;

/// Source of frames for the detection loop.
pub trait FrameSource {
    /// Prepare the source. Called once before the first frame.
    fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    /// Next frame, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> SourceStats;
}

/// Statistics for a frame source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub url: String,
}

/// Open a source from a URL: `stub://...` or a local directory path.
pub fn open_source(url: &str, width: u32, height: u32) -> Result<Box<dyn FrameSource>> {
    if url.trim().is_empty() {
        return Err(anyhow!("frame source url must not be empty"));
    }
    if url.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::new(url, width, height)));
    }
    if url.contains("://") {
        return Err(anyhow!(
            "unsupported frame source '{}' (expected stub:// or a local directory)",
            url
        ));
    }
    Ok(Box::new(DirectorySource::new(url, width, height)?))
}
