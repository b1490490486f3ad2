//! Local still-image directory source.
//!
//! Plays back every supported image in a directory, in file-name order,
//! resized to the configured frame size. No network access, no writes.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;

use super::{FrameSource, SourceStats};
use crate::frame::Frame;

/// File extensions played back by `DirectorySource`.
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["jpg", "jpeg"];

pub struct DirectorySource {
    root: PathBuf,
    files: Vec<PathBuf>,
    next: usize,
    width: u32,
    height: u32,
    frame_count: u64,
    last_error: Option<String>,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(root: P, width: u32, height: u32) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(anyhow!("{} is not a directory", root.display()));
        }
        Ok(Self {
            root,
            files: Vec::new(),
            next: 0,
            width,
            height,
            frame_count: 0,
            last_error: None,
        })
    }

    fn scan(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("failed to list {}", self.root.display()))?;
        for entry in entries {
            let path = entry?.path();
            let supported = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    SUPPORTED_EXTENSIONS
                        .iter()
                        .any(|s| ext.eq_ignore_ascii_case(s))
                });
            if supported && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn load(&self, path: &Path) -> Result<Vec<u8>> {
        let decoded = image::open(path)
            .with_context(|| format!("failed to decode {}", path.display()))?
            .resize_exact(self.width, self.height, FilterType::Triangle)
            .to_rgb8();
        Ok(decoded.into_raw())
    }
}

impl FrameSource for DirectorySource {
    fn connect(&mut self) -> Result<()> {
        self.files = self.scan()?;
        self.next = 0;
        log::info!(
            "frame source: {} images in {}",
            self.files.len(),
            self.root.display()
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.files.get(self.next).cloned() else {
            return Ok(None);
        };
        self.next += 1;
        let pixels = match self.load(&path) {
            Ok(pixels) => {
                self.last_error = None;
                pixels
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                return Err(e);
            }
        };
        self.frame_count += 1;
        Frame::new(pixels, self.width, self.height, self.frame_count).map(Some)
    }

    fn is_healthy(&self) -> bool {
        self.last_error.is_none()
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: self.root.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn plays_back_jpegs_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(20, 10, image::Rgb([200, 10, 10]))
            .save(dir.path().join("b.jpg"))
            .unwrap();
        RgbImage::from_pixel(20, 10, image::Rgb([10, 10, 200]))
            .save(dir.path().join("a.jpg"))
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let mut source = DirectorySource::new(dir.path(), 8, 4).unwrap();
        source.connect().unwrap();
        let first = source.next_frame().unwrap().unwrap();
        assert_eq!((first.width, first.height), (8, 4));
        // a.jpg is blue
        assert!(first.pixels()[2] > first.pixels()[0]);
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
        assert_eq!(source.stats().frames_captured, 2);
    }

    #[test]
    fn undecodable_file_marks_source_unhealthy() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.jpg"), b"not a jpeg").unwrap();
        let mut source = DirectorySource::new(dir.path(), 8, 4).unwrap();
        source.connect().unwrap();
        assert!(source.next_frame().is_err());
        assert!(!source.is_healthy());
    }

    #[test]
    fn rejects_missing_directory() {
        assert!(DirectorySource::new("/definitely/not/here", 8, 4).is_err());
    }
}
