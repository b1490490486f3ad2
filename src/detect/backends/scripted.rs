use std::collections::VecDeque;

use anyhow::{anyhow, Result};

use crate::detect::backend::ObjectDetector;
use crate::detect::result::Detection;
use crate::frame::Frame;

/// One scripted tick outcome.
#[derive(Clone, Debug)]
pub enum ScriptedFrame {
    Detections(Vec<Detection>),
    Fault(String),
}

/// Detector that replays a fixed script, one entry per call.
///
/// Once the script is exhausted every call returns no detections.
#[derive(Clone, Debug, Default)]
pub struct ScriptedDetector {
    script: VecDeque<ScriptedFrame>,
    calls: u64,
}

impl ScriptedDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_detect(mut self, detections: Vec<Detection>) -> Self {
        self.script.push_back(ScriptedFrame::Detections(detections));
        self
    }

    pub fn then_fail(mut self, reason: impl Into<String>) -> Self {
        self.script.push_back(ScriptedFrame::Fault(reason.into()));
        self
    }

    /// Number of `detect` calls so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl ObjectDetector for ScriptedDetector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        self.calls += 1;
        match self.script.pop_front() {
            Some(ScriptedFrame::Detections(detections)) => Ok(detections),
            Some(ScriptedFrame::Fault(reason)) => Err(anyhow!(reason)),
            None => Ok(Vec::new()),
        }
    }
}
