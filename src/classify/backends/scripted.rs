use std::collections::VecDeque;

use anyhow::{anyhow, Result};

use crate::classify::classifier::{Classifier, LabelCandidate};
use crate::frame::StillImage;

#[derive(Clone, Debug)]
enum ScriptedResult {
    Candidates(Vec<LabelCandidate>),
    Fault(String),
}

/// Classifier that replays a fixed script, one entry per call.
///
/// Once the script is exhausted every call returns no candidates.
#[derive(Clone, Debug)]
pub struct ScriptedClassifier {
    name: &'static str,
    ready: bool,
    script: VecDeque<ScriptedResult>,
    calls: u64,
}

impl ScriptedClassifier {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ready: true,
            script: VecDeque::new(),
            calls: 0,
        }
    }

    pub fn with_ready(mut self, ready: bool) -> Self {
        self.ready = ready;
        self
    }

    pub fn then_return(mut self, candidates: Vec<LabelCandidate>) -> Self {
        self.script.push_back(ScriptedResult::Candidates(candidates));
        self
    }

    pub fn then_fail(mut self, reason: impl Into<String>) -> Self {
        self.script.push_back(ScriptedResult::Fault(reason.into()));
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl Classifier for ScriptedClassifier {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn classify(&mut self, _image: &StillImage) -> Result<Vec<LabelCandidate>> {
        self.calls += 1;
        match self.script.pop_front() {
            Some(ScriptedResult::Candidates(candidates)) => Ok(candidates),
            Some(ScriptedResult::Fault(reason)) => Err(anyhow!(reason)),
            None => Ok(Vec::new()),
        }
    }
}
