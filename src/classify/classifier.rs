use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::frame::StillImage;

/// One classifier guess. Classifiers return these best-first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelCandidate {
    pub label: Option<String>,
    pub probability: Option<f32>,
}

impl LabelCandidate {
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        Self {
            label: Some(label.into()),
            probability: Some(probability),
        }
    }
}

/// Image classifier capability.
///
/// A classifier that is not ready is skipped by the pipeline. An `Err` from
/// `classify` is a classification fault for that capture only.
pub trait Classifier {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Whether the model is loaded and usable.
    fn is_ready(&self) -> bool {
        true
    }

    /// Classify a still. Candidates are ordered best-first.
    fn classify(&mut self, image: &StillImage) -> Result<Vec<LabelCandidate>>;

    /// Optional warm-up hook, run once on a blank still after loading.
    fn warm_up(&mut self, size: u32) -> Result<()> {
        self.classify(&StillImage::blank(size)).map(|_| ())
    }
}
