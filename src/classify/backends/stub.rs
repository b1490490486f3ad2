use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::classify::classifier::{Classifier, LabelCandidate};
use crate::frame::StillImage;

const STUB_LABELS: [&str; 8] = [
    "ox",
    "water buffalo, water ox, Asiatic buffalo, Bubalus bubalis",
    "bison",
    "ram, tup",
    "oxcart",
    "hog, pig, grunter, squealer, Sus scrofa",
    "sorrel",
    "hay",
];

/// Stub classifier for demos. Derives its guesses from a pixel hash, so the
/// same still always yields the same candidates.
pub struct StubClassifier {
    name: &'static str,
    ready: bool,
    top_k: usize,
}

impl StubClassifier {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ready: true,
            top_k: 3,
        }
    }

    pub fn with_ready(mut self, ready: bool) -> Self {
        self.ready = ready;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.clamp(1, STUB_LABELS.len());
        self
    }
}

impl Default for StubClassifier {
    fn default() -> Self {
        Self::new("stub")
    }
}

impl Classifier for StubClassifier {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn classify(&mut self, image: &StillImage) -> Result<Vec<LabelCandidate>> {
        let digest: [u8; 32] = Sha256::digest(image.as_rgb().as_raw()).into();
        let first = digest[0] as usize % STUB_LABELS.len();
        // Top probability in [0.5, 1.0), remaining mass halved per rank.
        let mut probability = 0.5 + f32::from(digest[1]) / 512.0;
        let mut remaining = 1.0 - probability;
        let mut candidates = Vec::with_capacity(self.top_k);
        for rank in 0..self.top_k {
            let label = STUB_LABELS[(first + rank) % STUB_LABELS.len()];
            candidates.push(LabelCandidate::new(label, probability));
            probability = remaining / 2.0;
            remaining -= probability;
        }
        Ok(candidates)
    }
}
