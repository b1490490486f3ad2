//! Capture classification.
//!
//! A capture runs to completion in one call: count it, extract the still,
//! classify with the first ready classifier, map the top label onto the
//! catalog, tally it, and file the record in the capture history.
//! Classifier faults end here; they never reach the detection loop.

use crate::capture::{CaptureLabel, CaptureRecord};
use crate::catalog::{Category, LabelMapper};
use crate::classify::classifier::{Classifier, LabelCandidate};
use crate::detect::BoundingBox;
use crate::events::SessionObserver;
use crate::frame::{Frame, Rasterizer, DEFAULT_STILL_SIZE};
use crate::session::SessionState;

/// Label used when the top candidate carries none.
const MISSING_LABEL: &str = "unknown";

pub struct ClassificationPipeline {
    primary: Option<Box<dyn Classifier>>,
    fallback: Option<Box<dyn Classifier>>,
    rasterizer: Box<dyn Rasterizer>,
    mapper: LabelMapper,
    still_size: u32,
}

impl ClassificationPipeline {
    pub fn new(mapper: LabelMapper, rasterizer: Box<dyn Rasterizer>) -> Self {
        Self {
            primary: None,
            fallback: None,
            rasterizer,
            mapper,
            still_size: DEFAULT_STILL_SIZE,
        }
    }

    pub fn with_primary(mut self, classifier: Box<dyn Classifier>) -> Self {
        self.primary = Some(classifier);
        self
    }

    pub fn with_fallback(mut self, classifier: Box<dyn Classifier>) -> Self {
        self.fallback = Some(classifier);
        self
    }

    pub fn with_still_size(mut self, size: u32) -> Self {
        self.still_size = size.max(1);
        self
    }

    /// Install or replace the primary classifier, e.g. once a model finishes loading.
    pub fn set_primary(&mut self, classifier: Box<dyn Classifier>) {
        self.primary = Some(classifier);
    }

    pub fn set_fallback(&mut self, classifier: Box<dyn Classifier>) {
        self.fallback = Some(classifier);
    }

    pub fn mapper(&self) -> &LabelMapper {
        &self.mapper
    }

    /// Name of the classifier the next capture would use.
    pub fn active_classifier(&self) -> Option<&'static str> {
        [&self.primary, &self.fallback]
            .into_iter()
            .flatten()
            .find(|c| c.is_ready())
            .map(|c| c.name())
    }

    fn select(&mut self) -> Option<&mut Box<dyn Classifier>> {
        if self.primary.as_ref().is_some_and(|c| c.is_ready()) {
            return self.primary.as_mut();
        }
        if self.fallback.as_ref().is_some_and(|c| c.is_ready()) {
            return self.fallback.as_mut();
        }
        None
    }

    /// Classify the region under `bbox` and record the outcome.
    ///
    /// Always yields a record. Only a successful classification with at least
    /// one candidate touches the leaderboard.
    pub fn classify(
        &mut self,
        session: &mut SessionState,
        observer: &mut dyn SessionObserver,
        frame: &Frame,
        bbox: &BoundingBox,
        detection_score: f32,
        now_ms: u64,
    ) -> CaptureRecord {
        let sequence = session.next_capture();
        observer.on_global_count_changed(sequence);

        let image = self.rasterizer.extract(frame, bbox, self.still_size);
        let fallback_confidence = if detection_score.is_finite() {
            detection_score
        } else {
            0.0
        };

        let result = self
            .select()
            .map(|classifier| (classifier.name(), classifier.classify(&image)));

        let (label, confidence) = match result {
            None => {
                log::warn!("capture #{}: no classifier ready", sequence);
                (CaptureLabel::NoClassifier, fallback_confidence)
            }
            Some((name, Err(e))) => {
                log::error!("prediction failed ({}): {:#}", name, e);
                (CaptureLabel::PredictionError, fallback_confidence)
            }
            Some((name, Ok(candidates))) => match candidates.first() {
                None => {
                    log::info!("capture #{}: {} returned no candidates", sequence, name);
                    (CaptureLabel::Unknown, fallback_confidence)
                }
                Some(top) => {
                    let (label, confidence) = self.resolve_top(top, fallback_confidence);
                    if session.leaderboard.record(&label) {
                        observer.on_leaderboard_changed(&session.leaderboard.ranked_view());
                    }
                    (CaptureLabel::Category(label), confidence)
                }
            },
        };

        let record = CaptureRecord {
            image,
            label,
            confidence,
            timestamp_ms: now_ms,
            sequence,
        };
        let evicted = session.captures.append(record.clone());
        if evicted > 0 {
            log::debug!("capture history full; evicted {} oldest", evicted);
        }
        observer.on_capture_recorded(&record);
        record
    }

    fn resolve_top(
        &self,
        top: &LabelCandidate,
        fallback_confidence: f32,
    ) -> (Category, f32) {
        let raw_label = top
            .label
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(MISSING_LABEL);
        let category = self.mapper.map(Some(raw_label));
        // Absent, zero or NaN probabilities fall back to the detection score.
        let confidence = top
            .probability
            .filter(|p| p.is_finite() && *p != 0.0)
            .unwrap_or(fallback_confidence);
        log::debug!("label '{}' -> {}", raw_label, category);
        (category, confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::backends::ScriptedClassifier;
    use crate::events::RecordingObserver;
    use crate::frame::CropResizeRasterizer;

    fn pipeline() -> ClassificationPipeline {
        ClassificationPipeline::new(LabelMapper::default(), Box::new(CropResizeRasterizer::new()))
            .with_still_size(8)
    }

    fn run(p: &mut ClassificationPipeline, session: &mut SessionState) -> CaptureRecord {
        let mut observer = RecordingObserver::default();
        p.classify(
            session,
            &mut observer,
            &Frame::empty(0),
            &BoundingBox::new(10.0, 10.0, 50.0, 50.0),
            0.75,
            0,
        )
    }

    #[test]
    fn maps_top_label_and_tallies() {
        let mut p = pipeline().with_primary(Box::new(
            ScriptedClassifier::new("primary")
                .then_return(vec![LabelCandidate::new("Gir", 0.92), LabelCandidate::new("ox", 0.05)]),
        ));
        let mut session = SessionState::default();
        let record = run(&mut p, &mut session);
        assert_eq!(record.label.to_string(), "Jaffrabadi");
        assert_eq!(record.confidence, 0.92);
        assert_eq!(record.sequence, 1);
        assert_eq!(record.image.width(), 8);
        assert_eq!(session.leaderboard.ranked_view()[0].count, 1);
        assert_eq!(session.captures.len(), 1);
    }

    #[test]
    fn missing_label_maps_as_unknown_text() {
        let mut p = pipeline().with_primary(Box::new(
            ScriptedClassifier::new("primary").then_return(vec![LabelCandidate {
                label: None,
                probability: None,
            }]),
        ));
        let mut session = SessionState::default();
        let record = run(&mut p, &mut session);
        assert_eq!(record.label.to_string(), "Nili_Ravi");
        assert_eq!(record.confidence, 0.75);
    }

    #[test]
    fn zero_probability_falls_back_to_detection_score() {
        let mut p = pipeline().with_primary(Box::new(
            ScriptedClassifier::new("primary").then_return(vec![LabelCandidate::new("ox", 0.0)]),
        ));
        let mut session = SessionState::default();
        assert_eq!(run(&mut p, &mut session).confidence, 0.75);
    }

    #[test]
    fn falls_back_when_primary_not_ready() {
        let mut p = pipeline()
            .with_primary(Box::new(ScriptedClassifier::new("primary").with_ready(false)))
            .with_fallback(Box::new(
                ScriptedClassifier::new("fallback").then_return(vec![LabelCandidate::new("ox", 0.6)]),
            ));
        assert_eq!(p.active_classifier(), Some("fallback"));
        let mut session = SessionState::default();
        let record = run(&mut p, &mut session);
        assert_eq!(record.label.to_string(), "Sahiwal");
        assert_eq!(record.confidence, 0.6);
    }

    #[test]
    fn no_classifier_yields_sentinel_without_tally() {
        let mut p = pipeline();
        assert_eq!(p.active_classifier(), None);
        let mut session = SessionState::default();
        let record = run(&mut p, &mut session);
        assert_eq!(record.label, CaptureLabel::NoClassifier);
        assert_eq!(record.confidence, 0.75);
        assert!(session.leaderboard.is_empty());
        assert_eq!(session.captures_attempted, 1);
        assert_eq!(session.captures.len(), 1);
    }

    #[test]
    fn empty_result_and_fault_are_absorbed() {
        let mut p = pipeline().with_primary(Box::new(
            ScriptedClassifier::new("primary")
                .then_return(Vec::new())
                .then_fail("model exploded"),
        ));
        let mut session = SessionState::default();
        let first = run(&mut p, &mut session);
        let second = run(&mut p, &mut session);
        assert_eq!(first.label, CaptureLabel::Unknown);
        assert_eq!(second.label, CaptureLabel::PredictionError);
        assert_eq!(second.confidence, 0.75);
        assert!(session.leaderboard.is_empty());
        assert_eq!(session.captures_attempted, 2);
    }

    #[test]
    fn observer_sees_count_leaderboard_and_record() {
        let mut p = pipeline().with_primary(Box::new(
            ScriptedClassifier::new("primary").then_return(vec![LabelCandidate::new("Gir", 0.9)]),
        ));
        let mut session = SessionState::default();
        let mut observer = RecordingObserver::default();
        p.classify(
            &mut session,
            &mut observer,
            &Frame::empty(0),
            &BoundingBox::default(),
            0.7,
            42,
        );
        assert_eq!(observer.counts, vec![1]);
        assert_eq!(observer.leaderboards.len(), 1);
        assert_eq!(observer.leaderboards[0][0].category, "Jaffrabadi");
        assert_eq!(observer.captures.len(), 1);
        assert_eq!(observer.captures[0].timestamp_ms, 42);
    }
}
