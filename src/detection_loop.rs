//! Per-frame detection loop.
//!
//! Each tick: detect objects in the frame, keep those of the target class
//! scoring above the threshold, annotate every one of them, and let the first
//! one that gets through the capture throttle trigger a classification.
//! At most one capture is dispatched per tick.
//!
//! Detection faults are logged and end the tick; the next tick runs as usual.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::annotate::{annotation_label, AnnotationSink, NullSink};
use crate::capture::CaptureRecord;
use crate::classify::ClassificationPipeline;
use crate::clock::Clock;
use crate::detect::{Detection, ObjectDetector};
use crate::events::{NullObserver, SessionObserver};
use crate::frame::Frame;
use crate::ingest::FrameSource;
use crate::session::SessionState;

pub const DEFAULT_TARGET_CLASS: &str = "cow";

/// Detections must score strictly above this to be considered.
pub const DEFAULT_MIN_SCORE: f32 = 0.6;

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// No tick has run yet.
    Initializing,
    Running,
    /// The last tick faulted. Ticks keep being scheduled.
    Error,
}

#[derive(Clone, Debug)]
pub struct LoopSettings {
    pub target_class: String,
    pub min_score: f32,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            target_class: DEFAULT_TARGET_CLASS.to_string(),
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

/// What happened during one tick.
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    pub frame_index: u64,
    pub now_ms: u64,
    /// Everything the detector returned.
    pub detections: usize,
    /// Detections of the target class above the score threshold (all annotated).
    pub qualifying: usize,
    /// The capture dispatched this tick, if any.
    pub capture: Option<CaptureRecord>,
    /// Detection fault message, if the detector failed.
    pub fault: Option<String>,
}

/// Totals for a `run`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub captures: u64,
    pub faults: u64,
}

pub struct DetectionLoop {
    detector: Box<dyn ObjectDetector>,
    pipeline: ClassificationPipeline,
    annotations: Box<dyn AnnotationSink>,
    observer: Box<dyn SessionObserver>,
    clock: Box<dyn Clock>,
    session: SessionState,
    settings: LoopSettings,
    state: LoopState,
}

impl DetectionLoop {
    pub fn new(
        detector: Box<dyn ObjectDetector>,
        pipeline: ClassificationPipeline,
        clock: Box<dyn Clock>,
        session: SessionState,
    ) -> Self {
        Self {
            detector,
            pipeline,
            annotations: Box::new(NullSink),
            observer: Box::new(NullObserver),
            clock,
            session,
            settings: LoopSettings::default(),
            state: LoopState::Initializing,
        }
    }

    pub fn with_settings(mut self, settings: LoopSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_annotations(mut self, sink: Box<dyn AnnotationSink>) -> Self {
        self.annotations = sink;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn pipeline_mut(&mut self) -> &mut ClassificationPipeline {
        &mut self.pipeline
    }

    fn qualifies(&self, detection: &Detection) -> bool {
        detection.class == self.settings.target_class && detection.score > self.settings.min_score
    }

    /// Run one tick against `frame`. Never fails; faults are reported in the result.
    pub fn tick(&mut self, frame: &Frame) -> TickReport {
        let now_ms = self.clock.now_ms();
        let mut report = TickReport {
            frame_index: frame.index,
            now_ms,
            ..TickReport::default()
        };

        if self.state == LoopState::Initializing {
            self.observer.on_status("camera started, detecting");
        }

        let detections = match self.detector.detect(frame) {
            Ok(detections) => detections,
            Err(e) => {
                log::error!("detection error ({}): {:#}", self.detector.name(), e);
                self.state = LoopState::Error;
                report.fault = Some(format!("{:#}", e));
                return report;
            }
        };
        self.state = LoopState::Running;
        report.detections = detections.len();

        let qualifying: Vec<&Detection> = detections.iter().filter(|d| self.qualifies(d)).collect();
        report.qualifying = qualifying.len();

        self.annotations.begin_frame(frame.index);
        for detection in qualifying {
            self.annotations
                .draw(&detection.bbox, &annotation_label(detection));

            // First detection through the throttle wins the tick.
            if report.capture.is_none() && self.session.throttle.try_acquire(now_ms) {
                let record = self.pipeline.classify(
                    &mut self.session,
                    self.observer.as_mut(),
                    frame,
                    &detection.bbox,
                    detection.score,
                    now_ms,
                );
                report.capture = Some(record);
            }
        }
        report
    }

    /// Pull frames from `source` and tick until `stop` is raised, the source
    /// runs dry, or `max_ticks` ticks have run.
    ///
    /// Frame source errors count as faulted ticks and do not end the run.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        stop: &AtomicBool,
        frame_interval: Duration,
        max_ticks: Option<u64>,
    ) -> Result<RunSummary> {
        source.connect()?;
        let mut summary = RunSummary::default();
        let mut last_health_log = Instant::now();

        while !stop.load(Ordering::SeqCst) {
            if max_ticks.is_some_and(|max| summary.ticks >= max) {
                break;
            }
            summary.ticks += 1;

            match source.next_frame() {
                Ok(Some(frame)) => {
                    let report = self.tick(&frame);
                    if report.fault.is_some() {
                        summary.faults += 1;
                    }
                    if report.capture.is_some() {
                        summary.captures += 1;
                    }
                }
                Ok(None) => {
                    log::info!("frame source exhausted after {} ticks", summary.ticks - 1);
                    summary.ticks -= 1;
                    break;
                }
                Err(e) => {
                    log::error!("frame source error: {:#}", e);
                    self.state = LoopState::Error;
                    summary.faults += 1;
                }
            }

            if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
                let stats = source.stats();
                log::info!(
                    "source health={} frames={} url={} captures={} categories={}",
                    source.is_healthy(),
                    stats.frames_captured,
                    stats.url,
                    self.session.captures_attempted,
                    self.session.leaderboard.len()
                );
                last_health_log = Instant::now();
            }

            if !frame_interval.is_zero() {
                std::thread::sleep(frame_interval);
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LabelMapper;
    use crate::clock::ManualClock;
    use crate::detect::{BoundingBox, ScriptedDetector};
    use crate::frame::CropResizeRasterizer;

    fn cow(score: f32) -> Detection {
        Detection::new("cow", score, BoundingBox::new(10.0, 10.0, 50.0, 50.0))
    }

    fn build(detector: ScriptedDetector, clock: &ManualClock) -> DetectionLoop {
        let pipeline =
            ClassificationPipeline::new(LabelMapper::default(), Box::new(CropResizeRasterizer::new()))
                .with_still_size(4);
        DetectionLoop::new(
            Box::new(detector),
            pipeline,
            Box::new(clock.clone()),
            SessionState::default(),
        )
    }

    #[test]
    fn starts_initializing_then_runs() {
        let clock = ManualClock::new(0);
        let mut dl = build(ScriptedDetector::new().then_detect(vec![]), &clock);
        assert_eq!(dl.state(), LoopState::Initializing);
        dl.tick(&Frame::empty(1));
        assert_eq!(dl.state(), LoopState::Running);
    }

    #[test]
    fn filters_by_class_and_strict_threshold() {
        let clock = ManualClock::new(0);
        let detections = vec![
            cow(0.6),
            Detection::new("person", 0.99, BoundingBox::default()),
            cow(0.61),
        ];
        let mut dl = build(ScriptedDetector::new().then_detect(detections), &clock);
        let report = dl.tick(&Frame::empty(1));
        assert_eq!(report.detections, 3);
        assert_eq!(report.qualifying, 1);
        assert_eq!(report.capture.unwrap().confidence, 0.61);
    }

    #[test]
    fn one_capture_per_tick() {
        let clock = ManualClock::new(0);
        let mut dl = build(
            ScriptedDetector::new().then_detect(vec![cow(0.9), cow(0.8), cow(0.7)]),
            &clock,
        );
        let report = dl.tick(&Frame::empty(1));
        assert_eq!(report.qualifying, 3);
        assert_eq!(report.capture.unwrap().confidence, 0.9);
        assert_eq!(dl.session().captures_attempted, 1);
    }

    #[test]
    fn detection_fault_is_not_fatal() {
        let clock = ManualClock::new(0);
        let mut dl = build(
            ScriptedDetector::new()
                .then_fail("backend offline")
                .then_detect(vec![cow(0.9)]),
            &clock,
        );
        let first = dl.tick(&Frame::empty(1));
        assert_eq!(first.fault.as_deref(), Some("backend offline"));
        assert_eq!(dl.state(), LoopState::Error);
        let second = dl.tick(&Frame::empty(2));
        assert!(second.fault.is_none());
        assert!(second.capture.is_some());
        assert_eq!(dl.state(), LoopState::Running);
    }
}
