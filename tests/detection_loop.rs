use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use herdwatch::{
    AnnotationSink, BoundingBox, CaptureLabel, ClassificationPipeline, CropResizeRasterizer, Detection,
    DetectionLoop, Frame, LabelCandidate, LabelMapper, LoopState, ManualClock, OverlaySink,
    RecordingObserver, ScriptedClassifier, ScriptedDetector, SessionState, StubClassifier,
    StubDetector, SyntheticSource,
};

fn cow() -> Detection {
    Detection::new("cow", 0.75, BoundingBox::new(10.0, 10.0, 50.0, 50.0))
}

fn pipeline() -> ClassificationPipeline {
    ClassificationPipeline::new(LabelMapper::default(), Box::new(CropResizeRasterizer::new()))
        .with_still_size(16)
}

fn detection_loop(
    detector: ScriptedDetector,
    pipeline: ClassificationPipeline,
    clock: &ManualClock,
) -> (DetectionLoop, Arc<Mutex<RecordingObserver>>) {
    let observer = Arc::new(Mutex::new(RecordingObserver::default()));
    let dl = DetectionLoop::new(
        Box::new(detector),
        pipeline,
        Box::new(clock.clone()),
        SessionState::default(),
    )
    .with_observer(Box::new(observer.clone()));
    (dl, observer)
}

#[test]
fn cooldown_gates_repeated_sightings() {
    let clock = ManualClock::new(0);
    let detector = ScriptedDetector::new()
        .then_detect(vec![cow()])
        .then_detect(vec![cow()])
        .then_detect(vec![cow()]);
    let (mut dl, observer) = detection_loop(detector, pipeline(), &clock);

    let first = dl.tick(&Frame::empty(1));
    assert!(first.capture.is_some());
    assert_eq!(dl.session().captures_attempted, 1);

    clock.set(1000);
    let second = dl.tick(&Frame::empty(2));
    assert!(second.capture.is_none());
    assert_eq!(second.qualifying, 1);
    assert_eq!(dl.session().captures_attempted, 1);

    clock.set(3100);
    let third = dl.tick(&Frame::empty(3));
    assert!(third.capture.is_some());
    assert_eq!(dl.session().captures_attempted, 2);

    assert_eq!(observer.lock().unwrap().counts, vec![1, 2]);
}

#[test]
fn classified_capture_updates_leaderboard() {
    let clock = ManualClock::new(0);
    let classifier =
        ScriptedClassifier::new("resnet").then_return(vec![LabelCandidate::new("Gir", 0.92)]);
    let (mut dl, observer) = detection_loop(
        ScriptedDetector::new().then_detect(vec![cow()]),
        pipeline().with_primary(Box::new(classifier)),
        &clock,
    );
    let category = LabelMapper::default().map(Some("Gir"));

    let record = dl.tick(&Frame::empty(1)).capture.expect("capture");

    assert_eq!(record.label, CaptureLabel::Category(category.clone()));
    assert_eq!(record.confidence, 0.92);
    assert_eq!(dl.session().leaderboard.count(&category), 1);
    assert_eq!(dl.session().captures.len(), 1);

    let observed = observer.lock().unwrap();
    assert_eq!(observed.captures.len(), 1);
    assert_eq!(observed.leaderboards.len(), 1);
    assert_eq!(observed.leaderboards[0][0].category, category.name());
    assert_eq!(observed.leaderboards[0][0].count, 1);
}

#[test]
fn no_classifier_records_sentinel() {
    let clock = ManualClock::new(0);
    let (mut dl, observer) = detection_loop(
        ScriptedDetector::new().then_detect(vec![cow()]),
        pipeline().with_primary(Box::new(ScriptedClassifier::new("resnet").with_ready(false))),
        &clock,
    );

    let record = dl.tick(&Frame::empty(1)).capture.expect("capture");

    assert_eq!(record.label.to_string(), "unknown (no classifier)");
    assert_eq!(record.confidence, 0.75);
    assert!(dl.session().leaderboard.is_empty());
    assert!(observer.lock().unwrap().leaderboards.is_empty());
    assert_eq!(observer.lock().unwrap().captures.len(), 1);
}

#[test]
fn classifier_fault_does_not_stop_the_loop() {
    let clock = ManualClock::new(0);
    let classifier = ScriptedClassifier::new("resnet")
        .then_fail("tensor shape mismatch")
        .then_return(vec![LabelCandidate::new("ox", 0.8)]);
    let (mut dl, _observer) = detection_loop(
        ScriptedDetector::new()
            .then_detect(vec![cow()])
            .then_detect(vec![cow()]),
        pipeline().with_primary(Box::new(classifier)),
        &clock,
    );

    let failed = dl.tick(&Frame::empty(1)).capture.expect("capture");
    assert_eq!(failed.label, CaptureLabel::PredictionError);
    assert!(dl.session().leaderboard.is_empty());
    assert_eq!(dl.state(), LoopState::Running);

    clock.set(5000);
    let next = dl.tick(&Frame::empty(2));
    assert!(next.fault.is_none());
    let record = next.capture.expect("capture");
    assert_eq!(record.label.to_string(), "Sahiwal");
    assert_eq!(dl.session().captures_attempted, 2);
}

#[test]
fn later_cows_in_frame_are_annotated_not_captured() {
    let clock = ManualClock::new(0);
    let overlay = Arc::new(Mutex::new(OverlaySink::default()));
    let detections = vec![
        cow(),
        Detection::new("cow", 0.9, BoundingBox::new(200.0, 100.0, 80.0, 60.0)),
        Detection::new("person", 0.95, BoundingBox::new(0.0, 0.0, 5.0, 5.0)),
    ];
    let (dl, _observer) = detection_loop(
        ScriptedDetector::new().then_detect(detections),
        pipeline(),
        &clock,
    );
    let mut dl = dl.with_annotations(Box::new(SharedOverlay(overlay.clone())));

    let report = dl.tick(&Frame::empty(7));

    assert_eq!(report.qualifying, 2);
    assert_eq!(report.capture.expect("capture").confidence, 0.75);
    assert_eq!(dl.session().captures_attempted, 1);
    let overlay = overlay.lock().unwrap();
    assert_eq!(overlay.frame_index, Some(7));
    let labels: Vec<&str> = overlay.drawn.iter().map(|(_, l)| l.as_str()).collect();
    assert_eq!(labels, vec!["cow (75%)", "cow (90%)"]);
}

struct SharedOverlay(Arc<Mutex<OverlaySink>>);

impl AnnotationSink for SharedOverlay {
    fn begin_frame(&mut self, frame_index: u64) {
        self.0.lock().unwrap().begin_frame(frame_index);
    }

    fn draw(&mut self, bbox: &BoundingBox, label: &str) {
        self.0.lock().unwrap().draw(bbox, label);
    }
}

#[test]
fn capture_history_keeps_last_sixty() {
    let clock = ManualClock::new(0);
    let mut detector = ScriptedDetector::new();
    for _ in 0..65 {
        detector = detector.then_detect(vec![cow()]);
    }
    let (mut dl, _observer) = detection_loop(detector, pipeline(), &clock);

    for i in 0..65u64 {
        clock.set(i * 3001);
        assert!(dl.tick(&Frame::empty(i)).capture.is_some());
    }

    let history = dl.session().captures.contents();
    assert_eq!(history.len(), 60);
    assert_eq!(history[0].sequence, 6);
    assert_eq!(history[59].sequence, 65);
}

#[test]
fn run_drives_ticks_from_a_source() {
    let clock = ManualClock::new(0);
    let mut source = SyntheticSource::new("stub://test", 64, 48).with_limit(12);
    let stop = AtomicBool::new(false);
    let mut dl = DetectionLoop::new(
        Box::new(StubDetector::new(11).with_presence(1.0)),
        pipeline().with_primary(Box::new(StubClassifier::default())),
        Box::new(clock.clone()),
        SessionState::new(Duration::from_millis(0), 60),
    );

    let summary = dl.run(&mut source, &stop, Duration::ZERO, None).expect("run");

    assert_eq!(summary.ticks, 12);
    assert_eq!(summary.faults, 0);
    // Clock never advances, so only the first capture gets through.
    assert!(summary.captures <= 1);
    assert_eq!(dl.session().captures_attempted, summary.captures);
}

#[test]
fn run_stops_at_max_ticks_and_on_stop_flag() {
    let clock = ManualClock::new(0);
    let mut source = SyntheticSource::new("stub://test", 8, 8);
    let mut dl = DetectionLoop::new(
        Box::new(ScriptedDetector::new().then_fail("warming up")),
        pipeline(),
        Box::new(clock.clone()),
        SessionState::default(),
    );

    let stop = AtomicBool::new(false);
    let summary = dl.run(&mut source, &stop, Duration::ZERO, Some(3)).expect("run");
    assert_eq!(summary.ticks, 3);
    assert_eq!(summary.faults, 1);

    let stopped = AtomicBool::new(true);
    let summary = dl.run(&mut source, &stopped, Duration::ZERO, None).expect("run");
    assert_eq!(summary.ticks, 0);
}
