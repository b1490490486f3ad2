//! Herdwatch
//!
//! Live cattle spotting on a camera feed: detect cows frame by frame, capture
//! one at most every cooldown window, classify the capture, map the
//! classifier's label onto a fixed breed catalog, and keep a ranked tally and a
//! bounded capture history.
//!
//! # Architecture
//!
//! ```text
//! FrameSource -> DetectionLoop -> CaptureThrottle -> ClassificationPipeline
//!                                                      |-> LabelMapper
//!                                                      |-> Leaderboard
//!                                                      `-> CaptureBuffer
//! ```
//!
//! Camera access, model inference, rasterization and drawing are capabilities
//! behind traits (`FrameSource`, `ObjectDetector`, `Classifier`, `Rasterizer`,
//! `AnnotationSink`). All mutable run state lives in `SessionState`, and time
//! comes from an injected `Clock`, so a run can be replayed deterministically.
//!
//! # Module Structure
//!
//! - `catalog`: breed catalog and deterministic label mapping
//! - `leaderboard`, `capture`, `session`: tallies, history, cooldown, run state
//! - `frame`, `ingest`: frames, stills and frame sources
//! - `detect`, `classify`: model capabilities and the classification pipeline
//! - `detection_loop`: the per-frame state machine
//! - `events`, `annotate`, `ui`: outward notifications and rendering

pub mod annotate;
pub mod capture;
pub mod catalog;
pub mod classify;
pub mod clock;
pub mod config;
pub mod detect;
pub mod detection_loop;
pub mod events;
pub mod frame;
pub mod ingest;
pub mod leaderboard;
pub mod session;
pub mod ui;

pub use annotate::{annotation_label, AnnotationSink, LogSink, NullSink, OverlaySink};
pub use capture::{
    CaptureBuffer, CaptureLabel, CaptureRecord, CaptureThrottle, CAPTURE_BUFFER_CAPACITY,
    DEFAULT_COOLDOWN_MS,
};
pub use catalog::{label_hash, Catalog, Category, LabelMapper, CATTLE_BREEDS};
#[cfg(feature = "backend-tract")]
pub use classify::TractClassifier;
pub use classify::{
    ClassificationPipeline, Classifier, LabelCandidate, ScriptedClassifier, StubClassifier,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::HerdwatchConfig;
pub use detect::{BoundingBox, Detection, ObjectDetector, ScriptedDetector, StubDetector};
pub use detection_loop::{
    DetectionLoop, LoopSettings, LoopState, RunSummary, TickReport, DEFAULT_MIN_SCORE,
    DEFAULT_TARGET_CLASS,
};
pub use events::{FanoutObserver, LogObserver, NullObserver, RecordingObserver, SessionObserver};
pub use frame::{CropResizeRasterizer, Frame, Rasterizer, StillImage, DEFAULT_STILL_SIZE};
pub use ingest::{open_source, DirectorySource, FrameSource, SourceStats, SyntheticSource};
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use session::SessionState;
