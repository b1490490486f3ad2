//! Capture records, bounded capture history and the capture cooldown gate.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use crate::catalog::Category;
use crate::frame::StillImage;

/// Maximum number of captures kept in history.
pub const CAPTURE_BUFFER_CAPACITY: usize = 60;

/// Minimum interval between two triggered captures.
pub const DEFAULT_COOLDOWN_MS: u64 = 3000;

// ----------------------------------------------------------------------------
// CaptureRecord
// ----------------------------------------------------------------------------

/// What a capture was classified as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureLabel {
    /// A real catalog entry.
    Category(Category),
    /// The classifier ran but returned no candidates.
    Unknown,
    /// No classifier was ready.
    NoClassifier,
    /// The classifier faulted.
    PredictionError,
}

impl CaptureLabel {
    pub fn category(&self) -> Option<&Category> {
        match self {
            CaptureLabel::Category(category) => Some(category),
            _ => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.category().is_none()
    }

    pub fn as_str(&self) -> &str {
        match self {
            CaptureLabel::Category(category) => category.name(),
            CaptureLabel::Unknown => "unknown",
            CaptureLabel::NoClassifier => "unknown (no classifier)",
            CaptureLabel::PredictionError => "prediction error",
        }
    }
}

impl fmt::Display for CaptureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed capture, as shown in the visual history.
#[derive(Clone, Debug)]
pub struct CaptureRecord {
    pub image: StillImage,
    pub label: CaptureLabel,
    /// Classifier probability, or the detection score for sentinel outcomes.
    pub confidence: f32,
    /// Clock reading (ms) when the capture was triggered.
    pub timestamp_ms: u64,
    /// Value of the global capture counter for this capture.
    pub sequence: u64,
}

impl CaptureRecord {
    /// Confidence rounded to a whole percent.
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

// ----------------------------------------------------------------------------
// CaptureBuffer
// ----------------------------------------------------------------------------

/// Bounded FIFO of capture records, oldest first.
///
/// Appending past capacity evicts from the front. There is no other removal path.
#[derive(Clone, Debug)]
pub struct CaptureBuffer {
    records: VecDeque<CaptureRecord>,
    capacity: usize,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::with_capacity(CAPTURE_BUFFER_CAPACITY)
    }

    /// Capacity is raised to at least 1.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record; returns how many old records were evicted.
    pub fn append(&mut self, record: CaptureRecord) -> usize {
        self.records.push_back(record);
        let mut evicted = 0;
        while self.records.len() > self.capacity {
            self.records.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Snapshot of the history, oldest first.
    pub fn contents(&self) -> Vec<CaptureRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CaptureRecord> {
        self.records.iter()
    }

    pub fn oldest(&self) -> Option<&CaptureRecord> {
        self.records.front()
    }

    pub fn latest(&self) -> Option<&CaptureRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for CaptureBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------------------------
// CaptureThrottle
// ----------------------------------------------------------------------------

/// Global cooldown gate shared by every detection.
///
/// The first acquire always succeeds. Afterwards an acquire succeeds only when
/// strictly more than `cooldown_ms` has passed since the last success.
#[derive(Clone, Debug)]
pub struct CaptureThrottle {
    last_capture_ms: Option<u64>,
    cooldown_ms: u64,
}

impl CaptureThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_capture_ms: None,
            cooldown_ms: cooldown.as_millis() as u64,
        }
    }

    /// Check-and-update in one step. State changes only on success.
    pub fn try_acquire(&mut self, now_ms: u64) -> bool {
        let open = match self.last_capture_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) > self.cooldown_ms,
        };
        if open {
            self.last_capture_ms = Some(now_ms);
        }
        open
    }

    pub fn last_capture_ms(&self) -> Option<u64> {
        self.last_capture_ms
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for CaptureThrottle {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_COOLDOWN_MS))
    }
}
