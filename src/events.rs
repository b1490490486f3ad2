//! Notifications for a presentation layer.
//!
//! The core never renders anything itself. It reports state changes through
//! `SessionObserver`; every hook defaults to a no-op.

use std::sync::{Arc, Mutex};

use crate::capture::CaptureRecord;
use crate::leaderboard::LeaderboardEntry;

pub trait SessionObserver {
    /// Once per completed capture, whatever its outcome.
    fn on_capture_recorded(&mut self, _record: &CaptureRecord) {}

    /// After every leaderboard mutation, with a fresh ranked snapshot.
    fn on_leaderboard_changed(&mut self, _ranked: &[LeaderboardEntry]) {}

    /// On every capture attempt, with the new global count.
    fn on_global_count_changed(&mut self, _count: u64) {}

    /// Human-readable status line (model loading, camera state, ...).
    fn on_status(&mut self, _status: &str) {}
}

/// Observer that drops every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl SessionObserver for NullObserver {}

/// Observer that writes notifications to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl SessionObserver for LogObserver {
    fn on_capture_recorded(&mut self, record: &CaptureRecord) {
        log::info!(
            "capture #{}: {} ({}%)",
            record.sequence,
            record.label,
            record.confidence_percent()
        );
    }

    fn on_leaderboard_changed(&mut self, ranked: &[LeaderboardEntry]) {
        if let Some(leader) = ranked.first() {
            log::debug!(
                "leaderboard: {} categories, leader {} x{}",
                ranked.len(),
                leader.category,
                leader.count
            );
        }
    }

    fn on_global_count_changed(&mut self, count: u64) {
        log::debug!("cows detected: {}", count);
    }

    fn on_status(&mut self, status: &str) {
        log::info!("{}", status);
    }
}

/// Observer that keeps every notification in memory.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    pub captures: Vec<CaptureRecord>,
    pub leaderboards: Vec<Vec<LeaderboardEntry>>,
    pub counts: Vec<u64>,
    pub statuses: Vec<String>,
}

impl SessionObserver for RecordingObserver {
    fn on_capture_recorded(&mut self, record: &CaptureRecord) {
        self.captures.push(record.clone());
    }

    fn on_leaderboard_changed(&mut self, ranked: &[LeaderboardEntry]) {
        self.leaderboards.push(ranked.to_vec());
    }

    fn on_global_count_changed(&mut self, count: u64) {
        self.counts.push(count);
    }

    fn on_status(&mut self, status: &str) {
        self.statuses.push(status.to_string());
    }
}

/// Shared observer: the loop notifies through one handle while another reads.
///
/// A poisoned lock drops the notification.
impl<T: SessionObserver> SessionObserver for Arc<Mutex<T>> {
    fn on_capture_recorded(&mut self, record: &CaptureRecord) {
        if let Ok(mut inner) = self.lock() {
            inner.on_capture_recorded(record);
        }
    }

    fn on_leaderboard_changed(&mut self, ranked: &[LeaderboardEntry]) {
        if let Ok(mut inner) = self.lock() {
            inner.on_leaderboard_changed(ranked);
        }
    }

    fn on_global_count_changed(&mut self, count: u64) {
        if let Ok(mut inner) = self.lock() {
            inner.on_global_count_changed(count);
        }
    }

    fn on_status(&mut self, status: &str) {
        if let Ok(mut inner) = self.lock() {
            inner.on_status(status);
        }
    }
}

/// Fans every notification out to several observers, in order.
#[derive(Default)]
pub struct FanoutObserver {
    observers: Vec<Box<dyn SessionObserver>>,
}

impl FanoutObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Box<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl SessionObserver for FanoutObserver {
    fn on_capture_recorded(&mut self, record: &CaptureRecord) {
        self.observers
            .iter_mut()
            .for_each(|o| o.on_capture_recorded(record));
    }

    fn on_leaderboard_changed(&mut self, ranked: &[LeaderboardEntry]) {
        self.observers
            .iter_mut()
            .for_each(|o| o.on_leaderboard_changed(ranked));
    }

    fn on_global_count_changed(&mut self, count: u64) {
        self.observers
            .iter_mut()
            .for_each(|o| o.on_global_count_changed(count));
    }

    fn on_status(&mut self, status: &str) {
        self.observers.iter_mut().for_each(|o| o.on_status(status));
    }
}
