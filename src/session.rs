//! Per-run mutable state.
//!
//! Everything the detection loop and classification pipeline mutate lives here
//! and is passed in explicitly, so two sessions never share counters.

use std::time::Duration;

use crate::capture::{CaptureBuffer, CaptureThrottle};
use crate::leaderboard::Leaderboard;

#[derive(Clone, Debug, Default)]
pub struct SessionState {
    /// Captures attempted, counted before the classification result is known.
    pub captures_attempted: u64,
    pub throttle: CaptureThrottle,
    pub leaderboard: Leaderboard,
    pub captures: CaptureBuffer,
}

impl SessionState {
    pub fn new(cooldown: Duration, buffer_capacity: usize) -> Self {
        Self {
            captures_attempted: 0,
            throttle: CaptureThrottle::new(cooldown),
            leaderboard: Leaderboard::new(),
            captures: CaptureBuffer::with_capacity(buffer_capacity),
        }
    }

    /// Bump the global capture counter and return the new value.
    pub fn next_capture(&mut self) -> u64 {
        self.captures_attempted += 1;
        self.captures_attempted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_monotonic() {
        let mut session = SessionState::new(Duration::from_secs(3), 60);
        assert_eq!(session.next_capture(), 1);
        assert_eq!(session.next_capture(), 2);
        assert_eq!(session.captures_attempted, 2);
        assert_eq!(session.captures.capacity(), 60);
        assert_eq!(session.throttle.cooldown(), Duration::from_secs(3));
    }
}
