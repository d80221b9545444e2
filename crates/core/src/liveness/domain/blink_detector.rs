use std::time::{Duration, Instant};

use crate::liveness::domain::eye_aspect_ratio::is_closed;
use crate::shared::constants::DEFAULT_BLINK_REFRACTORY_MS;

/// Edge detector over the EAR signal.
///
/// A blink event fires on the open -> closed edge, provided more than the
/// refractory period has passed since the previous event. Holding the eyes
/// shut fires nothing further; reopening only re-arms the edge.
#[derive(Clone, Debug)]
pub struct BlinkDetector {
    threshold: f64,
    refractory: Duration,
    closed: bool,
    last_event: Option<Instant>,
}

impl BlinkDetector {
    pub fn new(threshold: f64, refractory: Duration) -> Self {
        Self {
            threshold,
            refractory,
            closed: false,
            last_event: None,
        }
    }

    /// Feeds one EAR reading. Returns true when a blink event fires.
    pub fn update(&mut self, ear: f64, now: Instant) -> bool {
        let closed = is_closed(ear, self.threshold);

        if closed && !self.closed && self.refractory_elapsed(now) {
            self.closed = true;
            self.last_event = Some(now);
            return true;
        }
        if !closed && self.closed {
            self.closed = false;
        }
        false
    }

    fn refractory_elapsed(&self, now: Instant) -> bool {
        match self.last_event {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.refractory,
        }
    }

    /// Clears the debounced closed flag. The refractory window is kept so a
    /// session reset cannot be used to fire blinks back to back.
    pub fn reset(&mut self) {
        self.closed = false;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn last_event(&self) -> Option<Instant> {
        self.last_event
    }
}

impl Default for BlinkDetector {
    fn default() -> Self {
        Self::new(0.28, Duration::from_millis(DEFAULT_BLINK_REFRACTORY_MS))
    }
}
