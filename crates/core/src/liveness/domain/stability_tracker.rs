use thiserror::Error;

use crate::shared::constants::{DEFAULT_STABILITY_LOCK, DEFAULT_STABILITY_MAX};

#[derive(Error, Debug, PartialEq)]
pub enum StabilityError {
    #[error("lock threshold must be positive")]
    ZeroLock,
    #[error("counter ceiling {max} is below lock threshold {lock}")]
    CeilingBelowLock { max: u32, lock: u32 },
}

/// Debounces the per-tick compound check into a "locked" state.
///
/// Each passing tick adds one (saturating at `max`); any failing tick drops
/// the counter straight to zero. Locking takes `lock` consecutive good
/// ticks, unlocking takes one bad tick.
#[derive(Clone, Debug)]
pub struct StabilityTracker {
    count: u32,
    max: u32,
    lock: u32,
}

impl StabilityTracker {
    pub fn new(max: u32, lock: u32) -> Result<Self, StabilityError> {
        if lock == 0 {
            return Err(StabilityError::ZeroLock);
        }
        if max < lock {
            return Err(StabilityError::CeilingBelowLock { max, lock });
        }
        Ok(Self { count: 0, max, lock })
    }

    pub fn update(&mut self, compound_ok: bool) -> u32 {
        self.count = if compound_ok {
            (self.count + 1).min(self.max)
        } else {
            0
        };
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn lock_threshold(&self) -> u32 {
        self.lock
    }

    pub fn is_locked(&self) -> bool {
        self.count >= self.lock
    }

    /// Fill level toward the lock, in `[0.0, 1.0]`.
    pub fn progress(&self) -> f64 {
        (self.count as f64 / self.lock as f64).min(1.0)
    }
}

impl Default for StabilityTracker {
    fn default() -> Self {
        Self {
            count: 0,
            max: DEFAULT_STABILITY_MAX,
            lock: DEFAULT_STABILITY_LOCK,
        }
    }
}
