use serde::Serialize;

/// Where a verification session stands after the latest tick.
///
/// `Searching`, `Stabilizing` and `Armed` are recomputed every tick and fall
/// straight back to `Searching` when framing, pose or lighting fail.
/// `Captured` and `Faulted` hold until the session is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureState {
    /// No face, or framing/pose/lighting not satisfied.
    Searching,
    /// Conditions hold but the stability lock is not reached, or glasses
    /// are still detected.
    Stabilizing,
    /// Locked and glasses-free; waiting for a blink.
    Armed,
    /// A blink fired while armed; the frame has been emitted.
    Captured,
    /// The detector cannot analyse frames.
    Faulted,
}

impl CaptureState {
    /// States in which the controller no longer analyses frames.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaptureState::Captured | CaptureState::Faulted)
    }
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureState::Searching => write!(f, "Searching"),
            CaptureState::Stabilizing => write!(f, "Stabilizing"),
            CaptureState::Armed => write!(f, "Armed"),
            CaptureState::Captured => write!(f, "Captured"),
            CaptureState::Faulted => write!(f, "Faulted"),
        }
    }
}
