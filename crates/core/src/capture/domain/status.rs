//! User-facing status: one message per tick plus per-check flags.
//!
//! The message always names the most fundamental unmet precondition, in
//! this order: framing, lighting, glasses, stability, then the blink prompt.

use serde::Serialize;

use crate::capture::domain::capture_state::CaptureState;
use crate::liveness::domain::geometry_analyzer::LivenessSignals;

pub const MSG_SCANNING: &str = "Scanning for face";
pub const MSG_FIT_FACE: &str = "Fit face in frame";
pub const MSG_TOO_DARK: &str = "Area too dark";
pub const MSG_REMOVE_GLASSES: &str = "Remove glasses";
pub const MSG_HOLD_STILL: &str = "Holding still...";
pub const MSG_BLINK_NOW: &str = "Blink now to capture";
pub const MSG_CAPTURED: &str = "Captured, verify your portrait";
pub const MSG_FAULT_PREFIX: &str = "Face analysis unavailable";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationStatus {
    pub state: CaptureState,
    pub face_in_position: bool,
    pub good_lighting: bool,
    pub no_glasses: bool,
    pub blink_armed: bool,
    pub stability: u32,
    pub stability_progress: f64,
    pub message: String,
}

impl VerificationStatus {
    /// Status for a tick where a face was analysed.
    pub fn from_signals(
        state: CaptureState,
        signals: &LivenessSignals,
        locked: bool,
        stability: u32,
        stability_progress: f64,
    ) -> Self {
        Self {
            state,
            face_in_position: signals.framing_ok(),
            good_lighting: signals.lighting_ok,
            no_glasses: signals.glasses_absent,
            blink_armed: state == CaptureState::Armed,
            stability,
            stability_progress,
            message: message_for(signals, locked).to_string(),
        }
    }

    pub fn searching() -> Self {
        Self::with_message(CaptureState::Searching, MSG_SCANNING.to_string())
    }

    /// Status for the capture tick. The checks all passed on that frame, so
    /// the flags reflect it.
    pub fn captured(signals: &LivenessSignals, stability: u32, stability_progress: f64) -> Self {
        Self {
            blink_armed: false,
            message: MSG_CAPTURED.to_string(),
            ..Self::from_signals(
                CaptureState::Captured,
                signals,
                true,
                stability,
                stability_progress,
            )
        }
    }

    pub fn faulted(reason: &str) -> Self {
        Self::with_message(CaptureState::Faulted, format!("{MSG_FAULT_PREFIX}: {reason}"))
    }

    fn with_message(state: CaptureState, message: String) -> Self {
        Self {
            state,
            face_in_position: false,
            good_lighting: false,
            no_glasses: false,
            blink_armed: false,
            stability: 0,
            stability_progress: 0.0,
            message,
        }
    }

    /// Binary "framing ok" indicator (green border in a UI).
    pub fn framing_ok(&self) -> bool {
        self.face_in_position && self.good_lighting && self.no_glasses
    }
}

/// First failing precondition wins.
pub fn message_for(signals: &LivenessSignals, locked: bool) -> &'static str {
    if !signals.framing_ok() {
        MSG_FIT_FACE
    } else if !signals.lighting_ok {
        MSG_TOO_DARK
    } else if !signals.glasses_absent {
        MSG_REMOVE_GLASSES
    } else if !locked {
        MSG_HOLD_STILL
    } else {
        MSG_BLINK_NOW
    }
}
