use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::liveness::domain::eye_aspect_ratio::{is_closed, mean_eye_aspect_ratio};
use crate::liveness::domain::eyewear::EyewearReading;
use crate::liveness::domain::framing;
use crate::liveness::domain::lighting::mean_brightness;
use crate::liveness::domain::thresholds::LivenessThresholds;
use crate::shared::frame::Frame;

/// Per-tick verdicts and the measurements behind them.
#[derive(Clone, Debug, PartialEq)]
pub struct LivenessSignals {
    pub position_ok: bool,
    pub pose_ok: bool,
    pub lighting_ok: bool,
    pub glasses_absent: bool,
    pub ear: f64,
    pub roll_degrees: f64,
    pub yaw_ratio: f64,
    pub brightness: f64,
    pub bridge_ratio: f64,
    pub bridge_edges: u32,
}

impl LivenessSignals {
    /// Signals reported when no face was found: every check fails.
    pub fn failing() -> Self {
        Self {
            position_ok: false,
            pose_ok: false,
            lighting_ok: false,
            glasses_absent: false,
            ear: f64::NAN,
            roll_degrees: f64::NAN,
            yaw_ratio: f64::NAN,
            brightness: 0.0,
            bridge_ratio: 0.0,
            bridge_edges: 0,
        }
    }

    /// Framing as shown to the user: placement and pose together.
    pub fn framing_ok(&self) -> bool {
        self.position_ok && self.pose_ok
    }

    /// The condition that feeds the stability counter.
    pub fn compound_ok(&self) -> bool {
        self.framing_ok() && self.lighting_ok
    }
}

/// Stateless evaluation of one landmark record against its frame.
pub struct GeometryAnalyzer {
    thresholds: LivenessThresholds,
}

impl GeometryAnalyzer {
    pub fn new(thresholds: LivenessThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &LivenessThresholds {
        &self.thresholds
    }

    pub fn analyze(&self, landmarks: &FaceLandmarks, frame: &Frame) -> LivenessSignals {
        let t = &self.thresholds;

        let position_ok = framing::position_ok(landmarks, frame.width(), frame.height(), t);
        let roll = framing::roll_degrees(landmarks);
        let yaw = framing::yaw_ratio(landmarks);
        let brightness = mean_brightness(frame, t.brightness_raster);
        let eyewear = EyewearReading::measure(landmarks, frame, t);

        LivenessSignals {
            position_ok,
            pose_ok: framing::pose_ok(roll, yaw, t),
            lighting_ok: brightness > t.min_brightness,
            glasses_absent: eyewear.glasses_absent(t),
            ear: mean_eye_aspect_ratio(landmarks),
            roll_degrees: roll,
            yaw_ratio: yaw,
            brightness,
            bridge_ratio: eyewear.bridge_ratio,
            bridge_edges: eyewear.bridge_edges,
        }
    }

    /// Eyes closed under the capture blink threshold.
    pub fn eyes_closed(&self, signals: &LivenessSignals) -> bool {
        is_closed(signals.ear, self.thresholds.blink_ear)
    }

    /// Eyes closed under the stricter threshold used by the manual
    /// "blink to confirm" helper.
    pub fn manual_blink(&self, landmarks: &FaceLandmarks) -> bool {
        is_closed(mean_eye_aspect_ratio(landmarks), self.thresholds.manual_blink_ear)
    }
}

impl Default for GeometryAnalyzer {
    fn default() -> Self {
        Self::new(LivenessThresholds::default())
    }
}
