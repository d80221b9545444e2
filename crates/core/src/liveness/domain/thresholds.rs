use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThresholdError {
    #[error("center_margin must be in [0.0, 0.5), got {0}")]
    CenterMargin(f64),
    #[error("face height bounds must satisfy 0 <= min < max <= 1, got {min}..{max}")]
    FaceHeight { min: f64, max: f64 },
    #[error("brightness_raster must be positive")]
    EmptyRaster,
    #[error("bridge window must be at least 1x2, got {width}x{height}")]
    BridgeWindow { width: u32, height: u32 },
    #[error("manual_blink_ear ({manual}) must not exceed blink_ear ({capture})")]
    ManualBlinkLooser { manual: f64, capture: f64 },
}

/// Tunable limits for the per-frame liveness checks.
///
/// The eyewear and pose values are empirical and should be recalibrated
/// for a new camera or detector rather than treated as fixed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessThresholds {
    /// Face box center must lie strictly inside `[margin, 1 - margin]` of
    /// the frame on both axes.
    pub center_margin: f64,
    /// Face box height bounds as fractions of frame height (exclusive).
    pub min_face_height: f64,
    pub max_face_height: f64,
    /// Roll limit in degrees.
    pub max_roll_degrees: f64,
    /// Limit on `|left_jaw_span / right_jaw_span - 1|`.
    pub max_yaw_ratio: f64,
    /// Mean channel intensity (0-255) the frame must exceed.
    pub min_brightness: f64,
    /// Side of the square raster the frame is reduced to for brightness.
    pub brightness_raster: u32,
    /// Bridge gap / eye width must exceed this for the glasses check.
    pub min_bridge_ratio: f64,
    pub bridge_window_width: u32,
    pub bridge_window_height: u32,
    /// Vertical neighbour red-channel step counted as an edge.
    pub bridge_edge_delta: u8,
    /// More edges than this in the bridge window reads as a glasses frame.
    pub max_bridge_edges: u32,
    /// EAR below this counts as closed for automatic capture.
    pub blink_ear: f64,
    /// Stricter EAR for the manual blink helper.
    pub manual_blink_ear: f64,
}

impl Default for LivenessThresholds {
    fn default() -> Self {
        Self {
            center_margin: 0.1,
            min_face_height: 0.3,
            max_face_height: 0.98,
            max_roll_degrees: 25.0,
            max_yaw_ratio: 0.8,
            min_brightness: 50.0,
            brightness_raster: 64,
            min_bridge_ratio: 0.6,
            bridge_window_width: 40,
            bridge_window_height: 20,
            bridge_edge_delta: 35,
            max_bridge_edges: 50,
            blink_ear: 0.28,
            manual_blink_ear: 0.22,
        }
    }
}

impl LivenessThresholds {
    pub fn validate(&self) -> Result<(), ThresholdError> {
        if !(0.0..0.5).contains(&self.center_margin) {
            return Err(ThresholdError::CenterMargin(self.center_margin));
        }
        if !(self.min_face_height >= 0.0
            && self.min_face_height < self.max_face_height
            && self.max_face_height <= 1.0)
        {
            return Err(ThresholdError::FaceHeight {
                min: self.min_face_height,
                max: self.max_face_height,
            });
        }
        if self.brightness_raster == 0 {
            return Err(ThresholdError::EmptyRaster);
        }
        if self.bridge_window_width == 0 || self.bridge_window_height < 2 {
            return Err(ThresholdError::BridgeWindow {
                width: self.bridge_window_width,
                height: self.bridge_window_height,
            });
        }
        if self.manual_blink_ear > self.blink_ear {
            return Err(ThresholdError::ManualBlinkLooser {
                manual: self.manual_blink_ear,
                capture: self.blink_ear,
            });
        }
        Ok(())
    }
}
