//! Face placement and head pose checks.
//!
//! Both are loose heuristics over landmark geometry, not metric pose
//! estimation: they reject faces at the frame edge, too small or too close,
//! visibly tilted, or turned away.

use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::liveness::domain::thresholds::LivenessThresholds;

/// Box center inside the central band on both axes and box height within
/// the allowed fraction of the frame.
pub fn position_ok(
    landmarks: &FaceLandmarks,
    frame_width: u32,
    frame_height: u32,
    thresholds: &LivenessThresholds,
) -> bool {
    let fw = frame_width as f64;
    let fh = frame_height as f64;
    let center = landmarks.bounding_box.center();
    let margin = thresholds.center_margin;

    let inside_x = center.x > fw * margin && center.x < fw * (1.0 - margin);
    let inside_y = center.y > fh * margin && center.y < fh * (1.0 - margin);

    let height = landmarks.bounding_box.height;
    let sized = height > fh * thresholds.min_face_height && height < fh * thresholds.max_face_height;

    inside_x && inside_y && sized
}

/// Absolute angle in degrees of the line joining the outer eye corners.
pub fn roll_degrees(landmarks: &FaceLandmarks) -> f64 {
    let a = landmarks.left_eye[0];
    let b = landmarks.right_eye[3];
    (b.y - a.y).atan2(b.x - a.x).to_degrees().abs()
}

/// `|(nose - jaw_left) / (jaw_right - nose) - 1|`: zero for a frontal face,
/// growing as the nose drifts toward either jaw edge.
pub fn yaw_ratio(landmarks: &FaceLandmarks) -> f64 {
    let nose_x = landmarks.bridge().x;
    let left_span = nose_x - landmarks.jaw[0].x;
    let right_span = landmarks.jaw[16].x - nose_x;
    (left_span / right_span - 1.0).abs()
}

/// Roll and yaw both inside their limits. NaN readings fail.
pub fn pose_ok(roll: f64, yaw: f64, thresholds: &LivenessThresholds) -> bool {
    roll < thresholds.max_roll_degrees && yaw < thresholds.max_yaw_ratio
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liveness::domain::test_faces::frontal_face;
    use crate::shared::geometry::{BoundingBox, Point};
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn with_box(x: f64, y: f64, w: f64, h: f64) -> FaceLandmarks {
        FaceLandmarks {
            bounding_box: BoundingBox::new(x, y, w, h),
            ..frontal_face(640, 480)
        }
    }

    #[test]
    fn test_centered_half_height_face_is_in_position() {
        let t = LivenessThresholds::default();
        // center (320, 240), height 240 = 50% of 480
        assert!(position_ok(&with_box(200.0, 120.0, 240.0, 240.0), 640, 480, &t));
    }

    #[rstest]
    #[case::left_edge(-100.0, 120.0, 240.0, 240.0)] // center x = 20 < 64
    #[case::bottom_edge(200.0, 330.0, 240.0, 240.0)] // center y = 450 > 432
    #[case::too_small(300.0, 200.0, 80.0, 80.0)] // 80 < 144
    #[case::too_close(100.0, -5.0, 480.0, 475.0)] // 475 > 470.4
    fn test_out_of_position(#[case] x: f64, #[case] y: f64, #[case] w: f64, #[case] h: f64) {
        let t = LivenessThresholds::default();
        assert!(!position_ok(&with_box(x, y, w, h), 640, 480, &t));
    }

    #[test]
    fn test_center_on_band_edge_fails() {
        let t = LivenessThresholds::default();
        // center x exactly at 10% of 640
        assert!(!position_ok(&with_box(-56.0, 120.0, 240.0, 240.0), 640, 480, &t));
    }

    #[test]
    fn test_level_eyes_have_zero_roll() {
        assert_relative_eq!(roll_degrees(&frontal_face(640, 480)), 0.0);
    }

    #[test]
    fn test_tilted_eyes_roll() {
        let mut face = frontal_face(640, 480);
        let a = face.left_eye[0];
        // 45 degree line between outer corners
        face.right_eye[3] = Point::new(a.x + 100.0, a.y + 100.0);
        assert_relative_eq!(roll_degrees(&face), 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_symmetric_jaw_has_zero_yaw() {
        assert_relative_eq!(yaw_ratio(&frontal_face(640, 480)), 0.0);
    }

    #[test]
    fn test_turned_face_yaw() {
        let mut face = frontal_face(640, 480);
        let nose_x = face.bridge().x;
        face.jaw[0].x = nose_x - 40.0;
        face.jaw[16].x = nose_x + 120.0;
        // 40 / 120 - 1 = -2/3
        assert_relative_eq!(yaw_ratio(&face), 2.0 / 3.0, epsilon = 1e-9);
    }

    #[rstest]
    #[case(0.0, 0.0, true)]
    #[case(24.9, 0.79, true)]
    #[case(25.0, 0.0, false)]
    #[case(0.0, 0.8, false)]
    #[case(f64::NAN, 0.0, false)]
    #[case(0.0, f64::INFINITY, false)]
    fn test_pose_limits(#[case] roll: f64, #[case] yaw: f64, #[case] ok: bool) {
        assert_eq!(pose_ok(roll, yaw, &LivenessThresholds::default()), ok);
    }

    #[test]
    fn test_jaw_collapsed_onto_nose_fails_pose() {
        let mut face = frontal_face(640, 480);
        face.jaw[16].x = face.bridge().x;
        let yaw = yaw_ratio(&face);
        assert!(!pose_ok(0.0, yaw, &LivenessThresholds::default()));
    }
}
