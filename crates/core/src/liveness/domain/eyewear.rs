//! Glasses heuristic: two independent signals, both must pass.
//!
//! Geometric: frames over the bridge pull the detected inner eye corners
//! together, shrinking the bridge gap relative to eye width.
//! Photometric: a frame bar across the nose bridge shows up as many strong
//! vertical steps in the red channel in a small window around the bridge
//! point.
//!
//! False positives and negatives are expected; the result only drives a
//! "remove glasses" prompt.

use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::liveness::domain::thresholds::LivenessThresholds;
use crate::shared::frame::Frame;

/// `|right_eye[0].x - left_eye[3].x| / |left_eye[3].x - left_eye[0].x|`.
pub fn bridge_ratio(landmarks: &FaceLandmarks) -> f64 {
    let gap = (landmarks.right_eye[0].x - landmarks.left_eye[3].x).abs();
    let eye_width = (landmarks.left_eye[3].x - landmarks.left_eye[0].x).abs();
    if eye_width == 0.0 {
        return 0.0;
    }
    gap / eye_width
}

/// Counts vertical-neighbour red-channel steps above `delta` in a window centred
/// on `(cx, cy)`. Pixels outside the frame read as black.
pub fn bridge_edge_count(
    frame: &Frame,
    cx: f64,
    cy: f64,
    window_width: u32,
    window_height: u32,
    delta: u8,
) -> u32 {
    let x0 = (cx - window_width as f64 / 2.0).round() as i64;
    let y0 = (cy - window_height as f64 / 2.0).round() as i64;
    let w = window_width as i64;
    let h = window_height as i64;

    let mut edges = 0;
    // First and last rows are excluded so the count only sees the interior.
    for dy in 1..(h - 1).max(1) {
        for dx in 0..w {
            let above = frame.red_at(x0 + dx, y0 + dy - 1);
            let here = frame.red_at(x0 + dx, y0 + dy);
            if here.abs_diff(above) > delta {
                edges += 1;
            }
        }
    }
    edges
}

/// Measurements behind the glasses verdict.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EyewearReading {
    pub bridge_ratio: f64,
    pub bridge_edges: u32,
}

impl EyewearReading {
    pub fn measure(landmarks: &FaceLandmarks, frame: &Frame, t: &LivenessThresholds) -> Self {
        let bridge = landmarks.bridge();
        Self {
            bridge_ratio: bridge_ratio(landmarks),
            bridge_edges: bridge_edge_count(
                frame,
                bridge.x,
                bridge.y,
                t.bridge_window_width,
                t.bridge_window_height,
                t.bridge_edge_delta,
            ),
        }
    }

    pub fn glasses_absent(&self, t: &LivenessThresholds) -> bool {
        let good_gap = self.bridge_ratio > t.min_bridge_ratio;
        let has_frames = self.bridge_edges > t.max_bridge_edges;
        good_gap && !has_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liveness::domain::test_faces::frontal_face;
    use approx::assert_relative_eq;
    use rstest::rstest;

    /// Uniform gray frame with horizontal black bars every other row inside
    /// the given rectangle.
    fn striped_frame(w: u32, h: u32, stripe: (u32, u32, u32, u32)) -> Frame {
        let (sx, sy, sw, sh) = stripe;
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                let in_stripe = x >= sx && x < sx + sw && y >= sy && y < sy + sh;
                let v = if in_stripe && y % 2 == 0 { 0 } else { 150 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        Frame::new(data, w, h, 3, 0)
    }

    #[test]
    fn test_bridge_ratio_of_frontal_face() {
        assert_relative_eq!(bridge_ratio(&frontal_face(640, 480)), 0.9, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_eye_width_gives_zero_ratio() {
        let mut face = frontal_face(640, 480);
        face.left_eye[3] = face.left_eye[0];
        assert_relative_eq!(bridge_ratio(&face), 0.0);
    }

    #[test]
    fn test_uniform_window_has_no_edges() {
        let frame = Frame::filled(640, 480, [120, 120, 120], 0);
        assert_eq!(bridge_edge_count(&frame, 320.0, 200.0, 40, 20, 35), 0);
    }

    #[test]
    fn test_striped_window_counts_edges() {
        // Stripes cover the whole 40x20 window around (320, 200): every
        // interior row differs from the one above by 150.
        let frame = striped_frame(640, 480, (300, 190, 40, 20));
        assert_eq!(bridge_edge_count(&frame, 320.0, 200.0, 40, 20, 35), 18 * 40);
    }

    #[test]
    fn test_window_past_frame_edge_reads_black() {
        // Bright frame; window straddles the top edge so the first in-frame
        // row steps up from black.
        let frame = Frame::filled(100, 100, [200, 200, 200], 0);
        // y0 = -5: rows -5..14, the step between rows -1 and 0 is counted.
        assert_eq!(bridge_edge_count(&frame, 50.0, 5.0, 40, 20, 35), 40);
    }

    #[test]
    fn test_small_steps_below_delta_are_ignored() {
        let mut data = Vec::new();
        for y in 0..100u32 {
            for _ in 0..100u32 {
                let v = if y % 2 == 0 { 100 } else { 130 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        let frame = Frame::new(data, 100, 100, 3, 0);
        assert_eq!(bridge_edge_count(&frame, 50.0, 50.0, 40, 20, 35), 0);
    }

    #[test]
    fn test_red_steps_count_even_when_brightness_is_flat() {
        // (100,100,100) and (60,120,100) have nearly the same luma but a red
        // step of 40.
        let mut data = Vec::new();
        for y in 0..100u32 {
            for _ in 0..100u32 {
                let px = if y % 2 == 0 { [100, 100, 100] } else { [60, 120, 100] };
                data.extend_from_slice(&px);
            }
        }
        let frame = Frame::new(data, 100, 100, 3, 0);
        let edges = bridge_edge_count(&frame, 50.0, 50.0, 40, 20, 35);
        assert_eq!(edges, 18 * 40);
        let t = LivenessThresholds::default();
        let reading = EyewearReading {
            bridge_ratio: 0.9,
            bridge_edges: edges,
        };
        assert!(!reading.glasses_absent(&t));
    }

    #[rstest]
    #[case::clear(0.9, 0, true)]
    #[case::compressed_bridge(0.5, 0, false)]
    #[case::frame_edges(0.9, 51, false)]
    #[case::edge_limit_inclusive(0.9, 50, true)]
    #[case::ratio_limit_exclusive(0.6, 0, false)]
    fn test_glasses_verdict(#[case] ratio: f64, #[case] edges: u32, #[case] absent: bool) {
        let reading = EyewearReading {
            bridge_ratio: ratio,
            bridge_edges: edges,
        };
        assert_eq!(reading.glasses_absent(&LivenessThresholds::default()), absent);
    }
}
