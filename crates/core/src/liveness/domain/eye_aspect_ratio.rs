//! Eye aspect ratio (EAR): lid opening relative to eye width.
//!
//! `EAR = (|p1 - p5| + |p2 - p4|) / (2 * |p0 - p3|)` for the six contour
//! points of one eye. An open eye sits around 0.3; a closed one drops
//! toward 0.1.

use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::geometry::Point;

/// EAR of one eye. NaN or infinite when the corners coincide.
pub fn eye_aspect_ratio(eye: &[Point; 6]) -> f64 {
    let vertical = eye[1].distance(&eye[5]) + eye[2].distance(&eye[4]);
    let horizontal = eye[0].distance(&eye[3]);
    vertical / (2.0 * horizontal)
}

/// Mean EAR of both eyes.
pub fn mean_eye_aspect_ratio(landmarks: &FaceLandmarks) -> f64 {
    (eye_aspect_ratio(&landmarks.left_eye) + eye_aspect_ratio(&landmarks.right_eye)) / 2.0
}

/// Whether an EAR reading counts as a closed eye. NaN never does.
pub fn is_closed(ear: f64, threshold: f64) -> bool {
    ear < threshold
}
