//! Synthetic landmark fixtures shared by the liveness and pipeline tests.

use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::geometry::{BoundingBox, Point};

pub const OPEN_EAR: f64 = 0.35;

/// Six-point eye contour starting at `x0`, `width` wide, with the given EAR.
pub fn eye(x0: f64, y: f64, width: f64, ear: f64) -> [Point; 6] {
    let h = ear * width;
    [
        Point::new(x0, y),
        Point::new(x0 + width / 3.0, y - h / 2.0),
        Point::new(x0 + 2.0 * width / 3.0, y - h / 2.0),
        Point::new(x0 + width, y),
        Point::new(x0 + 2.0 * width / 3.0, y + h / 2.0),
        Point::new(x0 + width / 3.0, y + h / 2.0),
    ]
}

/// A frontal, level, open-eyed face centred in a `width` x `height` frame.
///
/// Box height is half the frame height, eyes are 30 units wide with a 27
/// unit bridge gap (ratio 0.9), the jaw is symmetric about the nose.
pub fn frontal_face(width: u32, height: u32) -> FaceLandmarks {
    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;
    let u = height as f64 / 480.0;
    let eye_y = cy - 40.0 * u;
    let eye_w = 30.0 * u;

    let nose = std::array::from_fn(|i| Point::new(cx, eye_y + 10.0 * u * i as f64));
    let jaw = std::array::from_fn(|i| {
        let theta = std::f64::consts::PI * i as f64 / 16.0;
        Point::new(cx - 110.0 * u * theta.cos(), eye_y + 150.0 * u * theta.sin())
    });
    let side = height as f64 / 2.0;

    FaceLandmarks {
        left_eye: eye(cx - 43.5 * u, eye_y, eye_w, OPEN_EAR),
        right_eye: eye(cx + 13.5 * u, eye_y, eye_w, OPEN_EAR),
        nose,
        jaw,
        bounding_box: BoundingBox::new(cx - side / 2.0, cy - side / 2.0, side, side),
    }
}

/// Same face with both eyes set to the given EAR.
pub fn with_ear(face: &FaceLandmarks, ear: f64) -> FaceLandmarks {
    let rebuild = |e: &[Point; 6]| eye(e[0].x, e[0].y, e[3].x - e[0].x, ear);
    FaceLandmarks {
        left_eye: rebuild(&face.left_eye),
        right_eye: rebuild(&face.right_eye),
        ..face.clone()
    }
}

/// Same face with the right eye moved so the bridge gap is `ratio` eye widths.
pub fn with_bridge_ratio(face: &FaceLandmarks, ratio: f64) -> FaceLandmarks {
    let eye_w = face.left_eye[3].x - face.left_eye[0].x;
    let dx = face.left_eye[3].x + ratio * eye_w - face.right_eye[0].x;
    FaceLandmarks {
        right_eye: face.right_eye.map(|p| p.translated(dx, 0.0)),
        ..face.clone()
    }
}
