//! 68-point facial landmark record.
//!
//! Regions follow the iBUG 300-W ordering used by most 68-point models:
//! jaw 0–16, brows 17–26, nose 27–35, eyes 36–47, mouth 48–67. Only the
//! regions the liveness checks read are kept.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::geometry::{BoundingBox, Point};

pub const POINT_COUNT: usize = 68;

const JAW: std::ops::Range<usize> = 0..17;
const NOSE: std::ops::Range<usize> = 27..36;
const LEFT_EYE: std::ops::Range<usize> = 36..42;
const RIGHT_EYE: std::ops::Range<usize> = 42..48;

#[derive(Error, Debug, PartialEq)]
pub enum LandmarkError {
    #[error("expected 68 landmark points, got {0}")]
    PointCount(usize),
}

/// Landmarks and face box for one detected face, in frame coordinates.
///
/// Eye contours run p0..p5 around the eye starting at the image-left
/// corner: p0 and p3 are the corners, p1/p2 the upper lid, p4/p5 the
/// lower lid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmarks {
    pub left_eye: [Point; 6],
    pub right_eye: [Point; 6],
    /// `nose[0]` is the top of the bridge, between the eyes.
    pub nose: [Point; 9],
    pub jaw: [Point; 17],
    pub bounding_box: BoundingBox,
}

impl FaceLandmarks {
    pub fn from_points68(points: &[Point], bounding_box: BoundingBox) -> Result<Self, LandmarkError> {
        if points.len() != POINT_COUNT {
            return Err(LandmarkError::PointCount(points.len()));
        }
        Ok(Self {
            left_eye: copy_region(&points[LEFT_EYE]),
            right_eye: copy_region(&points[RIGHT_EYE]),
            nose: copy_region(&points[NOSE]),
            jaw: copy_region(&points[JAW]),
            bounding_box,
        })
    }

    pub fn bridge(&self) -> Point {
        self.nose[0]
    }

    /// All kept points, for overlay drawing.
    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.jaw
            .iter()
            .chain(self.nose.iter())
            .chain(self.left_eye.iter())
            .chain(self.right_eye.iter())
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        let shift = |p: Point| p.translated(dx, dy);
        Self {
            left_eye: self.left_eye.map(shift),
            right_eye: self.right_eye.map(shift),
            nose: self.nose.map(shift),
            jaw: self.jaw.map(shift),
            bounding_box: BoundingBox {
                x: self.bounding_box.x + dx,
                y: self.bounding_box.y + dy,
                ..self.bounding_box
            },
        }
    }
}

fn copy_region<const N: usize>(src: &[Point]) -> [Point; N] {
    let mut out = [Point::default(); N];
    out.copy_from_slice(src);
    out
}
