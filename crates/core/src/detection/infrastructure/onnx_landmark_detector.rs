/// Two-stage face landmark detector using ONNX Runtime via `ort`.
///
/// Stage 1 finds the most confident face box with a YOLO-style detector;
/// stage 2 crops a square around it and regresses the 68 landmark points.
use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_landmarks::{FaceLandmarks, POINT_COUNT};
use crate::shared::frame::Frame;
use crate::shared::geometry::{BoundingBox, Point};

use super::onnx_session::open_session;

/// Fallback face model input resolution when the model doesn't specify dimensions.
const DEFAULT_FACE_INPUT_SIZE: u32 = 640;

/// Fallback landmark model input resolution.
const DEFAULT_LANDMARK_INPUT_SIZE: u32 = 112;

/// Default confidence threshold for face detection.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Extra context around the face box fed to the landmark model.
const CROP_MARGIN: f64 = 0.1;

pub struct OnnxLandmarkDetector {
    face_session: ort::session::Session,
    landmark_session: ort::session::Session,
    face_input_size: u32,
    landmark_input_size: u32,
    confidence: f64,
}

impl OnnxLandmarkDetector {
    /// Load both models. Input resolutions are read from the models' NCHW
    /// input shapes, falling back to defaults when dynamic.
    pub fn new(
        face_model: &Path,
        landmark_model: &Path,
        confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let face_session = open_session(face_model)?;
        let landmark_session = open_session(landmark_model)?;

        let face_input_size = model_input_size(&face_session).unwrap_or(DEFAULT_FACE_INPUT_SIZE);
        let landmark_input_size =
            model_input_size(&landmark_session).unwrap_or(DEFAULT_LANDMARK_INPUT_SIZE);
        log::info!(
            "Loaded landmark models (face input {face_input_size}, landmark input {landmark_input_size})"
        );

        Ok(Self {
            face_session,
            landmark_session,
            face_input_size,
            landmark_input_size,
            confidence,
        })
    }

    fn find_face(&mut self, frame: &Frame) -> Result<Option<BoundingBox>, Box<dyn std::error::Error>> {
        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.face_input_size);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.face_session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Face model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let Some(corners) = best_detection(data, &shape, self.confidence)? else {
            return Ok(None);
        };
        let unletterbox = |v: f64, pad: u32| (v - pad as f64) / scale;
        Ok(Some(BoundingBox::from_corners([
            unletterbox(corners[0], pad_x),
            unletterbox(corners[1], pad_y),
            unletterbox(corners[2], pad_x),
            unletterbox(corners[3], pad_y),
        ])))
    }

    fn regress_points(
        &mut self,
        frame: &Frame,
        crop: &BoundingBox,
    ) -> Result<Vec<Point>, Box<dyn std::error::Error>> {
        let input_tensor = crop_square(frame, crop, self.landmark_input_size);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.landmark_session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Landmark model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;
        map_points(data, crop)
    }
}

impl FaceDetector for OnnxLandmarkDetector {
    fn detect(
        &mut self,
        frame: &Frame,
    ) -> Result<Option<FaceLandmarks>, Box<dyn std::error::Error>> {
        if !frame.is_ready() {
            return Ok(None);
        }
        let Some(face_box) = self.find_face(frame)? else {
            return Ok(None);
        };
        let crop = face_box.squared(CROP_MARGIN);
        let points = self.regress_points(frame, &crop)?;
        Ok(Some(FaceLandmarks::from_points68(&points, face_box)?))
    }
}

/// Height of an NCHW `[1, 3, H, W]` input, if the model declares it.
fn model_input_size(session: &ort::session::Session) -> Option<u32> {
    session.inputs().first().and_then(|input| {
        if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
            if shape.len() >= 4 && shape[2] > 0 {
                Some(shape[2] as u32)
            } else {
                None
            }
        } else {
            None
        }
    })
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize a frame to `target_size` × `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = (fw * scale).round() as u32;
    let new_h = (fh * scale).round() as u32;
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let colors = frame.color_channels().min(3);

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c.min(colors - 1)]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

/// Samples a square crop (nearest neighbour) into a `[1, 3, size, size]`
/// tensor in `[0, 1]`. Pixels outside the frame are black.
fn crop_square(frame: &Frame, crop: &BoundingBox, size: u32) -> ndarray::Array4<f32> {
    let n = size as usize;
    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, n, n));
    let src = frame.as_ndarray();
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let colors = frame.color_channels().min(3);
    let step_x = crop.width / size as f64;
    let step_y = crop.height / size as f64;

    for y in 0..n {
        let sy = (crop.y + (y as f64 + 0.5) * step_y).floor();
        if sy < 0.0 || sy >= fh {
            continue;
        }
        for x in 0..n {
            let sx = (crop.x + (x as f64 + 0.5) * step_x).floor();
            if sx < 0.0 || sx >= fw {
                continue;
            }
            for c in 0..3 {
                tensor[[0, c, y, x]] =
                    src[[sy as usize, sx as usize, c.min(colors - 1)]] as f32 / 255.0;
            }
        }
    }
    tensor
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

/// Highest-confidence `[x1, y1, x2, y2]` box (letterbox coordinates) above
/// `confidence`, from a `[1, features, N]` or `[1, N, features]` output
/// whose rows start with `cx, cy, w, h, conf`.
fn best_detection(
    data: &[f32],
    shape: &[usize],
    confidence: f64,
) -> Result<Option<[f64; 4]>, Box<dyn std::error::Error>> {
    if shape.len() != 3 {
        return Err(format!("Unexpected face model output shape: {shape:?}").into());
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats < 5 {
        return Err(format!("Face model rows too short: {num_feats} values").into());
    }
    if data.len() < num_dets * num_feats {
        return Err("Face model output shorter than its shape".into());
    }
    let value = |det: usize, feat: usize| -> f64 {
        let i = if transposed {
            feat * num_dets + det
        } else {
            det * num_feats + feat
        };
        data[i] as f64
    };

    let best = (0..num_dets)
        .filter(|&i| value(i, 4) >= confidence)
        .max_by(|&a, &b| {
            value(a, 4)
                .partial_cmp(&value(b, 4))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    Ok(best.map(|i| {
        let (cx, cy, w, h) = (value(i, 0), value(i, 1), value(i, 2), value(i, 3));
        [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0]
    }))
}

/// Maps 136 crop-normalised values (`x0, y0, x1, y1, ...`) to frame points.
fn map_points(data: &[f32], crop: &BoundingBox) -> Result<Vec<Point>, Box<dyn std::error::Error>> {
    if data.len() < POINT_COUNT * 2 {
        return Err(format!(
            "Landmark model produced {} values, expected {}",
            data.len(),
            POINT_COUNT * 2
        )
        .into());
    }
    Ok(data[..POINT_COUNT * 2]
        .chunks_exact(2)
        .map(|xy| {
            Point::new(
                crop.x + xy[0] as f64 * crop.width,
                crop.y + xy[1] as f64 * crop.height,
            )
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
