use std::io::Cursor;
use std::time::Instant;

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::liveness::domain::geometry_analyzer::LivenessSignals;
use crate::shared::frame::Frame;

pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// The one frame a session emits, with what the pipeline saw in it.
#[derive(Clone, Debug)]
pub struct CaptureResult {
    frame: Frame,
    captured_at: Instant,
    landmarks: FaceLandmarks,
    signals: LivenessSignals,
}

impl CaptureResult {
    pub fn new(
        frame: Frame,
        captured_at: Instant,
        landmarks: FaceLandmarks,
        signals: LivenessSignals,
    ) -> Self {
        Self {
            frame,
            captured_at,
            landmarks,
            signals,
        }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    pub fn landmarks(&self) -> &FaceLandmarks {
        &self.landmarks
    }

    pub fn signals(&self) -> &LivenessSignals {
        &self.signals
    }

    pub fn to_rgb_image(&self) -> Result<RgbImage, Box<dyn std::error::Error>> {
        to_rgb_image(&self.frame)
    }

    /// Encodes the frame as a JPEG still.
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        let img = self.to_rgb_image()?;
        let mut buf = Cursor::new(Vec::new());
        img.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)))?;
        Ok(buf.into_inner())
    }
}

/// Packs a frame into an RGB image, dropping alpha and expanding gray.
fn to_rgb_image(frame: &Frame) -> Result<RgbImage, Box<dyn std::error::Error>> {
    let data = match frame.channels() {
        3 => frame.data().to_vec(),
        4 => frame
            .data()
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect(),
        1 => frame.data().iter().flat_map(|&v| [v, v, v]).collect(),
        c => return Err(format!("Unsupported channel count for capture: {c}").into()),
    };
    RgbImage::from_raw(frame.width(), frame.height(), data)
        .ok_or_else(|| "Failed to create image from frame data".into())
}
