use std::path::{Path, PathBuf};

use crate::capture::domain::capture_result::{CaptureResult, DEFAULT_JPEG_QUALITY};
use crate::capture::domain::capture_sink::CaptureSink;

/// Writes the captured frame to an image file using the `image` crate.
///
/// `.jpg`/`.jpeg` paths are encoded at the configured quality; any other
/// extension is saved in the format it names.
pub struct ImageFileCaptureSink {
    path: PathBuf,
    quality: u8,
}

impl ImageFileCaptureSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_jpeg(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg"))
            .unwrap_or(false)
    }
}

impl CaptureSink for ImageFileCaptureSink {
    fn deliver(&mut self, capture: &CaptureResult) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        if self.is_jpeg() {
            std::fs::write(&self.path, capture.encode_jpeg(self.quality)?)?;
        } else {
            capture.to_rgb_image()?.save(&self.path)?;
        }
        log::info!("Capture written to {}", self.path.display());
        Ok(())
    }
}
