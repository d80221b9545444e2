use std::path::{Path, PathBuf};

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{FramePoll, FrameSource};

/// Replays the image files of a directory, in file-name order, as a feed.
///
/// Useful for recorded sessions: one still per tick, ended after the last.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    position: usize,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_image(p))
            .collect();
        if paths.is_empty() {
            return Err(format!("No images found in {}", dir.display()).into());
        }
        paths.sort();
        log::info!("Replaying {} images from {}", paths.len(), dir.display());
        Ok(Self::from_paths(paths))
    }

    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self { paths, position: 0 }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn poll_frame(&mut self) -> Result<FramePoll, Box<dyn std::error::Error>> {
        let Some(path) = self.paths.get(self.position) else {
            return Ok(FramePoll::Ended);
        };
        let index = self.position;
        self.position += 1;

        let img = image::open(path)?.to_rgb8();
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Ok(FramePoll::NotReady);
        }
        Ok(FramePoll::Frame(Frame::new(
            img.into_raw(),
            width,
            height,
            3,
            index,
        )))
    }

    fn close(&mut self) {
        self.position = self.paths.len();
    }
}
