use std::collections::HashMap;
use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::frame::Frame;

/// Replays pre-recorded landmark records by frame index.
///
/// Frames missing from the fixture report "no face". The JSON form is an
/// object keyed by frame index whose values are a landmark record or `null`.
pub struct FixtureFaceDetector {
    fixtures: HashMap<usize, Option<FaceLandmarks>>,
    calls: usize,
}

impl FixtureFaceDetector {
    pub fn new(fixtures: HashMap<usize, Option<FaceLandmarks>>) -> Self {
        Self { fixtures, calls: 0 }
    }

    /// Same record for every frame.
    pub fn constant(landmarks: Option<FaceLandmarks>, frames: usize) -> Self {
        Self::new((0..frames).map(|i| (i, landmarks.clone())).collect())
    }

    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let fixtures: HashMap<usize, Option<FaceLandmarks>> = serde_json::from_str(json)?;
        Ok(Self::new(fixtures))
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)?;
        let detector = Self::from_json(&json)?;
        log::info!(
            "Loaded {} landmark fixtures from {}",
            detector.fixtures.len(),
            path.display()
        );
        Ok(detector)
    }

    /// Number of `detect` calls so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl FaceDetector for FixtureFaceDetector {
    fn detect(
        &mut self,
        frame: &Frame,
    ) -> Result<Option<FaceLandmarks>, Box<dyn std::error::Error>> {
        self.calls += 1;
        Ok(self.fixtures.get(&frame.index()).cloned().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liveness::domain::test_faces::frontal_face;

    fn frame(index: usize) -> Frame {
        Frame::filled(640, 480, [120, 120, 120], index)
    }

    #[test]
    fn test_returns_fixture_for_known_frame() {
        let face = frontal_face(640, 480);
        let mut detector = FixtureFaceDetector::new(HashMap::from([(0, Some(face.clone()))]));

        assert_eq!(detector.detect(&frame(0)).unwrap(), Some(face));
    }

    #[test]
    fn test_unknown_and_null_frames_have_no_face() {
        let mut detector = FixtureFaceDetector::new(HashMap::from([(1, None)]));

        assert_eq!(detector.detect(&frame(1)).unwrap(), None);
        assert_eq!(detector.detect(&frame(99)).unwrap(), None);
        assert_eq!(detector.calls(), 2);
    }

    #[test]
    fn test_json_roundtrip_through_file() {
        let face = frontal_face(640, 480);
        let fixtures = HashMap::from([(0, Some(face.clone())), (1, None)]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("landmarks.json");
        std::fs::write(&path, serde_json::to_string(&fixtures).unwrap()).unwrap();

        let mut detector = FixtureFaceDetector::load(&path).unwrap();

        assert_eq!(detector.detect(&frame(0)).unwrap(), Some(face));
        assert_eq!(detector.detect(&frame(1)).unwrap(), None);
    }

    #[test]
    fn test_malformed_json_errors() {
        assert!(FixtureFaceDetector::from_json("{\"0\": {\"jaw\": []}}").is_err());
    }

    #[test]
    fn test_constant_covers_requested_frames() {
        let mut detector = FixtureFaceDetector::constant(Some(frontal_face(640, 480)), 3);
        assert!(detector.detect(&frame(2)).unwrap().is_some());
        assert!(detector.detect(&frame(3)).unwrap().is_none());
    }
}
