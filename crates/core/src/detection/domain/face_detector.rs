use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::frame::Frame;

/// Domain interface for the face/landmark detection collaborator.
///
/// `Ok(None)` means the frame was analysed and holds no face; it is not an
/// error. `Err` means the detector itself cannot analyse frames (model load
/// or inference failure).
///
/// Implementations may be stateful (e.g., replaying fixtures), hence
/// `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Option<FaceLandmarks>, Box<dyn std::error::Error>>;
}
