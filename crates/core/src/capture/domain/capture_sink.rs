use crate::capture::domain::capture_result::CaptureResult;

/// Receives the captured still. Persistence or transmission is entirely the
/// sink's concern; the pipeline never does I/O on the capture itself.
pub trait CaptureSink: Send {
    fn deliver(&mut self, capture: &CaptureResult) -> Result<(), Box<dyn std::error::Error>>;
}
