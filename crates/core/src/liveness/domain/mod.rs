pub mod blink_detector;
pub mod eye_aspect_ratio;
pub mod eyewear;
pub mod framing;
pub mod geometry_analyzer;
pub mod lighting;
pub mod stability_tracker;
#[cfg(test)]
pub(crate) mod test_faces;
pub mod thresholds;
