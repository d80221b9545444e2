/// Default model file names, looked up in the model cache directory.
pub const FACE_MODEL_NAME: &str = "face_detector.onnx";
pub const LANDMARK_MODEL_NAME: &str = "face_landmarks_68.onnx";

/// Polling cadence of the frame sampler.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 80;

/// Delay before retrying when the camera has not produced a usable frame.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 100;

/// Minimum time between two recognized blinks.
pub const DEFAULT_BLINK_REFRACTORY_MS: u64 = 800;

/// Stability counter ceiling and lock threshold.
pub const DEFAULT_STABILITY_MAX: u32 = 10;
pub const DEFAULT_STABILITY_LOCK: u32 = 3;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Application directory name under the platform config and cache dirs.
pub const APP_DIR_NAME: &str = "LiveGate";
