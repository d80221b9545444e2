pub mod fixture_face_detector;
pub mod model_resolver;
pub mod onnx_landmark_detector;
pub mod onnx_session;
