pub mod capture_controller;
pub mod frame_sampler;
pub mod tick_logger;
