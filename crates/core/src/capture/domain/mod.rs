pub mod capture_result;
pub mod capture_sink;
pub mod capture_state;
pub mod confirmation_cue;
pub mod status;
