pub mod image_file_capture_sink;
pub mod terminal_bell_cue;
