/// Non-essential feedback played when a capture fires (e.g. a shutter
/// sound). Callers log and discard any error.
pub trait ConfirmationCue: Send {
    fn play(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
