use std::io::Write;

use crate::capture::domain::confirmation_cue::ConfirmationCue;

/// Rings the terminal bell (BEL) on the given writer, stderr by default.
pub struct TerminalBellCue<W: Write + Send = std::io::Stderr> {
    out: W,
}

impl TerminalBellCue {
    pub fn new() -> Self {
        Self {
            out: std::io::stderr(),
        }
    }
}

impl Default for TerminalBellCue {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> TerminalBellCue<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> ConfirmationCue for TerminalBellCue<W> {
    fn play(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.out.write_all(b"\x07")?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_play_writes_bell() {
        let mut cue = TerminalBellCue::with_writer(Vec::new());
        cue.play().unwrap();
        assert_eq!(cue.out, vec![0x07]);
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut cue = TerminalBellCue::with_writer(BrokenPipe);
        assert!(cue.play().is_err());
    }
}
