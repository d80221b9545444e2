use crate::shared::frame::Frame;

/// Result of asking a source for its current frame.
#[derive(Debug)]
pub enum FramePoll {
    Frame(Frame),
    /// The source is open but has nothing usable yet (camera warming up).
    NotReady,
    /// No more frames will arrive.
    Ended,
}

/// A live (or replayed) camera feed, polled once per tick.
///
/// The sampler only reads from the source; frames are owned by the caller
/// once returned.
pub trait FrameSource: Send {
    fn poll_frame(&mut self) -> Result<FramePoll, Box<dyn std::error::Error>>;

    /// Releases any resources held by the source.
    fn close(&mut self) {}
}
