use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::capture::domain::capture_result::CaptureResult;
use crate::capture::domain::capture_sink::CaptureSink;
use crate::capture::domain::status::VerificationStatus;
use crate::pipeline::capture_controller::{CaptureController, TickOutcome};
use crate::pipeline::tick_logger::{NullTickLogger, TickLogger};
use crate::shared::constants::{DEFAULT_RETRY_DELAY_MS, DEFAULT_TICK_INTERVAL_MS};
use crate::video::domain::frame_source::{FramePoll, FrameSource};

/// Why [`FrameSampler::run`] returned.
#[derive(Debug)]
pub enum SamplerExit {
    Captured(CaptureResult),
    Cancelled,
    SourceExhausted,
}

/// Requests cancellation of a running sampler.
///
/// Dropping every clone of the handle cancels the run as well.
#[derive(Clone)]
pub struct SamplerHandle {
    stop: Sender<()>,
}

impl SamplerHandle {
    pub fn stop(&self) {
        let _ = self.stop.try_send(());
    }
}

/// Creates a handle and the receiver a sampler waits on.
pub fn stop_channel() -> (SamplerHandle, Receiver<()>) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    (SamplerHandle { stop: tx }, rx)
}

/// Polls a frame source on a fixed cadence and feeds the capture controller.
///
/// One tick is in flight at a time: the next wait starts only after the
/// status callback for the previous tick has returned.
pub struct FrameSampler {
    source: Box<dyn FrameSource>,
    controller: CaptureController,
    sink: Option<Box<dyn CaptureSink>>,
    logger: Box<dyn TickLogger>,
    interval: Duration,
    retry_delay: Duration,
}

impl FrameSampler {
    pub fn new(source: Box<dyn FrameSource>, controller: CaptureController) -> Self {
        Self {
            source,
            controller,
            sink: None,
            logger: Box::new(NullTickLogger),
            interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn CaptureSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn TickLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn controller(&self) -> &CaptureController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut CaptureController {
        &mut self.controller
    }

    /// Runs until a capture, cancellation or the end of the source.
    ///
    /// `on_status` receives one status per tick; returning `false` stops
    /// the run. Source and sink errors are propagated.
    pub fn run<F>(
        &mut self,
        stop: &Receiver<()>,
        mut on_status: F,
    ) -> Result<SamplerExit, Box<dyn std::error::Error>>
    where
        F: FnMut(&VerificationStatus) -> bool,
    {
        let result = self.run_loop(stop, &mut on_status);
        self.source.close();
        self.logger.summary();
        result
    }

    fn run_loop(
        &mut self,
        stop: &Receiver<()>,
        on_status: &mut dyn FnMut(&VerificationStatus) -> bool,
    ) -> Result<SamplerExit, Box<dyn std::error::Error>> {
        loop {
            if stop_requested(stop) {
                self.logger.info("Sampling cancelled");
                return Ok(SamplerExit::Cancelled);
            }

            let frame = match self.source.poll_frame()? {
                FramePoll::Frame(frame) if frame.is_ready() => frame,
                FramePoll::Frame(_) | FramePoll::NotReady => {
                    log::debug!("Frame not ready, retrying in {:?}", self.retry_delay);
                    if wait_or_stop(stop, self.retry_delay) {
                        return Ok(SamplerExit::Cancelled);
                    }
                    continue;
                }
                FramePoll::Ended => {
                    self.logger.info("Frame source exhausted");
                    return Ok(SamplerExit::SourceExhausted);
                }
            };

            let outcome = self.controller.tick(&frame, Instant::now());
            self.record(frame.index(), &outcome);

            let keep_going = on_status(&outcome.status);

            if let Some(capture) = outcome.capture {
                if let Some(sink) = self.sink.as_mut() {
                    sink.deliver(&capture)?;
                }
                self.logger
                    .info(&format!("Captured frame {}", capture.frame().index()));
                return Ok(SamplerExit::Captured(capture));
            }
            if !keep_going {
                return Ok(SamplerExit::Cancelled);
            }
            if wait_or_stop(stop, self.interval) {
                return Ok(SamplerExit::Cancelled);
            }
        }
    }

    fn record(&mut self, index: usize, outcome: &TickOutcome) {
        self.logger.tick(index);
        self.logger.timing("detect", outcome.timings.detect_ms);
        if let Some(signals) = &outcome.signals {
            self.logger.timing("analyze", outcome.timings.analyze_ms);
            self.logger.metric("ear", signals.ear);
            self.logger.metric("brightness", signals.brightness);
        }
        self.logger
            .metric("stability", outcome.status.stability as f64);
    }
}

/// A pending stop message or a disconnected channel both mean stop.
fn stop_requested(stop: &Receiver<()>) -> bool {
    !matches!(stop.try_recv(), Err(TryRecvError::Empty))
}

/// Sleeps for `delay` unless a stop arrives first. Returns true on stop.
fn wait_or_stop(stop: &Receiver<()>, delay: Duration) -> bool {
    !matches!(stop.recv_timeout(delay), Err(RecvTimeoutError::Timeout))
}
