use std::time::Instant;

use crate::capture::domain::capture_result::CaptureResult;
use crate::capture::domain::capture_state::CaptureState;
use crate::capture::domain::confirmation_cue::ConfirmationCue;
use crate::capture::domain::status::VerificationStatus;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::liveness::domain::blink_detector::BlinkDetector;
use crate::liveness::domain::geometry_analyzer::{GeometryAnalyzer, LivenessSignals};
use crate::liveness::domain::stability_tracker::{StabilityError, StabilityTracker};
use crate::shared::frame::Frame;
use crate::shared::settings::Settings;

/// Wall time spent in each stage of one tick, for the tick logger.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageTimings {
    pub detect_ms: f64,
    pub analyze_ms: f64,
}

/// What one tick produced.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub status: VerificationStatus,
    /// Present on exactly one tick per session: the one that captured.
    pub capture: Option<CaptureResult>,
    /// `None` when no face was analysed this tick.
    pub signals: Option<LivenessSignals>,
    pub timings: StageTimings,
}

impl TickOutcome {
    fn status_only(status: VerificationStatus, timings: StageTimings) -> Self {
        Self {
            status,
            capture: None,
            signals: None,
            timings,
        }
    }
}

/// Per-session state machine: detect, analyze, debounce, wait for a blink,
/// capture once.
///
/// The controller owns all session state. Driving it is the caller's job:
/// call [`tick`](Self::tick) with each sampled frame and the tick time.
pub struct CaptureController {
    detector: Box<dyn FaceDetector>,
    analyzer: GeometryAnalyzer,
    stability: StabilityTracker,
    blink: BlinkDetector,
    cue: Option<Box<dyn ConfirmationCue>>,
    state: CaptureState,
    last_landmarks: Option<FaceLandmarks>,
    captured: Option<VerificationStatus>,
    fault: Option<String>,
}

impl CaptureController {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        analyzer: GeometryAnalyzer,
        stability: StabilityTracker,
        blink: BlinkDetector,
    ) -> Self {
        Self {
            detector,
            analyzer,
            stability,
            blink,
            cue: None,
            state: CaptureState::Searching,
            last_landmarks: None,
            captured: None,
            fault: None,
        }
    }

    pub fn from_settings(
        detector: Box<dyn FaceDetector>,
        settings: &Settings,
    ) -> Result<Self, StabilityError> {
        let stability = StabilityTracker::new(settings.stability_max, settings.stability_lock)?;
        let blink = BlinkDetector::new(settings.thresholds.blink_ear, settings.blink_refractory());
        Ok(Self::new(
            detector,
            GeometryAnalyzer::new(settings.thresholds.clone()),
            stability,
            blink,
        ))
    }

    pub fn with_cue(mut self, cue: Box<dyn ConfirmationCue>) -> Self {
        self.cue = Some(cue);
        self
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Landmarks from the most recent tick that found a face (for overlays).
    pub fn last_landmarks(&self) -> Option<&FaceLandmarks> {
        self.last_landmarks.as_ref()
    }

    pub fn stability(&self) -> &StabilityTracker {
        &self.stability
    }

    pub fn fault(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    /// Eyes closed under the stricter manual threshold, judged on the last
    /// analysed face.
    pub fn manual_blink(&self) -> bool {
        self.last_landmarks
            .as_ref()
            .map(|l| self.analyzer.manual_blink(l))
            .unwrap_or(false)
    }

    /// Advances the session by one frame.
    pub fn tick(&mut self, frame: &Frame, now: Instant) -> TickOutcome {
        if self.state.is_terminal() {
            return TickOutcome::status_only(self.terminal_status(), StageTimings::default());
        }

        let detect_start = Instant::now();
        let detection = self.detector.detect(frame);
        let mut timings = StageTimings {
            detect_ms: detect_start.elapsed().as_secs_f64() * 1000.0,
            analyze_ms: 0.0,
        };

        let landmarks = match detection {
            Ok(Some(landmarks)) => landmarks,
            Ok(None) => {
                self.stability.reset();
                self.last_landmarks = None;
                self.transition(CaptureState::Searching);
                return TickOutcome::status_only(VerificationStatus::searching(), timings);
            }
            Err(e) => {
                let reason = e.to_string();
                log::error!("Face detector failed on frame {}: {reason}", frame.index());
                self.stability.reset();
                self.last_landmarks = None;
                self.fault = Some(reason);
                self.transition(CaptureState::Faulted);
                return TickOutcome::status_only(self.terminal_status(), timings);
            }
        };

        let analyze_start = Instant::now();
        let signals = self.analyzer.analyze(&landmarks, frame);
        timings.analyze_ms = analyze_start.elapsed().as_secs_f64() * 1000.0;

        self.stability.update(signals.compound_ok());
        let blinked = self.blink.update(signals.ear, now);
        let locked = self.stability.is_locked();

        let next = if !signals.compound_ok() {
            CaptureState::Searching
        } else if locked && signals.glasses_absent {
            CaptureState::Armed
        } else {
            CaptureState::Stabilizing
        };
        log::debug!(
            "Frame {}: {next} (stability {}, ear {:.3}, blink {blinked})",
            frame.index(),
            self.stability.count(),
            signals.ear
        );

        if next == CaptureState::Armed && blinked {
            let capture =
                CaptureResult::new(frame.clone(), now, landmarks.clone(), signals.clone());
            let status = VerificationStatus::captured(
                &signals,
                self.stability.count(),
                self.stability.progress(),
            );
            self.last_landmarks = Some(landmarks);
            self.captured = Some(status.clone());
            self.transition(CaptureState::Captured);
            self.play_cue();
            return TickOutcome {
                status,
                capture: Some(capture),
                signals: Some(signals),
                timings,
            };
        }

        self.transition(next);
        self.last_landmarks = Some(landmarks);
        TickOutcome {
            status: VerificationStatus::from_signals(
                next,
                &signals,
                locked,
                self.stability.count(),
                self.stability.progress(),
            ),
            capture: None,
            signals: Some(signals),
            timings,
        }
    }

    /// Starts a new attempt. The blink refractory window carries over.
    pub fn reset(&mut self) {
        self.stability.reset();
        self.blink.reset();
        self.last_landmarks = None;
        self.captured = None;
        self.fault = None;
        self.transition(CaptureState::Searching);
    }

    fn terminal_status(&self) -> VerificationStatus {
        match (&self.captured, self.fault.as_deref()) {
            (_, Some(reason)) => VerificationStatus::faulted(reason),
            (Some(status), None) => status.clone(),
            (None, None) => VerificationStatus::faulted("session ended"),
        }
    }

    fn transition(&mut self, next: CaptureState) {
        if self.state != next {
            log::info!("Capture state: {} -> {next}", self.state);
            self.state = next;
        }
    }

    fn play_cue(&mut self) {
        if let Some(cue) = self.cue.as_mut() {
            if let Err(e) = cue.play() {
                log::warn!("Confirmation cue failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::capture::domain::status::{
        MSG_BLINK_NOW, MSG_CAPTURED, MSG_FIT_FACE, MSG_HOLD_STILL, MSG_REMOVE_GLASSES,
        MSG_SCANNING, MSG_TOO_DARK,
    };
    use crate::liveness::domain::test_faces::{frontal_face, with_bridge_ratio, with_ear};

    // ── fakes ──

    type Step = Result<Option<FaceLandmarks>, String>;

    /// Plays back a script, then repeats `fallback` forever.
    struct ScriptedDetector {
        script: VecDeque<Step>,
        fallback: Option<FaceLandmarks>,
        calls: Arc<AtomicUsize>,
    }

    impl FaceDetector for ScriptedDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Option<FaceLandmarks>, Box<dyn std::error::Error>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script.pop_front() {
                Some(Ok(result)) => Ok(result),
                Some(Err(message)) => Err(message.into()),
                None => Ok(self.fallback.clone()),
            }
        }
    }

    struct CountingCue {
        plays: Arc<AtomicUsize>,
        fail: bool,
    }

    impl ConfirmationCue for CountingCue {
        fn play(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            self.plays.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err("audio device busy".into())
            } else {
                Ok(())
            }
        }
    }

    // ── helpers ──

    fn open() -> FaceLandmarks {
        frontal_face(640, 480)
    }

    fn closed() -> FaceLandmarks {
        with_ear(&open(), 0.2)
    }

    fn controller(script: Vec<Step>) -> (CaptureController, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let detector = ScriptedDetector {
            script: script.into(),
            fallback: Some(open()),
            calls: Arc::clone(&calls),
        };
        let controller = CaptureController::from_settings(Box::new(detector), &Settings::default())
            .unwrap();
        (controller, calls)
    }

    struct Clock {
        base: Instant,
        tick: u32,
    }

    impl Clock {
        fn new() -> Self {
            Self {
                base: Instant::now(),
                tick: 0,
            }
        }

        /// Next tick time, 80 ms apart.
        fn next(&mut self) -> Instant {
            let t = self.base + Duration::from_millis(80) * self.tick;
            self.tick += 1;
            t
        }
    }

    fn gray(index: usize) -> Frame {
        Frame::filled(640, 480, [120, 120, 120], index)
    }

    fn run(c: &mut CaptureController, clock: &mut Clock, ticks: usize) -> Vec<TickOutcome> {
        (0..ticks).map(|i| c.tick(&gray(i), clock.next())).collect()
    }

    // ── stability ──

    #[test]
    fn test_three_good_ticks_arm_the_controller() {
        let (mut c, _) = controller(vec![]);
        let mut clock = Clock::new();

        let out = run(&mut c, &mut clock, 3);

        assert_eq!(out[0].status.state, CaptureState::Stabilizing);
        assert_eq!(out[0].status.message, MSG_HOLD_STILL);
        assert_eq!(out[1].status.state, CaptureState::Stabilizing);
        assert_eq!(out[2].status.state, CaptureState::Armed);
        assert_eq!(out[2].status.message, MSG_BLINK_NOW);
        assert!(out[2].status.blink_armed);
        assert_eq!(out[2].status.stability, 3);
        assert!(out.iter().all(|o| o.capture.is_none()));
    }

    #[test]
    fn test_face_loss_drops_to_searching_and_clears_stability() {
        let script = vec![Ok(Some(open())); 5]
            .into_iter()
            .chain([Ok(None)])
            .collect();
        let (mut c, _) = controller(script);
        let mut clock = Clock::new();

        let out = run(&mut c, &mut clock, 6);

        assert_eq!(out[4].status.state, CaptureState::Armed);
        assert_eq!(out[5].status.state, CaptureState::Searching);
        assert_eq!(out[5].status.message, MSG_SCANNING);
        assert_eq!(c.stability().count(), 0);
        assert!(c.last_landmarks().is_none());
        assert!(out[5].signals.is_none());
    }

    #[test]
    fn test_dark_frame_reports_lighting_and_resets_counter() {
        let (mut c, _) = controller(vec![]);
        let mut clock = Clock::new();
        run(&mut c, &mut clock, 2);

        let dark = Frame::filled(640, 480, [20, 20, 20], 2);
        let out = c.tick(&dark, clock.next());

        assert_eq!(out.status.state, CaptureState::Searching);
        assert_eq!(out.status.message, MSG_TOO_DARK);
        assert_eq!(out.status.stability, 0);
        assert!(c.last_landmarks().is_some());
    }

    #[test]
    fn test_off_center_face_asks_to_fit_frame() {
        let shifted = open().translated(300.0, 0.0);
        let (mut c, _) = controller(vec![Ok(Some(shifted))]);

        let out = c.tick(&gray(0), Instant::now());

        assert_eq!(out.status.state, CaptureState::Searching);
        assert_eq!(out.status.message, MSG_FIT_FACE);
    }

    #[test]
    fn test_glasses_hold_controller_in_stabilizing() {
        let glasses = with_bridge_ratio(&open(), 0.4);
        let (mut c, _) = controller(vec![Ok(Some(glasses)); 4]);
        let mut clock = Clock::new();

        let out = run(&mut c, &mut clock, 4);

        let last = out.last().unwrap();
        assert_eq!(last.status.state, CaptureState::Stabilizing);
        assert_eq!(last.status.message, MSG_REMOVE_GLASSES);
        assert_eq!(last.status.stability, 4);
        assert!(!last.status.no_glasses);
    }

    // ── capture ──

    #[test]
    fn test_blink_while_armed_captures_once() {
        let mut script: Vec<Step> = vec![Ok(Some(open())); 3];
        script.push(Ok(Some(closed())));
        let (mut c, calls) = controller(script);
        let mut clock = Clock::new();

        let out = run(&mut c, &mut clock, 8);

        let captures: Vec<_> = out.iter().filter_map(|o| o.capture.as_ref()).collect();
        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].frame().index(), 3);
        assert_eq!(out[3].status.state, CaptureState::Captured);
        assert_eq!(out[3].status.message, MSG_CAPTURED);
        assert!(out[4..]
            .iter()
            .all(|o| o.status.state == CaptureState::Captured));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_captured_status_keeps_passing_checks() {
        let mut script: Vec<Step> = vec![Ok(Some(open())); 3];
        script.push(Ok(Some(closed())));
        let (mut c, _) = controller(script);

        let out = run(&mut c, &mut Clock::new(), 5);

        for status in [&out[3].status, &out[4].status] {
            assert_eq!(status.state, CaptureState::Captured);
            assert_eq!(status.message, MSG_CAPTURED);
            assert!(status.face_in_position);
            assert!(status.good_lighting);
            assert!(status.no_glasses);
            assert!(status.framing_ok());
            assert!(!status.blink_armed);
            assert_eq!(status.stability, 4);
        }
    }

    #[test]
    fn test_blink_before_lock_does_not_capture() {
        let script = vec![Ok(Some(open())), Ok(Some(closed())), Ok(Some(open()))];
        let (mut c, _) = controller(script);
        let mut clock = Clock::new();

        let out = run(&mut c, &mut clock, 3);

        assert!(out.iter().all(|o| o.capture.is_none()));
        assert_eq!(c.state(), CaptureState::Armed);
    }

    #[test]
    fn test_cue_plays_on_capture() {
        let plays = Arc::new(AtomicUsize::new(0));
        let mut script: Vec<Step> = vec![Ok(Some(open())); 3];
        script.push(Ok(Some(closed())));
        let (c, _) = controller(script);
        let mut c = c.with_cue(Box::new(CountingCue {
            plays: Arc::clone(&plays),
            fail: false,
        }));

        let out = run(&mut c, &mut Clock::new(), 5);

        assert!(out[3].capture.is_some());
        assert_eq!(plays.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cue_failure_does_not_block_capture() {
        let plays = Arc::new(AtomicUsize::new(0));
        let mut script: Vec<Step> = vec![Ok(Some(open())); 3];
        script.push(Ok(Some(closed())));
        let (c, _) = controller(script);
        let mut c = c.with_cue(Box::new(CountingCue {
            plays: Arc::clone(&plays),
            fail: true,
        }));

        let out = run(&mut c, &mut Clock::new(), 4);

        assert!(out[3].capture.is_some());
        assert_eq!(c.state(), CaptureState::Captured);
        assert_eq!(plays.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reset_keeps_blink_refractory() {
        let mut script: Vec<Step> = vec![Ok(Some(open())); 3];
        script.push(Ok(Some(closed())));
        script.extend(vec![Ok(Some(open())); 3]);
        script.push(Ok(Some(closed())));
        let (mut c, _) = controller(script);
        let mut clock = Clock::new();

        let first = run(&mut c, &mut clock, 4);
        assert!(first[3].capture.is_some());

        c.reset();
        assert_eq!(c.state(), CaptureState::Searching);

        // Re-armed 240 ms after the first blink; a blink 320 ms after it is
        // still inside the refractory window.
        let second = run(&mut c, &mut clock, 4);
        assert_eq!(second[2].status.state, CaptureState::Armed);
        assert!(second[3].capture.is_none());
        assert_eq!(c.state(), CaptureState::Armed);
    }

    // ── faults ──

    #[test]
    fn test_detector_failure_is_sticky_until_reset() {
        let (mut c, calls) = controller(vec![Err("model not loaded".into())]);
        let mut clock = Clock::new();

        let out = run(&mut c, &mut clock, 3);

        assert!(out
            .iter()
            .all(|o| o.status.state == CaptureState::Faulted));
        assert!(out[2].status.message.contains("model not loaded"));
        assert_ne!(out[0].status.message, MSG_SCANNING);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(c.fault(), Some("model not loaded"));

        c.reset();
        let after = c.tick(&gray(3), clock.next());
        assert_eq!(after.status.state, CaptureState::Stabilizing);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(c.fault().is_none());
    }

    #[test]
    fn test_manual_blink_uses_last_face() {
        let (mut c, _) = controller(vec![Ok(Some(with_ear(&open(), 0.1)))]);
        assert!(!c.manual_blink());

        c.tick(&gray(0), Instant::now());

        assert!(c.manual_blink());
    }
}
