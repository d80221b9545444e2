use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;

use livegate_core::capture::domain::status::VerificationStatus;
use livegate_core::capture::infrastructure::image_file_capture_sink::ImageFileCaptureSink;
use livegate_core::capture::infrastructure::terminal_bell_cue::TerminalBellCue;
use livegate_core::detection::domain::face_detector::FaceDetector;
use livegate_core::detection::infrastructure::fixture_face_detector::FixtureFaceDetector;
use livegate_core::detection::infrastructure::model_resolver;
use livegate_core::detection::infrastructure::onnx_landmark_detector::OnnxLandmarkDetector;
use livegate_core::pipeline::capture_controller::CaptureController;
use livegate_core::pipeline::frame_sampler::{stop_channel, FrameSampler, SamplerExit};
use livegate_core::pipeline::tick_logger::LogTickLogger;
use livegate_core::shared::constants::{FACE_MODEL_NAME, LANDMARK_MODEL_NAME};
use livegate_core::shared::settings::Settings;
use livegate_core::video::domain::frame_source::FrameSource;
use livegate_core::video::infrastructure::ffmpeg_frame_source::FfmpegFrameSource;
use livegate_core::video::infrastructure::image_sequence_source::ImageSequenceSource;

/// Unattended face liveness check: captures one portrait after a blink.
#[derive(Parser)]
#[command(name = "livegate")]
struct Cli {
    /// Camera device (with --format), video file, or directory of images.
    input: String,

    /// Where to write the captured portrait (.jpg, .png, ...).
    #[arg(short, long, default_value = "portrait.jpg")]
    output: PathBuf,

    /// ffmpeg input format for capture devices (e.g. v4l2, avfoundation, dshow).
    #[arg(long)]
    format: Option<String>,

    /// Capture size requested from the device, e.g. 640x480.
    #[arg(long)]
    video_size: Option<String>,

    /// Replay landmarks from a JSON fixture instead of running the models.
    #[arg(long, conflicts_with_all = ["face_model", "landmark_model"])]
    landmarks: Option<PathBuf>,

    /// Face detector ONNX model (defaults to the model cache).
    #[arg(long)]
    face_model: Option<PathBuf>,

    /// 68-point landmark ONNX model (defaults to the model cache).
    #[arg(long)]
    landmark_model: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    confidence: f64,

    /// Settings file (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Milliseconds between ticks (overrides settings).
    #[arg(long)]
    interval_ms: Option<u64>,

    /// JPEG quality (1-100).
    #[arg(long, default_value = "92")]
    quality: u8,

    /// Give up after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Do not ring the terminal bell on capture.
    #[arg(long)]
    no_cue: bool,

    /// Print every status as a JSON line instead of text.
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::load_default(),
    };
    if let Some(ms) = cli.interval_ms {
        settings.tick_interval_ms = ms;
    }
    if cli.no_cue {
        settings.cue_enabled = false;
    }
    settings.validate()?;

    let source = open_source(&cli)?;
    let detector = build_detector(&cli)?;

    let mut controller = CaptureController::from_settings(detector, &settings)?;
    if settings.cue_enabled {
        controller = controller.with_cue(Box::new(TerminalBellCue::new()));
    }

    let sink = ImageFileCaptureSink::new(&cli.output).with_quality(cli.quality);
    let mut sampler = FrameSampler::new(source, controller)
        .with_interval(settings.tick_interval())
        .with_retry_delay(settings.retry_delay())
        .with_sink(Box::new(sink))
        .with_logger(Box::new(LogTickLogger::default()));

    let (handle, stop) = stop_channel();
    if let Some(secs) = cli.timeout_secs {
        let timer = handle.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs(secs));
            log::info!("Timed out after {secs}s");
            timer.stop();
        });
    }

    let json = cli.json;
    let mut last: Option<VerificationStatus> = None;
    let exit = sampler.run(&stop, |status| {
        if json {
            match serde_json::to_string(status) {
                Ok(line) => println!("{line}"),
                Err(e) => log::warn!("Failed to encode status: {e}"),
            }
        } else if last.as_ref() != Some(status) {
            print_status(status);
        }
        last = Some(status.clone());
        true
    })?;
    drop(handle);

    match exit {
        SamplerExit::Captured(capture) => {
            eprintln!(
                "Portrait captured from frame {} and saved to {}",
                capture.frame().index(),
                cli.output.display()
            );
            Ok(())
        }
        SamplerExit::Cancelled => Err("Cancelled before a capture".into()),
        SamplerExit::SourceExhausted => Err("Video source ended before a capture".into()),
    }
}

fn print_status(status: &VerificationStatus) {
    println!(
        "[{:<11}] {}  (stability {}, framing {})",
        status.state.to_string(),
        status.message,
        status.stability,
        if status.framing_ok() { "ok" } else { "--" }
    );
}

fn open_source(cli: &Cli) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
    let input = Path::new(&cli.input);
    if let Some(format) = &cli.format {
        let mut options = Vec::new();
        if let Some(size) = &cli.video_size {
            options.push(("video_size", size.as_str()));
        }
        return Ok(Box::new(FfmpegFrameSource::open_device(
            &cli.input, format, &options,
        )?));
    }
    if input.is_dir() {
        return Ok(Box::new(ImageSequenceSource::open(input)?));
    }
    Ok(Box::new(FfmpegFrameSource::open_file(input)?))
}

fn build_detector(cli: &Cli) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    if let Some(path) = &cli.landmarks {
        return Ok(Box::new(FixtureFaceDetector::load(path)?));
    }

    log::info!("Resolving models: {FACE_MODEL_NAME}, {LANDMARK_MODEL_NAME}");
    let face_model = model_resolver::resolve(FACE_MODEL_NAME, cli.face_model.as_deref())?;
    let landmark_model =
        model_resolver::resolve(LANDMARK_MODEL_NAME, cli.landmark_model.as_deref())?;
    Ok(Box::new(OnnxLandmarkDetector::new(
        &face_model,
        &landmark_model,
        cli.confidence,
    )?))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.format.is_none() && !Path::new(&cli.input).exists() {
        return Err(format!("Input not found: {}", cli.input).into());
    }
    if cli.video_size.is_some() && cli.format.is_none() {
        return Err("--video-size requires --format".into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if !(1..=100).contains(&cli.quality) {
        return Err(format!("Quality must be between 1 and 100, got {}", cli.quality).into());
    }
    if cli.interval_ms == Some(0) {
        return Err("Interval must be positive".into());
    }
    Ok(())
}
