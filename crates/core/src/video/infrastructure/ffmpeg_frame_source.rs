use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{FramePoll, FrameSource};

/// Decodes frames from a capture device or video file via ffmpeg-next.
///
/// Devices are opened through a named ffmpeg input format (`v4l2`,
/// `avfoundation`, `dshow`, ...); plain files are probed. Each decoded frame
/// is converted to RGB24.
pub struct FfmpegFrameSource {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    video_stream_index: usize,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

// Safety: FfmpegFrameSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegFrameSource {}

impl FfmpegFrameSource {
    /// Opens a video file, probing its container.
    pub fn open_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        let ictx = ffmpeg_next::format::input(&path)?;
        Self::from_input(ictx)
    }

    /// Opens a capture device (e.g. `/dev/video0` with format `v4l2`).
    ///
    /// `options` are passed to the demuxer, e.g. `("video_size", "640x480")`.
    pub fn open_device(
        device: &str,
        format_name: &str,
        options: &[(&str, &str)],
    ) -> Result<Self, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        ffmpeg_next::device::register_all();

        let format = ffmpeg_next::device::input::video()
            .find(|f| f.name() == format_name)
            .ok_or_else(|| format!("Capture format not available: {format_name}"))?;

        let mut dict = ffmpeg_next::Dictionary::new();
        for (key, value) in options {
            dict.set(key, value);
        }

        let ictx = ffmpeg_next::format::open_with(
            &device,
            &ffmpeg_next::format::format::Format::Input(format),
            dict,
        )?
        .input();
        Self::from_input(ictx)
    }

    fn from_input(
        ictx: ffmpeg_next::format::context::Input,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let video_stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;
        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::info!("Opened video source {width}x{height}");

        Ok(Self {
            ictx,
            decoder,
            scaler,
            width,
            height,
            video_stream_index,
            frame_index: 0,
            flushing: false,
            done: false,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&decoded, &mut rgb_frame)?;

        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, 3, self.frame_index);
        self.frame_index += 1;
        Ok(Some(frame))
    }
}

impl FrameSource for FfmpegFrameSource {
    fn poll_frame(&mut self) -> Result<FramePoll, Box<dyn std::error::Error>> {
        if self.done {
            return Ok(FramePoll::Ended);
        }
        if self.width == 0 || self.height == 0 {
            return Ok(FramePoll::NotReady);
        }
        if let Some(frame) = self.try_receive()? {
            return Ok(FramePoll::Frame(frame));
        }
        if self.flushing {
            self.done = true;
            return Ok(FramePoll::Ended);
        }

        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                if let Some(frame) = self.try_receive()? {
                    return Ok(FramePoll::Frame(frame));
                }
                self.done = true;
                return Ok(FramePoll::Ended);
            };

            if stream.index() != self.video_stream_index {
                continue;
            }
            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }
            if let Some(frame) = self.try_receive()? {
                return Ok(FramePoll::Frame(frame));
            }
        }
    }

    fn close(&mut self) {
        self.done = true;
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer,
/// stripping the row padding ffmpeg adds when stride > width * 3.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
