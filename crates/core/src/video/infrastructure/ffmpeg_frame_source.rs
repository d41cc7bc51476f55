use std::path::Path;

use ffmpeg_next::format::context::Input;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::{FrameReadError, FrameSource};
use crate::BoxError;

/// Microseconds per second, the unit `avformat_seek_file` expects when no
/// stream index is given.
const AV_TIME_BASE: f64 = 1_000_000.0;

/// Random-access frame source over a video container, decoded with
/// ffmpeg-next.
///
/// Reads at the next sequential index decode forward without seeking, so a
/// linear scan costs one decode per frame. Any other index seeks to the
/// closest preceding keyframe and decodes forward to the requested frame.
pub struct FfmpegFrameSource {
    input: Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: scaling::Context,
    stream_index: usize,
    time_base: f64,
    start_pts: i64,
    metadata: VideoMetadata,
    /// Index the decoder will produce next, if known.
    next_index: Option<usize>,
    eof_sent: bool,
    /// `(requested, returned)` pairs where no frame decoded at the requested
    /// index and a later one stood in for it.
    substitutions: Vec<(usize, usize)>,
}

// Safety: a source is owned by exactly one search at a time and moved, not
// shared, between threads. The raw ffmpeg pointers are never aliased.
unsafe impl Send for FfmpegFrameSource {}

impl FfmpegFrameSource {
    pub fn open(path: &Path) -> Result<Self, BoxError> {
        ffmpeg_next::init()?;
        let input = ffmpeg_next::format::input(path)?;

        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let stream_index = stream.index();
        let time_base = rational_to_f64(stream.time_base());
        let start_pts = match stream.start_time() {
            i64::MIN => 0,
            pts => pts,
        };
        let fps = match rational_to_f64(stream.avg_frame_rate()) {
            f if f > 0.0 => f,
            _ => rational_to_f64(stream.rate()),
        };
        let declared_frames = stream.frames();

        let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?
            .decoder()
            .video()?;
        let (width, height) = (decoder.width(), decoder.height());
        let scaler = scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            scaling::Flags::BILINEAR,
        )?;

        let total_frames = if declared_frames > 0 {
            declared_frames as usize
        } else {
            estimate_frame_count(input.duration(), fps)
        };

        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };
        log::debug!(
            "Opened {} ({}x{}, {:.2} fps, {} frames, codec {})",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames,
            metadata.codec
        );

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            time_base,
            start_pts,
            metadata,
            next_index: Some(0),
            eof_sent: false,
            substitutions: Vec::new(),
        })
    }

    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Reads answered with a later frame than the one asked for.
    pub fn substitutions(&self) -> &[(usize, usize)] {
        &self.substitutions
    }

    fn record_substitution(&mut self, requested: usize, decoded: usize) {
        log::warn!(
            "Frame {requested} did not decode; returning frame {decoded} in its place"
        );
        self.substitutions.push((requested, decoded));
    }

    fn seek_to(&mut self, index: usize) -> Result<(), FrameReadError> {
        let fps = self.metadata.fps;
        if fps <= 0.0 {
            return Err(decode_error(index, "stream has no frame rate; cannot seek"));
        }
        // Aim half a frame early so rounding never lands past the target.
        let start_secs = self.start_pts as f64 * self.time_base;
        let target_secs = start_secs + (index as f64 - 0.5).max(0.0) / fps;
        let ts = (target_secs * AV_TIME_BASE) as i64;

        self.input
            .seek(ts, ..ts)
            .map_err(|e| decode_error(index, e))?;
        self.decoder.flush();
        self.eof_sent = false;
        self.next_index = None;
        Ok(())
    }

    /// Sequence index of a decoded frame, from its presentation timestamp.
    fn index_of(&self, decoded: &Video) -> Option<usize> {
        match decoded.timestamp() {
            Some(pts) => {
                let secs = (pts - self.start_pts) as f64 * self.time_base;
                Some((secs * self.metadata.fps).round().max(0.0) as usize)
            }
            None => self.next_index,
        }
    }

    fn decode_until(&mut self, index: usize) -> Result<Frame, FrameReadError> {
        loop {
            let mut decoded = Video::empty();
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                let Some(decoded_index) = self.index_of(&decoded) else {
                    return Err(decode_error(index, "decoded frame has no timestamp"));
                };
                self.next_index = Some(decoded_index + 1);
                if decoded_index < index {
                    continue;
                }
                if decoded_index > index {
                    self.record_substitution(index, decoded_index);
                }
                return self.convert(&decoded, index);
            }

            if self.eof_sent {
                self.next_index = None;
                return Err(FrameReadError::EndOfStream { index });
            }

            match self.input.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != self.stream_index {
                        continue;
                    }
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        log::debug!("Skipping undecodable packet: {e}");
                    }
                }
                None => {
                    let _ = self.decoder.send_eof();
                    self.eof_sent = true;
                }
            }
        }
    }

    fn convert(&mut self, decoded: &Video, index: usize) -> Result<Frame, FrameReadError> {
        let mut rgb = Video::empty();
        self.scaler
            .run(decoded, &mut rgb)
            .map_err(|e| decode_error(index, e))?;
        let pixels = packed_rgb(&rgb, self.metadata.width, self.metadata.height);
        Ok(Frame::new(
            pixels,
            self.metadata.width,
            self.metadata.height,
            index,
        ))
    }
}

impl FrameSource for FfmpegFrameSource {
    fn frame_count(&self) -> usize {
        self.metadata.total_frames
    }

    fn read_frame_at(&mut self, index: usize) -> Result<Frame, FrameReadError> {
        let len = self.metadata.total_frames;
        if index >= len {
            return Err(FrameReadError::OutOfRange { index, len });
        }
        if self.next_index != Some(index) {
            self.seek_to(index)?;
        }
        self.decode_until(index)
    }

    fn fps(&self) -> Option<f64> {
        (self.metadata.fps > 0.0).then_some(self.metadata.fps)
    }
}

fn decode_error(index: usize, source: impl Into<BoxError>) -> FrameReadError {
    FrameReadError::Decode {
        index,
        source: source.into(),
    }
}

fn rational_to_f64(r: ffmpeg_next::Rational) -> f64 {
    if r.denominator() == 0 {
        0.0
    } else {
        r.numerator() as f64 / r.denominator() as f64
    }
}

/// Frame count from container duration (in `AV_TIME_BASE` units) when the
/// stream doesn't declare one.
fn estimate_frame_count(duration: i64, fps: f64) -> usize {
    if duration <= 0 || fps <= 0.0 {
        return 0;
    }
    (duration as f64 / AV_TIME_BASE * fps).floor() as usize
}

/// Copies an RGB24 frame into a tightly packed buffer, dropping row padding.
fn packed_rgb(rgb: &Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb.stride(0);
    let data = rgb.data(0);
    let row_len = width as usize * 3;

    (0..height as usize)
        .flat_map(|row| &data[row * stride..row * stride + row_len])
        .copied()
        .collect()
}
