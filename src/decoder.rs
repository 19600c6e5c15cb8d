//! Sequential video decoding.
//!
//! The extraction loop talks to video files through the [`FrameSource`]
//! trait: report the native frame rate and frame count, hand out frames one
//! at a time in decode order, and release resources on [`close`](FrameSource::close).
//!
//! [`VideoDecoder`] implements the trait on top of FFmpeg. [`SyntheticSource`]
//! produces flat-colour frames without touching the filesystem, which makes it
//! handy for driving a front end (or a benchmark) without a real video.
//!
//! # Example
//!
//! ```no_run
//! use framegrab::{FrameSource, VideoDecoder};
//!
//! let mut decoder = VideoDecoder::open("input.mp4")?;
//! println!("{} fps, {} frames", decoder.native_frame_rate(), decoder.total_frames());
//!
//! while let Some(frame) = decoder.next_frame()? {
//!     println!("frame {} is {}x{}", frame.index, frame.width(), frame.height());
//! }
//! decoder.close();
//! # Ok::<(), framegrab::FramegrabError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as StreamDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{Rgb, RgbImage};

use crate::{error::FramegrabError, frame::DecodedFrame, metadata::VideoMetadata};

/// A sequential, forward-only supply of decoded frames.
///
/// Implementations hand out frames in decode order, one per call to
/// [`next_frame`](FrameSource::next_frame), numbering them from 1.
pub trait FrameSource {
    /// Frames per second as reported by the container.
    fn native_frame_rate(&self) -> f64;

    /// Total number of frames as reported by the container.
    fn total_frames(&self) -> u64;

    /// `total_frames / native_frame_rate`, or `0.0` when the rate is unknown.
    fn duration_seconds(&self) -> f64 {
        let rate = self.native_frame_rate();
        if rate > 0.0 {
            self.total_frames() as f64 / rate
        } else {
            0.0
        }
    }

    /// Decode the next frame.
    ///
    /// Returns `Ok(None)` at end of stream, and keeps returning it on
    /// subsequent calls.
    ///
    /// # Errors
    ///
    /// [`FramegrabError::VideoDecodeError`] if the stream is corrupt or
    /// unreadable mid-way.
    fn next_frame(&mut self) -> Result<Option<DecodedFrame>, FramegrabError>;

    /// Release the underlying resources.
    ///
    /// Must be safe to call more than once, after partial consumption, and
    /// after an error. Once closed, [`next_frame`](FrameSource::next_frame)
    /// reports end of stream.
    fn close(&mut self);
}

/// FFmpeg-backed [`FrameSource`] for a video file on disk.
///
/// Opens the file, picks the best video stream, and converts every decoded
/// frame to RGB at the stream's native resolution. No seeking is performed:
/// frames come out strictly in decode order starting from the first one.
///
/// Dropping the decoder releases the demuxer and codec contexts; calling
/// [`close`](FrameSource::close) does so early.
pub struct VideoDecoder {
    path: PathBuf,
    metadata: VideoMetadata,
    state: Option<DecodeState>,
}

struct DecodeState {
    input_context: Input,
    decoder: StreamDecoder,
    scaler: ScalingContext,
    video_stream_index: usize,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    frames_decoded: u64,
    eof_sent: bool,
}

impl Debug for VideoDecoder {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoDecoder")
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .field("open", &self.state.is_some())
            .finish_non_exhaustive()
    }
}

impl VideoDecoder {
    /// Open a video file for sequential decoding.
    ///
    /// Initializes FFmpeg (idempotent), opens the container, and prepares a
    /// decoder and RGB converter for its best video stream.
    ///
    /// # Errors
    ///
    /// - [`FramegrabError::FileOpen`] if the path does not exist or is not a
    ///   decodable container.
    /// - [`FramegrabError::NoVideoStream`] if the container has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FramegrabError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening video file: {}", path.display());

        let open_error = |reason: String| FramegrabError::FileOpen {
            path: path.clone(),
            reason,
        };

        ffmpeg_next::init()
            .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(FramegrabError::NoVideoStream)?;
        let video_stream_index = stream.index();

        let decoder_context = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| open_error(format!("Failed to read codec parameters: {error}")))?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| open_error(format!("Failed to create video decoder: {error}")))?;

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };

        let duration_microseconds = input_context.duration();
        let frame_count = if stream.frames() > 0 {
            stream.frames() as u64
        } else if duration_microseconds > 0 && frames_per_second > 0.0 {
            (duration_microseconds as f64 / 1_000_000.0 * frames_per_second) as u64
        } else {
            0
        };

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count,
            codec: decoder
                .codec()
                .map(|codec| codec.name().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            format: input_context.format().name().to_string(),
        };

        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| open_error(format!("Failed to create pixel converter: {error}")))?;

        log::debug!(
            "Opened {} ({}x{} @ {:.3} fps, {} frames, {})",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.codec,
        );

        Ok(Self {
            path,
            metadata,
            state: Some(DecodeState {
                input_context,
                decoder,
                scaler,
                video_stream_index,
                decoded_frame: VideoFrame::empty(),
                rgb_frame: VideoFrame::empty(),
                frames_decoded: 0,
                eof_sent: false,
            }),
        })
    }

    /// Metadata captured when the file was opened.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path the decoder was opened with.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` until [`close`](FrameSource::close) has been called.
    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }
}

impl FrameSource for VideoDecoder {
    fn native_frame_rate(&self) -> f64 {
        self.metadata.frames_per_second
    }

    fn total_frames(&self) -> u64 {
        self.metadata.frame_count
    }

    fn next_frame(&mut self) -> Result<Option<DecodedFrame>, FramegrabError> {
        match self.state.as_mut() {
            Some(state) => state.next_frame(),
            None => Ok(None),
        }
    }

    fn close(&mut self) {
        if let Some(state) = self.state.take() {
            log::debug!(
                "Closing {} after {} decoded frame(s)",
                self.path.display(),
                state.frames_decoded,
            );
        }
    }
}

impl DecodeState {
    fn next_frame(&mut self) -> Result<Option<DecodedFrame>, FramegrabError> {
        loop {
            // Drain whatever the decoder already holds before reading more.
            match self.decoder.receive_frame(&mut self.decoded_frame) {
                Ok(()) => {
                    self.frames_decoded += 1;
                    let image = self.convert_current_frame()?;
                    return Ok(Some(DecodedFrame::new(self.frames_decoded, image)));
                }
                Err(FfmpegError::Eof) => return Ok(None),
                Err(_) if self.eof_sent => return Ok(None),
                Err(_) => {}
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    if packet.stream() != self.video_stream_index {
                        continue;
                    }
                    self.decoder.send_packet(&packet).map_err(|error| {
                        FramegrabError::VideoDecodeError(format!(
                            "packet after frame {} was rejected: {error}",
                            self.frames_decoded,
                        ))
                    })?;
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    return Err(FramegrabError::VideoDecodeError(format!(
                        "read failed after frame {}: {error}",
                        self.frames_decoded,
                    )));
                }
            }
        }
    }

    fn convert_current_frame(&mut self) -> Result<RgbImage, FramegrabError> {
        self.scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;

        let width = self.rgb_frame.width();
        let height = self.rgb_frame.height();
        let buffer = frame_to_rgb_buffer(&self.rgb_frame, width, height);
        RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
            FramegrabError::VideoDecodeError(format!(
                "frame {} has a truncated pixel buffer",
                self.frames_decoded,
            ))
        })
    }
}

/// Copy an RGB24 frame into a tightly-packed buffer, dropping row padding.
fn frame_to_rgb_buffer(rgb_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let row_bytes = (width as usize) * 3;
    let data = rgb_frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * (height as usize)].to_vec()
    } else {
        data.chunks(stride)
            .take(height as usize)
            .flat_map(|row| &row[..row_bytes])
            .copied()
            .collect()
    }
}

/// A [`FrameSource`] that generates flat-colour frames in memory.
///
/// Each frame's colour is derived from its index, so two frames with the same
/// index are pixel-identical across runs.
///
/// # Example
///
/// ```
/// use framegrab::{FrameSource, SyntheticSource};
///
/// let mut source = SyntheticSource::new(10.0, 3);
/// assert_eq!(source.duration_seconds(), 0.3);
/// assert_eq!(source.next_frame()?.map(|frame| frame.index), Some(1));
/// # Ok::<(), framegrab::FramegrabError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    frames_per_second: f64,
    frame_count: u64,
    width: u32,
    height: u32,
    emitted: u64,
    closed: bool,
}

impl SyntheticSource {
    /// Create a source of `frame_count` 16×16 frames.
    pub fn new(frames_per_second: f64, frame_count: u64) -> Self {
        Self {
            frames_per_second,
            frame_count,
            width: 16,
            height: 16,
            emitted: 0,
            closed: false,
        }
    }

    /// Set the frame dimensions.
    #[must_use]
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    /// Number of frames handed out so far.
    pub fn frames_emitted(&self) -> u64 {
        self.emitted
    }
}

impl FrameSource for SyntheticSource {
    fn native_frame_rate(&self) -> f64 {
        self.frames_per_second
    }

    fn total_frames(&self) -> u64 {
        self.frame_count
    }

    fn next_frame(&mut self) -> Result<Option<DecodedFrame>, FramegrabError> {
        if self.closed || self.emitted >= self.frame_count {
            return Ok(None);
        }
        self.emitted += 1;
        let shade = (self.emitted % 256) as u8;
        let image = RgbImage::from_pixel(
            self.width,
            self.height,
            Rgb([shade, shade.wrapping_mul(3), 255 - shade]),
        );
        Ok(Some(DecodedFrame::new(self.emitted, image)))
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameSource, SyntheticSource};

    #[test]
    fn synthetic_source_numbers_frames_from_one() {
        let mut source = SyntheticSource::new(25.0, 3).with_dimensions(4, 2);
        let indices: Vec<u64> = std::iter::from_fn(|| source.next_frame().unwrap())
            .map(|frame| {
                assert_eq!((frame.width(), frame.height()), (4, 2));
                frame.index
            })
            .collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn closed_source_reports_end_of_stream() {
        let mut source = SyntheticSource::new(25.0, 10);
        source.next_frame().unwrap();
        source.close();
        source.close();
        assert!(source.next_frame().unwrap().is_none());
        assert_eq!(source.frames_emitted(), 1);
    }

    #[test]
    fn duration_uses_native_rate() {
        assert_eq!(SyntheticSource::new(10.0, 100).duration_seconds(), 10.0);
        assert_eq!(SyntheticSource::new(0.0, 100).duration_seconds(), 0.0);
    }
}
