//! Video metadata types.
//!
//! [`VideoMetadata`] is read once when a [`VideoDecoder`](crate::VideoDecoder)
//! opens a file and is cached for the lifetime of the decoder. Front ends use
//! it to pre-fill the frame rate and end time of an
//! [`ExtractionRequest`](crate::ExtractionRequest); the extraction loop
//! itself never consults it.

use std::time::Duration;

/// Metadata for the best video stream of a file.
///
/// # Example
///
/// ```no_run
/// use framegrab::VideoDecoder;
///
/// let decoder = VideoDecoder::open("input.mp4")?;
/// let metadata = decoder.metadata();
/// println!(
///     "{}x{} @ {:.2} fps, {} frames",
///     metadata.width, metadata.height, metadata.frames_per_second, metadata.frame_count,
/// );
/// # Ok::<(), framegrab::FramegrabError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Native frames per second (may be approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Total number of frames reported by the container, or estimated from
    /// the container duration when the stream does not say.
    pub frame_count: u64,
    /// Codec name (e.g. `"h264"`, `"vp9"`, `"av1"`).
    pub codec: String,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`, `"matroska,webm"`).
    pub format: String,
}

impl VideoMetadata {
    /// Duration in seconds, computed as `frame_count / frames_per_second`.
    ///
    /// Returns `0.0` when the frame rate is unknown.
    pub fn duration_seconds(&self) -> f64 {
        if self.frames_per_second > 0.0 {
            self.frame_count as f64 / self.frames_per_second
        } else {
            0.0
        }
    }

    /// [`duration_seconds`](VideoMetadata::duration_seconds) as a [`Duration`].
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_seconds())
    }
}
