//! Extraction requests and frame-window arithmetic.
//!
//! An [`ExtractionRequest`] names the video, the frame rate, the start and
//! end time, and the destination directory of one run. The controller turns
//! it into a [`FrameWindow`]: the inclusive range of 1-based decode indices
//! whose frames are written to disk.
//!
//! Frame rate, start time, and end time are truncated toward zero before the
//! window is computed, so `frame_rate = 29.97, start = 1.9` selects from
//! index `29 * 1 = 29`. Front ends that collect these values as text use
//! [`ExtractionRequest::from_text_fields`]; [`InputMode::Strict`] rejects the
//! fractional input that [`InputMode::Truncate`] would silently drop.
//!
//! # Example
//!
//! ```
//! use framegrab::{ExtractionRequest, InputMode};
//!
//! let request = ExtractionRequest::from_text_fields(
//!     "input.mp4", "10", "1", "3", "frames", InputMode::Truncate,
//! )?;
//! let window = request.frame_window();
//! assert_eq!((window.lower, window.upper), (10, 30));
//! assert_eq!(window.len(), 21);
//! # Ok::<(), framegrab::FramegrabError>(())
//! ```

use std::path::{Path, PathBuf};

use crate::{error::FramegrabError, metadata::VideoMetadata};

/// How text fields are turned into numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Parse as a float and keep it; the fractional part is dropped when the
    /// window is computed. This is the default.
    #[default]
    Truncate,
    /// Reject fractional values, negative times, and a zero frame rate
    /// instead of truncating them.
    Strict,
}

/// Everything one extraction run needs.
///
/// Immutable once built; construct a fresh request per run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    /// The video to read.
    pub video_path: PathBuf,
    /// Frames per second used to turn times into indices.
    pub frame_rate: f64,
    /// Start of the window, in seconds.
    pub start_time: f64,
    /// End of the window, in seconds.
    pub end_time: f64,
    /// Directory that receives `<index>.jpg` files. Empty means "not chosen".
    pub destination_dir: PathBuf,
}

impl ExtractionRequest {
    /// Build a request from already-parsed values.
    pub fn new(
        video_path: impl Into<PathBuf>,
        frame_rate: f64,
        start_time: f64,
        end_time: f64,
        destination_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            video_path: video_path.into(),
            frame_rate,
            start_time,
            end_time,
            destination_dir: destination_dir.into(),
        }
    }

    /// Build a request from the text a user typed.
    ///
    /// Each numeric field is trimmed and parsed as a float.
    ///
    /// # Errors
    ///
    /// [`FramegrabError::InvalidInput`] if a field is not a finite number, or
    /// if `mode` is [`InputMode::Strict`] and the value would be altered by
    /// truncation, a time is negative, or the frame rate is zero.
    pub fn from_text_fields(
        video_path: impl Into<PathBuf>,
        frame_rate: &str,
        start_time: &str,
        end_time: &str,
        destination_dir: impl Into<PathBuf>,
        mode: InputMode,
    ) -> Result<Self, FramegrabError> {
        let frame_rate = parse_field("frame rate", frame_rate, mode)?;
        let start_time = parse_field("start time", start_time, mode)?;
        let end_time = parse_field("end time", end_time, mode)?;

        if mode == InputMode::Strict {
            if frame_rate <= 0.0 {
                return Err(invalid("frame rate", frame_rate, "must be greater than zero"));
            }
            if start_time < 0.0 {
                return Err(invalid("start time", start_time, "must not be negative"));
            }
            if end_time < 0.0 {
                return Err(invalid("end time", end_time, "must not be negative"));
            }
        }

        Ok(Self::new(
            video_path,
            frame_rate,
            start_time,
            end_time,
            destination_dir,
        ))
    }

    /// The inclusive index window this request selects.
    pub fn frame_window(&self) -> FrameWindow {
        FrameWindow::from_times(self.frame_rate, self.start_time, self.end_time)
    }

    /// Returns `true` when no destination directory was chosen.
    pub fn is_missing_destination(&self) -> bool {
        self.destination_dir.as_os_str().is_empty()
    }

    /// Path of the file a frame with the given decode index is written to.
    pub fn output_path(&self, index: u64) -> PathBuf {
        frame_file_path(&self.destination_dir, index)
    }
}

/// `<destination>/<index>.jpg`, with no zero padding.
pub(crate) fn frame_file_path(destination: &Path, index: u64) -> PathBuf {
    destination.join(format!("{index}.jpg"))
}

fn parse_field(field: &'static str, text: &str, mode: InputMode) -> Result<f64, FramegrabError> {
    let trimmed = text.trim();
    let value: f64 = trimmed.parse().map_err(|_| FramegrabError::InvalidInput {
        field,
        value: text.to_string(),
        reason: "not a number".to_string(),
    })?;

    if !value.is_finite() {
        return Err(FramegrabError::InvalidInput {
            field,
            value: text.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    if mode == InputMode::Strict && value.fract() != 0.0 {
        return Err(FramegrabError::InvalidInput {
            field,
            value: text.to_string(),
            reason: "fractional values are not allowed in strict mode".to_string(),
        });
    }

    Ok(value)
}

fn invalid(field: &'static str, value: f64, reason: &str) -> FramegrabError {
    FramegrabError::InvalidInput {
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Inclusive range of 1-based decode indices selected for export.
///
/// `lower = trunc(start) * trunc(rate)` and `upper = trunc(end) * trunc(rate)`.
/// When `upper < lower` the window is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameWindow {
    /// First selected index.
    pub lower: i64,
    /// Last selected index.
    pub upper: i64,
}

impl FrameWindow {
    /// Compute the window from a frame rate and a start/end time in seconds.
    pub fn from_times(frame_rate: f64, start_time: f64, end_time: f64) -> Self {
        let rate = truncate(frame_rate);
        Self {
            lower: truncate(start_time).saturating_mul(rate),
            upper: truncate(end_time).saturating_mul(rate),
        }
    }

    /// Returns `true` if the frame with this decode index is written.
    pub fn contains(&self, index: u64) -> bool {
        let index = as_signed(index);
        self.lower <= index && index <= self.upper
    }

    /// Returns `true` if the index lies before the window.
    pub fn is_before(&self, index: u64) -> bool {
        as_signed(index) < self.lower
    }

    /// Returns `true` if the index lies past the window.
    pub fn is_past(&self, index: u64) -> bool {
        as_signed(index) > self.upper
    }

    /// Number of indices `>= 1` the window selects, ignoring the video length.
    pub fn len(&self) -> u64 {
        let first = self.lower.max(1);
        if self.upper < first {
            0
        } else {
            (self.upper - first) as u64 + 1
        }
    }

    /// Returns `true` if no frame can be selected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Progress after decoding `index`: `floor(index / upper * 100)` clamped
    /// to `0..=100`, or `0` when `upper` is not positive.
    pub fn progress_percent(&self, index: u64) -> u8 {
        if self.upper <= 0 {
            return 0;
        }
        let percent = u128::from(index) * 100 / self.upper as u128;
        percent.min(100) as u8
    }
}

fn truncate(value: f64) -> i64 {
    // `as` saturates and maps NaN to 0.
    value.trunc() as i64
}

fn as_signed(index: u64) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}

/// Text values a front end shows when a video is first selected.
///
/// Start time `0`, end time equal to the video's duration, and frame rate
/// equal to its native rate.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDefaults {
    /// Pre-filled frame-rate field.
    pub frame_rate: String,
    /// Pre-filled start-time field.
    pub start_time: String,
    /// Pre-filled end-time field.
    pub end_time: String,
}

impl RequestDefaults {
    /// Derive the pre-filled fields from a video's metadata.
    pub fn from_metadata(metadata: &VideoMetadata) -> Self {
        Self {
            frame_rate: format_seconds(metadata.frames_per_second),
            start_time: "0".to_string(),
            end_time: format_seconds(metadata.duration_seconds()),
        }
    }
}

fn format_seconds(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_matches_reference_example() {
        let window = FrameWindow::from_times(10.0, 1.0, 3.0);
        assert_eq!(window, FrameWindow { lower: 10, upper: 30 });
        assert_eq!(window.len(), 21);
        assert!(!window.contains(9));
        assert!(window.contains(10));
        assert!(window.contains(30));
        assert!(window.is_past(31));
    }

    #[test]
    fn window_truncates_each_input_before_multiplying() {
        // 29.97 fps, 1.9 s .. 2.5 s -> 29 * 1 .. 29 * 2
        let window = FrameWindow::from_times(29.97, 1.9, 2.5);
        assert_eq!(window, FrameWindow { lower: 29, upper: 58 });
    }

    #[test]
    fn fractional_frame_rate_below_one_selects_nothing() {
        let window = FrameWindow::from_times(0.5, 0.0, 100.0);
        assert_eq!(window, FrameWindow { lower: 0, upper: 0 });
        assert!(window.is_empty());
        assert!(window.is_past(1));
    }

    #[test]
    fn reversed_times_give_empty_window() {
        let window = FrameWindow::from_times(10.0, 5.0, 2.0);
        assert!(window.is_empty());
        assert!(window.is_before(1));
    }

    #[test]
    fn zero_start_selects_from_first_frame() {
        let window = FrameWindow::from_times(10.0, 0.0, 1.0);
        assert!(window.contains(1));
        assert_eq!(window.len(), 10);
    }

    #[test]
    fn progress_is_floored_and_clamped() {
        let window = FrameWindow::from_times(10.0, 1.0, 3.0);
        assert_eq!(window.progress_percent(1), 3);
        assert_eq!(window.progress_percent(10), 33);
        assert_eq!(window.progress_percent(29), 96);
        assert_eq!(window.progress_percent(30), 100);
        assert_eq!(window.progress_percent(45), 100);
    }

    #[test]
    fn progress_without_positive_upper_bound_is_zero() {
        assert_eq!(FrameWindow { lower: 0, upper: 0 }.progress_percent(7), 0);
        assert_eq!(FrameWindow { lower: -5, upper: -1 }.progress_percent(7), 0);
    }

    #[test]
    fn text_fields_truncate_by_default() {
        let request = ExtractionRequest::from_text_fields(
            "in.mp4",
            " 24.9 ",
            "0.7",
            "2.2",
            "out",
            InputMode::Truncate,
        )
        .unwrap();
        assert_eq!(request.frame_rate, 24.9);
        assert_eq!(request.frame_window(), FrameWindow { lower: 0, upper: 48 });
    }

    #[test]
    fn text_fields_reject_garbage_and_non_finite_values() {
        for text in ["", "abc", "inf", "NaN"] {
            let result = ExtractionRequest::from_text_fields(
                "in.mp4",
                text,
                "0",
                "1",
                "out",
                InputMode::Truncate,
            );
            match result {
                Err(FramegrabError::InvalidInput { field, .. }) => assert_eq!(field, "frame rate"),
                other => panic!("expected InvalidInput for {text:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn strict_mode_rejects_what_truncation_would_drop() {
        let fractional =
            ExtractionRequest::from_text_fields("in.mp4", "10", "1.5", "3", "out", InputMode::Strict);
        assert!(matches!(
            fractional,
            Err(FramegrabError::InvalidInput { field: "start time", .. })
        ));

        let zero_rate =
            ExtractionRequest::from_text_fields("in.mp4", "0", "1", "3", "out", InputMode::Strict);
        assert!(matches!(
            zero_rate,
            Err(FramegrabError::InvalidInput { field: "frame rate", .. })
        ));

        let negative =
            ExtractionRequest::from_text_fields("in.mp4", "10", "-1", "3", "out", InputMode::Strict);
        assert!(negative.is_err());

        let whole =
            ExtractionRequest::from_text_fields("in.mp4", "10.0", "1", "3", "out", InputMode::Strict);
        assert!(whole.is_ok());
    }

    #[test]
    fn output_path_has_no_padding() {
        let request = ExtractionRequest::new("in.mp4", 10.0, 0.0, 1.0, "out");
        assert_eq!(request.output_path(7), Path::new("out").join("7.jpg"));
        assert!(!request.is_missing_destination());
        assert!(ExtractionRequest::new("in.mp4", 10.0, 0.0, 1.0, "").is_missing_destination());
    }

    #[test]
    fn defaults_prefill_from_metadata() {
        let metadata = VideoMetadata {
            width: 160,
            height: 120,
            frames_per_second: 10.0,
            frame_count: 95,
            codec: "h264".to_string(),
            format: "mp4".to_string(),
        };
        let defaults = RequestDefaults::from_metadata(&metadata);
        assert_eq!(defaults.frame_rate, "10.0");
        assert_eq!(defaults.start_time, "0");
        assert_eq!(defaults.end_time, "9.5");
    }
}
