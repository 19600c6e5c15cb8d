//! # framegrab
//!
//! Export the frames of a video time window as numbered JPEG images, with
//! progress reporting and cooperative cancellation.
//!
//! Given a video, a frame rate, a start and end time in seconds, and a
//! destination directory, `framegrab` decodes the video from the beginning,
//! numbers frames from 1 in decode order, and writes every frame whose index
//! lies in `[trunc(start) * trunc(rate), trunc(end) * trunc(rate)]` to
//! `<destination>/<index>.jpg`. Decoding is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use framegrab::{ExtractionController, ExtractionRequest};
//!
//! let controller = ExtractionController::new();
//! let request = ExtractionRequest::new("input.mp4", 10.0, 1.0, 3.0, "frames");
//! let report = controller.start(&request)?;
//! println!("wrote {} frames", report.frames_written);
//! # Ok::<(), framegrab::FramegrabError>(())
//! ```
//!
//! ### Pre-filling a form from the video
//!
//! ```no_run
//! use framegrab::{ExtractionRequest, InputMode, RequestDefaults, VideoDecoder};
//!
//! let metadata = VideoDecoder::open("input.mp4")?.metadata().clone();
//! let defaults = RequestDefaults::from_metadata(&metadata);
//! let request = ExtractionRequest::from_text_fields(
//!     "input.mp4",
//!     &defaults.frame_rate,
//!     &defaults.start_time,
//!     &defaults.end_time,
//!     "frames",
//!     InputMode::Truncate,
//! )?;
//! # Ok::<(), framegrab::FramegrabError>(())
//! ```
//!
//! ## Features
//!
//! - **Deterministic selection**: the same request always selects the same
//!   frame indices
//! - **Progress & cancellation**: a per-frame [`ProgressCallback`], a
//!   [`ControllerHandle`] for cancelling from another thread, and
//!   [`CancellationToken`] for external cancellation
//! - **Pluggable decoding**: any [`FrameSource`] can feed the loop
//! - **Strict input mode**: reject fractional values instead of truncating
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | [`ExtractionTask`] runs a controller on a Tokio blocking thread |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod controller;
pub mod decoder;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod metadata;
pub mod options;
pub mod progress;
pub mod request;
#[cfg(feature = "async")]
pub mod stream;
pub mod writer;

use std::path::Path;

pub use controller::{ControllerHandle, ExtractionController, RunReport, RunState, RunStatus};
pub use decoder::{FrameSource, SyntheticSource, VideoDecoder};
pub use error::FramegrabError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use frame::DecodedFrame;
pub use metadata::VideoMetadata;
pub use options::ExtractOptions;
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo, TerminalStatus};
pub use request::{ExtractionRequest, FrameWindow, InputMode, RequestDefaults};
#[cfg(feature = "async")]
pub use stream::ExtractionTask;
pub use writer::FrameWriter;

/// Open a video, read its metadata, and close it again.
///
/// # Errors
///
/// Same as [`VideoDecoder::open`].
pub fn probe<P: AsRef<Path>>(path: P) -> Result<VideoMetadata, FramegrabError> {
    let mut decoder = VideoDecoder::open(path)?;
    let metadata = decoder.metadata().clone();
    decoder.close();
    Ok(metadata)
}
