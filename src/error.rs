//! Error types for the `framegrab` crate.
//!
//! This module defines [`FramegrabError`], the unified error type returned by
//! every fallible operation in the crate. Variants carry the path, field, or
//! upstream message needed to explain the failure to a user without extra
//! logging at the call site.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `framegrab` operations.
///
/// Errors fall into two groups. [`MissingDestination`](FramegrabError::MissingDestination),
/// [`FileOpen`](FramegrabError::FileOpen), [`NoVideoStream`](FramegrabError::NoVideoStream),
/// [`InvalidInput`](FramegrabError::InvalidInput), and
/// [`AlreadyRunning`](FramegrabError::AlreadyRunning) are raised before a run
/// starts. [`VideoDecodeError`](FramegrabError::VideoDecodeError) and
/// [`WriteError`](FramegrabError::WriteError) end a run that is already in
/// progress; frames written before the failure stay on disk.
///
/// Cancellation is not an error. A cancelled run returns a
/// [`RunReport`](crate::RunReport) with status
/// [`RunStatus::Cancelled`](crate::RunStatus::Cancelled).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramegrabError {
    /// No destination directory was chosen.
    #[error("Please select a destination folder")]
    MissingDestination,

    /// The video file could not be opened or is not a decodable container.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`VideoDecoder::open`](crate::VideoDecoder::open).
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file opened but contains no video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A frame could not be decoded mid-stream.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// A selected frame could not be written to the destination directory.
    #[error("Failed to write frame to {path}: {reason}")]
    WriteError {
        /// The file (or directory) that could not be written.
        path: PathBuf,
        /// Underlying reason the write failed.
        reason: String,
    },

    /// A request field could not be turned into a number.
    #[error("Invalid {field} value {value:?}: {reason}")]
    InvalidInput {
        /// Which request field was rejected (e.g. `"frame rate"`).
        field: &'static str,
        /// The text that was supplied.
        value: String,
        /// Why the text was rejected.
        reason: String,
    },

    /// [`ExtractionController::start`](crate::ExtractionController::start)
    /// was called while another run was in flight.
    #[error("An extraction run is already in progress")]
    AlreadyRunning,

    /// The background extraction task panicked or was aborted.
    #[cfg(feature = "async")]
    #[error("Extraction task failed: {0}")]
    TaskFailed(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while preparing or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate during frame conversion.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for FramegrabError {
    fn from(error: FfmpegError) -> Self {
        FramegrabError::FfmpegError(error.to_string())
    }
}
