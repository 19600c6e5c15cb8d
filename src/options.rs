//! Run options.
//!
//! [`ExtractOptions`] is a builder that threads an observer, an external
//! cancellation token, and the FFmpeg log level through
//! [`ExtractionController::start_with_options`](crate::ExtractionController::start_with_options)
//! without widening the request itself. Options are per run; nothing is
//! persisted between runs.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framegrab::{CancellationToken, ExtractOptions, FfmpegLogLevel, ProgressCallback, ProgressInfo};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{}%", info.percent);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = ExtractOptions::new()
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone())
//!     .with_ffmpeg_log_level(FfmpegLogLevel::Error);
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use crate::{
    ffmpeg::FfmpegLogLevel,
    progress::{CancellationToken, NoOpProgress, ProgressCallback},
};

/// Options for one extraction run.
///
/// A default-constructed value reports nowhere, can only be cancelled through
/// the controller, and leaves FFmpeg's log level alone.
#[derive(Clone)]
pub struct ExtractOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) ffmpeg_log_level: Option<FfmpegLogLevel>,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("has_progress", &true)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("ffmpeg_log_level", &self.ffmpeg_log_level)
            .finish()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            ffmpeg_log_level: None,
        }
    }

    /// Attach an observer for progress and the terminal status.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach an external cancellation token.
    ///
    /// The run ends as [`Cancelled`](crate::RunStatus::Cancelled) when either
    /// this token or the controller's own flag is set. A token that is
    /// already cancelled when the run starts stops it before the first decode.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set FFmpeg's log level before the video is opened.
    #[must_use]
    pub fn with_ffmpeg_log_level(mut self, level: FfmpegLogLevel) -> Self {
        self.ffmpeg_log_level = Some(level);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
