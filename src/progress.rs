//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for observing a run,
//! [`CancellationToken`] for cooperative cancellation, and [`ProgressInfo`]
//! for the snapshot delivered after every decoded frame.
//!
//! The progress callback is also the loop's yield point: it runs on the
//! extraction thread between frames, so a front end can pump its own events
//! there and request cancellation, which the loop observes immediately after
//! the callback returns.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framegrab::{
//!     ExtractOptions, ExtractionController, ExtractionRequest, ProgressCallback,
//!     ProgressInfo, TerminalStatus,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("frame {}: {}%", info.current_frame, info.percent);
//!     }
//!
//!     fn on_finish(&self, status: &TerminalStatus) {
//!         println!("finished: {status}");
//!     }
//! }
//!
//! let controller = ExtractionController::new();
//! let options = ExtractOptions::new().with_progress(Arc::new(PrintProgress));
//! let request = ExtractionRequest::new("input.mp4", 10.0, 1.0, 3.0, "frames");
//! controller.start_with_options(&request, &options)?;
//! # Ok::<(), framegrab::FramegrabError>(())
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use crate::request::FrameWindow;

/// A snapshot of a run, delivered after each decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressInfo {
    /// Completion percentage, `0..=100`. Never decreases within a run.
    pub percent: u8,
    /// 1-based index of the frame just decoded.
    pub current_frame: u64,
    /// The window being exported.
    pub window: FrameWindow,
    /// Frames written to disk so far.
    pub frames_written: u64,
    /// Wall-clock time since the run started.
    pub elapsed: Duration,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalStatus {
    /// End of stream reached, or a frame past the window was decoded.
    Completed,
    /// Cancellation was observed; frames already written are kept.
    Cancelled,
    /// Decoding or writing failed; frames already written are kept.
    Failed(String),
}

impl Display for TerminalStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TerminalStatus::Completed => write!(f, "completed"),
            TerminalStatus::Cancelled => write!(f, "cancelled"),
            TerminalStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Trait for observing a run.
///
/// Implementations must be [`Send`] and [`Sync`] because a run may execute
/// on a worker thread while the front end lives elsewhere.
///
/// Callbacks observe but cannot halt the run. Use [`CancellationToken`] or
/// [`ControllerHandle::cancel`](crate::ControllerHandle::cancel) for that.
pub trait ProgressCallback: Send + Sync {
    /// Called after every decoded frame.
    fn on_progress(&self, info: &ProgressInfo);

    /// Called once when a started run reaches a terminal state.
    ///
    /// Runs rejected before they start (missing destination, unreadable
    /// video) never reach this.
    fn on_finish(&self, _status: &TerminalStatus) {}
}

/// Discards all notifications. The default observer.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone the token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any of them. The extraction
/// loop checks the token before and after every decode.
///
/// # Example
///
/// ```
/// use framegrab::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes percentages for one run and forwards them to the observer.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    window: FrameWindow,
    start_time: Instant,
    last_percent: u8,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, window: FrameWindow) -> Self {
        Self {
            callback,
            window,
            start_time: Instant::now(),
            last_percent: 0,
        }
    }

    /// Report the frame just decoded and return the percentage sent.
    pub(crate) fn report(&mut self, current_frame: u64, frames_written: u64) -> u8 {
        let percent = self
            .window
            .progress_percent(current_frame)
            .max(self.last_percent);
        self.last_percent = percent;

        self.callback.on_progress(&ProgressInfo {
            percent,
            current_frame,
            window: self.window,
            frames_written,
            elapsed: self.start_time.elapsed(),
        });
        percent
    }

    pub(crate) fn finish(&self, status: &TerminalStatus) {
        self.callback.on_finish(status);
    }

    pub(crate) fn last_percent(&self) -> u8 {
        self.last_percent
    }
}
