//! The extraction run state machine.
//!
//! [`ExtractionController`] drives one run at a time through
//! `Idle → Running → {Completed, Cancelled, Failed} → Idle`:
//!
//! 1. Reject an empty destination, then create the destination tree.
//! 2. Open the video. Failures here leave the controller `Idle`.
//! 3. Compute the [`FrameWindow`] and enter `Running`.
//! 4. Decode frames in order, numbering them from 1. After each decode,
//!    report progress, then skip frames before the window, stop at the first
//!    frame past it, and write the rest.
//! 5. Close the decoder, notify the observer of the terminal state, and
//!    return to `Idle`.
//!
//! Cancellation is cooperative. [`ControllerHandle::cancel`] sets a flag that
//! the loop checks before each decode and again after the progress callback,
//! so a frame decoded after cancellation is never written.
//!
//! # Example
//!
//! ```no_run
//! use std::thread;
//!
//! use framegrab::{ExtractionController, ExtractionRequest, RunStatus};
//!
//! let controller = ExtractionController::new();
//! let handle = controller.handle();
//!
//! let worker = thread::spawn(move || {
//!     let request = ExtractionRequest::new("input.mp4", 10.0, 1.0, 3.0, "frames");
//!     controller.start(&request)
//! });
//!
//! // Later, from the UI thread:
//! handle.cancel();
//!
//! let report = worker.join().unwrap()?;
//! assert!(matches!(report.status, RunStatus::Completed | RunStatus::Cancelled));
//! # Ok::<(), framegrab::FramegrabError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU8, Ordering},
    },
};

use crate::{
    decoder::{FrameSource, VideoDecoder},
    error::FramegrabError,
    ffmpeg::set_ffmpeg_log_level,
    options::ExtractOptions,
    progress::{ProgressTracker, TerminalStatus},
    request::{ExtractionRequest, FrameWindow},
    writer::FrameWriter,
};

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RunStatus {
    /// No run in flight.
    Idle = 0,
    /// A run is decoding and writing frames.
    Running = 1,
    /// The run reached end of stream or passed the window.
    Completed = 2,
    /// The run observed a cancellation request.
    Cancelled = 3,
    /// The run stopped on a decode or write error.
    Failed = 4,
}

impl RunStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => RunStatus::Running,
            2 => RunStatus::Completed,
            3 => RunStatus::Cancelled,
            4 => RunStatus::Failed,
            _ => RunStatus::Idle,
        }
    }
}

/// Per-run counters, owned by the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    /// 1-based count of frames decoded so far.
    pub current_frame_index: u64,
    /// Last percentage reported to the observer.
    pub last_progress_percent: u8,
    /// Frames written to disk so far.
    pub frames_written: u64,
}

/// Summary of a run that completed or was cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct RunReport {
    /// [`RunStatus::Completed`] or [`RunStatus::Cancelled`].
    pub status: RunStatus,
    /// The window that was exported.
    pub window: FrameWindow,
    /// Frames decoded, including skipped ones and the one that passed the window.
    pub frames_decoded: u64,
    /// Frames written to disk.
    pub frames_written: u64,
    /// Last percentage reported.
    pub last_progress: u8,
}

impl RunReport {
    /// The terminal status this report corresponds to.
    pub fn terminal_status(&self) -> TerminalStatus {
        match self.status {
            RunStatus::Cancelled => TerminalStatus::Cancelled,
            _ => TerminalStatus::Completed,
        }
    }
}

struct Shared {
    status: AtomicU8,
    cancelled: AtomicBool,
}

impl Shared {
    fn status(&self) -> RunStatus {
        RunStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    fn set_status(&self, status: RunStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    fn cancel(&self) {
        if self.status() == RunStatus::Running {
            log::debug!("Cancellation requested");
            self.cancelled.store(true, Ordering::Release);
        }
    }
}

/// Cheap, cloneable remote control for an [`ExtractionController`].
///
/// Safe to move to another thread (a UI callback, a signal handler) while the
/// controller runs elsewhere.
#[derive(Clone)]
pub struct ControllerHandle {
    shared: Arc<Shared>,
}

impl ControllerHandle {
    /// Request cancellation of the current run. Does not block; a no-op when
    /// no run is in flight.
    pub fn cancel(&self) {
        self.shared.cancel();
    }

    /// Current lifecycle state.
    pub fn status(&self) -> RunStatus {
        self.shared.status()
    }
}

impl Debug for ControllerHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ControllerHandle")
            .field("status", &self.status())
            .finish()
    }
}

/// Runs extractions, one at a time.
pub struct ExtractionController {
    shared: Arc<Shared>,
}

impl Debug for ExtractionController {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractionController")
            .field("status", &self.status())
            .field(
                "cancel_requested",
                &self.shared.cancelled.load(Ordering::Acquire),
            )
            .finish()
    }
}

impl Default for ExtractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionController {
    /// Create an idle controller.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                status: AtomicU8::new(RunStatus::Idle as u8),
                cancelled: AtomicBool::new(false),
            }),
        }
    }

    /// A handle for cancelling and observing runs from another thread.
    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Current lifecycle state.
    pub fn status(&self) -> RunStatus {
        self.shared.status()
    }

    /// Request cancellation of the current run. A no-op while idle.
    pub fn cancel(&self) {
        self.shared.cancel();
    }

    /// Run an extraction with default options.
    ///
    /// See [`start_with_options`](ExtractionController::start_with_options).
    pub fn start(&self, request: &ExtractionRequest) -> Result<RunReport, FramegrabError> {
        self.start_with_options(request, &ExtractOptions::new())
    }

    /// Run an extraction, decoding `request.video_path` with FFmpeg.
    ///
    /// Blocks until the run ends. Progress and the terminal status go to the
    /// observer in `options`.
    ///
    /// # Errors
    ///
    /// Before the run starts (controller stays `Idle`, observer not notified):
    /// - [`FramegrabError::AlreadyRunning`] if another run is in flight.
    /// - [`FramegrabError::MissingDestination`] if no destination was chosen.
    /// - [`FramegrabError::WriteError`] if the destination cannot be created.
    /// - [`FramegrabError::FileOpen`] / [`FramegrabError::NoVideoStream`] if
    ///   the video cannot be opened.
    ///
    /// During the run (observer gets [`TerminalStatus::Failed`], written frames
    /// stay on disk):
    /// - [`FramegrabError::VideoDecodeError`] on a mid-stream decode failure.
    /// - [`FramegrabError::WriteError`] if a frame cannot be written.
    pub fn start_with_options(
        &self,
        request: &ExtractionRequest,
        options: &ExtractOptions,
    ) -> Result<RunReport, FramegrabError> {
        self.start_with(request, options, |path: &Path| VideoDecoder::open(path))
    }

    /// Run an extraction over a [`FrameSource`] produced by `open`.
    ///
    /// `open` receives `request.video_path` after the destination has been
    /// prepared. Use this to plug in a decoder other than FFmpeg.
    pub fn start_with<S, F>(
        &self,
        request: &ExtractionRequest,
        options: &ExtractOptions,
        open: F,
    ) -> Result<RunReport, FramegrabError>
    where
        S: FrameSource,
        F: FnOnce(&Path) -> Result<S, FramegrabError>,
    {
        if self.status() != RunStatus::Idle {
            return Err(FramegrabError::AlreadyRunning);
        }
        if request.is_missing_destination() {
            return Err(FramegrabError::MissingDestination);
        }
        let writer = FrameWriter::prepare(&request.destination_dir)?;

        if let Some(level) = options.ffmpeg_log_level {
            set_ffmpeg_log_level(level);
        }
        let mut source = SourceGuard(open(&request.video_path)?);

        let window = request.frame_window();
        self.shared.cancelled.store(false, Ordering::Release);
        if self
            .shared
            .status
            .compare_exchange(
                RunStatus::Idle as u8,
                RunStatus::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Err(FramegrabError::AlreadyRunning);
        }
        let _idle_on_exit = IdleOnDrop(&self.shared);

        log::info!(
            "Extracting frames {}..={} of {} into {}",
            window.lower,
            window.upper,
            request.video_path.display(),
            writer.destination().display(),
        );

        let mut tracker = ProgressTracker::new(Arc::clone(&options.progress), window);
        let mut state = RunState::default();
        let outcome = self.run_loop(
            &mut source.0,
            &writer,
            window,
            options,
            &mut tracker,
            &mut state,
        );
        source.0.close();

        match outcome {
            Ok(status) => {
                self.shared.set_status(status);
                let report = RunReport {
                    status,
                    window,
                    frames_decoded: state.current_frame_index,
                    frames_written: state.frames_written,
                    last_progress: tracker.last_percent(),
                };
                log::info!(
                    "Run {:?}: {} frame(s) decoded, {} written",
                    status,
                    report.frames_decoded,
                    report.frames_written,
                );
                tracker.finish(&report.terminal_status());
                Ok(report)
            }
            Err(error) => {
                self.shared.set_status(RunStatus::Failed);
                log::warn!(
                    "Run failed after {} frame(s) decoded, {} written: {error}",
                    state.current_frame_index,
                    state.frames_written,
                );
                tracker.finish(&TerminalStatus::Failed(error.to_string()));
                Err(error)
            }
        }
    }

    fn run_loop<S: FrameSource>(
        &self,
        source: &mut S,
        writer: &FrameWriter,
        window: FrameWindow,
        options: &ExtractOptions,
        tracker: &mut ProgressTracker,
        state: &mut RunState,
    ) -> Result<RunStatus, FramegrabError> {
        loop {
            if self.cancel_requested(options) {
                return Ok(RunStatus::Cancelled);
            }

            let Some(mut frame) = source.next_frame()? else {
                return Ok(RunStatus::Completed);
            };
            state.current_frame_index += 1;
            let index = state.current_frame_index;
            frame.index = index;

            state.last_progress_percent = tracker.report(index, state.frames_written);

            if self.cancel_requested(options) {
                return Ok(RunStatus::Cancelled);
            }
            if window.is_before(index) {
                continue;
            }
            if window.is_past(index) {
                return Ok(RunStatus::Completed);
            }

            writer.write(&frame)?;
            state.frames_written += 1;
        }
    }

    fn cancel_requested(&self, options: &ExtractOptions) -> bool {
        self.shared.cancelled.load(Ordering::Acquire) || options.is_cancelled()
    }
}

/// Closes the source on every exit path.
struct SourceGuard<S: FrameSource>(S);

impl<S: FrameSource> Drop for SourceGuard<S> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Returns the controller to `Idle` on every exit path.
struct IdleOnDrop<'a>(&'a Shared);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.cancelled.store(false, Ordering::Release);
        self.0.set_status(RunStatus::Idle);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        decoder::SyntheticSource,
        progress::{ProgressCallback, ProgressInfo},
    };

    #[derive(Default)]
    struct Recorder {
        statuses: Mutex<Vec<TerminalStatus>>,
    }

    impl ProgressCallback for Recorder {
        fn on_progress(&self, _info: &ProgressInfo) {}

        fn on_finish(&self, status: &TerminalStatus) {
            self.statuses.lock().unwrap().push(status.clone());
        }
    }

    #[test]
    fn cancel_while_idle_is_a_no_op() {
        let controller = ExtractionController::new();
        controller.cancel();
        controller.handle().cancel();
        assert_eq!(controller.status(), RunStatus::Idle);

        let destination = tempfile::tempdir().unwrap();
        let request = ExtractionRequest::new("synthetic", 10.0, 0.0, 1.0, destination.path());
        let report = controller
            .start_with(&request, &ExtractOptions::new(), |_| {
                Ok(SyntheticSource::new(10.0, 50))
            })
            .unwrap();
        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.frames_written, 10);
    }

    #[test]
    fn missing_destination_is_rejected_before_open() {
        let controller = ExtractionController::new();
        let request = ExtractionRequest::new("synthetic", 10.0, 0.0, 1.0, "");
        let result = controller.start_with(
            &request,
            &ExtractOptions::new(),
            |_| -> Result<SyntheticSource, _> {
                panic!("video must not be opened without a destination")
            },
        );
        assert!(matches!(result, Err(FramegrabError::MissingDestination)));
        assert_eq!(controller.status(), RunStatus::Idle);
    }

    #[test]
    fn open_failure_leaves_controller_idle_without_notifying() {
        let controller = ExtractionController::new();
        let recorder = Arc::new(Recorder::default());
        let options = ExtractOptions::new().with_progress(recorder.clone());
        let destination = tempfile::tempdir().unwrap();
        let request = ExtractionRequest::new("missing.mp4", 10.0, 0.0, 1.0, destination.path());

        let result = controller.start_with(
            &request,
            &options,
            |path| -> Result<SyntheticSource, _> {
                Err(FramegrabError::FileOpen {
                    path: path.to_path_buf(),
                    reason: "No such file or directory".to_string(),
                })
            },
        );

        assert!(matches!(result, Err(FramegrabError::FileOpen { .. })));
        assert_eq!(controller.status(), RunStatus::Idle);
        assert!(recorder.statuses.lock().unwrap().is_empty());
    }

    #[test]
    fn status_returns_to_idle_and_observer_sees_terminal_state() {
        let controller = ExtractionController::new();
        let recorder = Arc::new(Recorder::default());
        let options = ExtractOptions::new().with_progress(recorder.clone());
        let destination = tempfile::tempdir().unwrap();
        let request = ExtractionRequest::new("synthetic", 5.0, 1.0, 2.0, destination.path());

        let report = controller
            .start_with(&request, &options, |_| Ok(SyntheticSource::new(5.0, 8)))
            .unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.window, FrameWindow { lower: 5, upper: 10 });
        assert_eq!(report.frames_decoded, 8);
        assert_eq!(report.frames_written, 4);
        assert_eq!(report.last_progress, 80);
        assert_eq!(controller.status(), RunStatus::Idle);
        assert_eq!(
            *recorder.statuses.lock().unwrap(),
            vec![TerminalStatus::Completed]
        );
    }

    #[test]
    fn run_status_round_trips_through_u8() {
        for status in [
            RunStatus::Idle,
            RunStatus::Running,
            RunStatus::Completed,
            RunStatus::Cancelled,
            RunStatus::Failed,
        ] {
            assert_eq!(RunStatus::from_u8(status as u8), status);
        }
    }
}
