//! Async extraction.
//!
//! [`ExtractionTask`] runs an [`ExtractionController`] on a Tokio blocking
//! thread so FFmpeg work never occupies the async runtime. Progress is
//! published on a [`watch`](tokio::sync::watch) channel, cancellation goes
//! through a [`CancellationToken`], and the task itself is a future that
//! resolves to the run's result.
//!
//! # Example
//!
//! ```no_run
//! use framegrab::{ExtractOptions, ExtractionRequest, ExtractionTask, FramegrabError};
//!
//! # async fn example() -> Result<(), FramegrabError> {
//! let request = ExtractionRequest::new("input.mp4", 10.0, 1.0, 3.0, "frames");
//! let mut task = ExtractionTask::spawn(request, ExtractOptions::new());
//!
//! let mut progress = task.progress();
//! while progress.changed().await.is_ok() {
//!     println!("{}%", *progress.borrow());
//! }
//!
//! let report = task.await?;
//! println!("wrote {} frames", report.frames_written);
//! # Ok(())
//! # }
//! ```

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use tokio::{
    sync::watch::{self, Receiver, Sender},
    task::JoinHandle,
};
use tokio_stream::wrappers::WatchStream;

use crate::{
    controller::{ControllerHandle, ExtractionController, RunReport},
    error::FramegrabError,
    options::ExtractOptions,
    progress::{CancellationToken, ProgressCallback, ProgressInfo, TerminalStatus},
    request::ExtractionRequest,
};

/// A run executing on a blocking thread.
///
/// Dropping the task does not stop the run; call
/// [`cancel`](ExtractionTask::cancel) for that.
pub struct ExtractionTask {
    handle: JoinHandle<Result<RunReport, FramegrabError>>,
    controller: ControllerHandle,
    cancellation: CancellationToken,
    progress: Receiver<u8>,
}

/// Publishes percentages on the watch channel, then forwards to the caller's
/// own observer.
struct WatchProgress {
    sender: Sender<u8>,
    inner: Arc<dyn ProgressCallback>,
}

impl ProgressCallback for WatchProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.sender.send_if_modified(|percent| {
            let changed = *percent != info.percent;
            *percent = info.percent;
            changed
        });
        self.inner.on_progress(info);
    }

    fn on_finish(&self, status: &TerminalStatus) {
        self.inner.on_finish(status);
    }
}

impl ExtractionTask {
    /// Start `request` on a Tokio blocking thread.
    ///
    /// If `options` carries a [`CancellationToken`], [`cancel`](ExtractionTask::cancel)
    /// cancels that token; otherwise the task creates its own.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(request: ExtractionRequest, options: ExtractOptions) -> Self {
        let controller = ExtractionController::new();
        let controller_handle = controller.handle();
        let (sender, progress) = watch::channel(0_u8);

        let cancellation = options.cancellation.clone().unwrap_or_default();
        let observer = Arc::new(WatchProgress {
            sender,
            inner: Arc::clone(&options.progress),
        });
        let options = options
            .with_progress(observer)
            .with_cancellation(cancellation.clone());

        let handle =
            tokio::task::spawn_blocking(move || controller.start_with_options(&request, &options));

        Self {
            handle,
            controller: controller_handle,
            cancellation,
            progress,
        }
    }

    /// Request cancellation of the run.
    ///
    /// Takes effect even if the blocking thread has not started the run yet.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// A handle to the underlying controller.
    pub fn controller(&self) -> ControllerHandle {
        self.controller.clone()
    }

    /// A receiver of the latest percentage. Closes when the run ends.
    pub fn progress(&self) -> Receiver<u8> {
        self.progress.clone()
    }

    /// Percentages as a [`Stream`](tokio_stream::Stream), starting with the
    /// current value.
    pub fn progress_stream(&self) -> WatchStream<u8> {
        WatchStream::new(self.progress.clone())
    }
}

impl Future for ExtractionTask {
    type Output = Result<RunReport, FramegrabError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|result| {
            result.unwrap_or_else(|error| Err(FramegrabError::TaskFailed(error.to_string())))
        })
    }
}
