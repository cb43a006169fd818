//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for monitoring a run,
//! [`CancellationToken`] for cooperative cancellation, and [`ProgressInfo`]
//! for progress snapshots.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vid2train::{PipelineOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("{pct:.1}% ({} kept, {} skipped)", info.accepted, info.rejected);
//!         }
//!     }
//! }
//!
//! let options = PipelineOptions::new("frames").with_progress(Arc::new(PrintProgress));
//! vid2train::extract("input.mp4", &options)?;
//! # Ok::<(), vid2train::Vid2TrainError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// A snapshot of run progress.
///
/// Delivered to [`ProgressCallback::on_progress`] at a cadence controlled
/// by [`PipelineOptions::with_batch_size`](crate::PipelineOptions::with_batch_size).
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// How many ticks have reached a verdict so far.
    pub current: u64,
    /// Total ticks in the run.
    pub total: u64,
    /// Completion percentage (0.0 – 100.0), if the run has any ticks.
    pub percentage: Option<f32>,
    /// Frames written so far.
    pub accepted: u64,
    /// Frames skipped so far.
    pub rejected: u64,
    /// Wall-clock time elapsed since the run started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// The source frame most recently processed.
    pub current_frame: Option<u64>,
}

/// Trait for receiving progress updates during a run.
///
/// Progress callbacks are **infallible**: they observe but cannot halt
/// the run. Use [`CancellationToken`] for cooperative cancellation.
pub trait ProgressCallback: Send + Sync {
    /// Called at regular intervals during a run.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to stop the run
/// before its next tick.
///
/// # Example
///
/// ```
/// use vid2train::CancellationToken;
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

/// Tracks timing and emits callbacks every `batch_size` ticks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: u64,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, total: u64, batch_size: u64) -> Self {
        Self {
            callback,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one finished tick and report if the batch threshold is reached.
    pub(crate) fn advance(&mut self, frame_index: u64, accepted: u64, rejected: u64) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report(Some(frame_index), accepted, rejected);
            self.items_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final report.
    pub(crate) fn finish(&mut self, accepted: u64, rejected: u64) {
        self.report(None, accepted, rejected);
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    fn report(&self, current_frame: Option<u64>, accepted: u64, rejected: u64) {
        let elapsed = self.start_time.elapsed();

        let percentage =
            (self.total > 0).then(|| (self.current as f32 / self.total as f32) * 100.0);

        let estimated_remaining = (self.current > 0).then(|| {
            let remaining = self.total.saturating_sub(self.current);
            elapsed.mul_f64(remaining as f64 / self.current as f64)
        });

        let info = ProgressInfo {
            current: self.current,
            total: self.total,
            percentage,
            accepted,
            rejected,
            elapsed,
            estimated_remaining,
            current_frame,
        };

        self.callback.on_progress(&info);
    }
}
