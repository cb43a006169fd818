//! Run configuration.
//!
//! [`PipelineOptions`] is a builder that carries every knob of a run: crop
//! size, brightness bounds, sampling rate, output location, run token, the
//! write-failure policy, the random seed and the progress/cancellation hooks.
//!
//! # Example
//!
//! ```
//! use vid2train::{PipelineOptions, WriteFailurePolicy};
//!
//! let options = PipelineOptions::new("frames")
//!     .with_crop_size(256)
//!     .with_brightness(30, 220)
//!     .with_samples_per_second(2.0)
//!     .with_write_failure_policy(WriteFailurePolicy::Skip)
//!     .with_seed(7);
//! assert!(options.validate().is_ok());
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    sync::Arc,
};

use image::imageops::FilterType;

use crate::{
    brightness::BrightnessRange,
    error::Vid2TrainError,
    persistence::RunToken,
    progress::{CancellationToken, NoOpProgress, ProgressCallback},
    transform::CropResize,
};

/// Default side length of output images.
pub const DEFAULT_CROP_SIZE: u32 = 512;
/// Default exclusive lower brightness bound.
pub const DEFAULT_BRIGHTNESS_MIN: u32 = 20;
/// Default exclusive upper brightness bound.
pub const DEFAULT_BRIGHTNESS_MAX: u32 = 236;
/// Default number of samples taken per second of video.
pub const DEFAULT_SAMPLES_PER_SECOND: f64 = 1.0;

/// What to do when an accepted frame cannot be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteFailurePolicy {
    /// Stop the run and return the write error. This is the default.
    #[default]
    Abort,
    /// Log the error, count the frame as rejected and continue.
    Skip,
}

/// Configuration for one pipeline run.
///
/// All fields have defaults except the output directory. Bounds are checked
/// by [`validate`](PipelineOptions::validate), which every run calls first.
#[derive(Clone)]
pub struct PipelineOptions {
    pub(crate) output_directory: PathBuf,
    pub(crate) run_token: RunToken,
    pub(crate) crop_size: u32,
    pub(crate) brightness_min: u32,
    pub(crate) brightness_max: u32,
    pub(crate) samples_per_second: f64,
    pub(crate) write_failure_policy: WriteFailurePolicy,
    pub(crate) seed: Option<u64>,
    pub(crate) resize_filter: FilterType,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N ticks).
    pub(crate) batch_size: u64,
}

impl Debug for PipelineOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PipelineOptions")
            .field("output_directory", &self.output_directory)
            .field("run_token", &self.run_token)
            .field("crop_size", &self.crop_size)
            .field("brightness_min", &self.brightness_min)
            .field("brightness_max", &self.brightness_max)
            .field("samples_per_second", &self.samples_per_second)
            .field("write_failure_policy", &self.write_failure_policy)
            .field("seed", &self.seed)
            .field("resize_filter", &self.resize_filter)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl PipelineOptions {
    /// Default options writing into `output_directory`.
    ///
    /// The run token is derived from the current time.
    pub fn new<P: AsRef<Path>>(output_directory: P) -> Self {
        Self {
            output_directory: output_directory.as_ref().to_path_buf(),
            run_token: RunToken::from_system_time(),
            crop_size: DEFAULT_CROP_SIZE,
            brightness_min: DEFAULT_BRIGHTNESS_MIN,
            brightness_max: DEFAULT_BRIGHTNESS_MAX,
            samples_per_second: DEFAULT_SAMPLES_PER_SECOND,
            write_failure_policy: WriteFailurePolicy::default(),
            seed: None,
            resize_filter: FilterType::Triangle,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
        }
    }

    /// Set the side length of output images.
    #[must_use]
    pub fn with_crop_size(mut self, crop_size: u32) -> Self {
        self.crop_size = crop_size;
        self
    }

    /// Set the exclusive brightness bounds on the 0–255 scale.
    #[must_use]
    pub fn with_brightness(mut self, min: u32, max: u32) -> Self {
        self.brightness_min = min;
        self.brightness_max = max;
        self
    }

    /// Set how many frames are sampled per second of video.
    #[must_use]
    pub fn with_samples_per_second(mut self, rate: f64) -> Self {
        self.samples_per_second = rate;
        self
    }

    /// Use an explicit run token instead of the time-derived one.
    #[must_use]
    pub fn with_run_token(mut self, token: RunToken) -> Self {
        self.run_token = token;
        self
    }

    /// Choose what happens when a frame cannot be written.
    #[must_use]
    pub fn with_write_failure_policy(mut self, policy: WriteFailurePolicy) -> Self {
        self.write_failure_policy = policy;
        self
    }

    /// Seed the crop random generator for reproducible runs.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the resampling filter used by the resize step.
    #[must_use]
    pub fn with_resize_filter(mut self, filter: FilterType) -> Self {
        self.resize_filter = filter;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled, the run stops before its next tick and
    /// returns [`Vid2TrainError::Cancelled`].
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Directory output files are written into.
    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    /// Token embedded in every output file name.
    pub fn run_token(&self) -> &RunToken {
        &self.run_token
    }

    /// Side length of output images.
    pub fn crop_size(&self) -> u32 {
        self.crop_size
    }

    /// Samples taken per second of video.
    pub fn samples_per_second(&self) -> f64 {
        self.samples_per_second
    }

    /// Policy applied when a frame cannot be written.
    pub fn write_failure_policy(&self) -> WriteFailurePolicy {
        self.write_failure_policy
    }

    /// Check every bound.
    ///
    /// # Errors
    ///
    /// Returns [`Vid2TrainError::InvalidConfiguration`] if the crop size is
    /// zero, the brightness bounds are out of range, or the sampling rate is
    /// not a positive finite number.
    pub fn validate(&self) -> Result<(), Vid2TrainError> {
        self.crop_resize()?;
        self.brightness_range()?;
        if !(self.samples_per_second.is_finite() && self.samples_per_second > 0.0) {
            return Err(Vid2TrainError::InvalidConfiguration(format!(
                "samples per second must be positive, got {}",
                self.samples_per_second
            )));
        }
        Ok(())
    }

    pub(crate) fn brightness_range(&self) -> Result<BrightnessRange, Vid2TrainError> {
        BrightnessRange::new(self.brightness_min, self.brightness_max)
    }

    pub(crate) fn crop_resize(&self) -> Result<CropResize, Vid2TrainError> {
        Ok(CropResize::new(self.crop_size)?.with_filter(self.resize_filter))
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
