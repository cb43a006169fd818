//! The run orchestrator.
//!
//! [`Pipeline`] walks a [`FrameSampler`] over a source, classifies each
//! candidate with the [`BrightnessFilter`], transforms accepted frames with
//! [`CropResize`] and hands them to a [`FrameSink`]. It owns the
//! [`RunCounters`] for the run and returns them in a [`RunSummary`].
//!
//! # Example
//!
//! ```no_run
//! use vid2train::{DirectorySink, Pipeline, PipelineOptions, VideoFile};
//!
//! let options = PipelineOptions::new("frames").with_seed(1);
//! let pipeline = Pipeline::new(options)?;
//! let video = VideoFile::open("input.mp4")?;
//! let mut sink = DirectorySink::create("frames")?;
//! let summary = pipeline.run(video, &mut sink)?;
//! println!("{} kept, {} skipped", summary.accepted, summary.rejected);
//! # Ok::<(), vid2train::Vid2TrainError>(())
//! ```

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use image::RgbImage;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    brightness::{BrightnessFilter, BrightnessVerdict, mean_luminance},
    configuration::{PipelineOptions, WriteFailurePolicy},
    error::Vid2TrainError,
    persistence::{DirectorySink, FrameSink, output_file_name},
    progress::ProgressTracker,
    sampler::{CandidateFrame, FrameSampler, SampleTick},
    source::VideoSource,
    transform::{CropResize, RandomSource},
    video::VideoFile,
};

/// Accepted and rejected frame counts for one run.
///
/// Each tick that reaches a verdict increments exactly one of the two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    accepted: u64,
    rejected: u64,
}

impl RunCounters {
    /// Frames written so far.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Frames skipped so far (dark, bright, undecodable or unwritable).
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Ticks that have reached a verdict.
    pub fn total(&self) -> u64 {
        self.accepted + self.rejected
    }

    fn record_accepted(&mut self) {
        self.accepted += 1;
    }

    fn record_rejected(&mut self) {
        self.rejected += 1;
    }
}

/// Result of a finished run.
#[derive(Debug, Clone)]
#[must_use]
pub struct RunSummary {
    /// Frames written.
    pub accepted: u64,
    /// Frames skipped.
    pub rejected: u64,
    /// Ticks in the sampling schedule.
    pub ticks: u64,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// Paths of the written files, in write order.
    pub written: Vec<PathBuf>,
}

/// Sampler → brightness filter → crop-resize → sink.
#[derive(Debug, Clone)]
pub struct Pipeline {
    options: PipelineOptions,
    filter: BrightnessFilter,
    transform: CropResize,
}

impl Pipeline {
    /// Build a pipeline from validated options.
    ///
    /// # Errors
    ///
    /// Returns [`Vid2TrainError::InvalidConfiguration`] if the options do
    /// not validate.
    pub fn new(options: PipelineOptions) -> Result<Self, Vid2TrainError> {
        options.validate()?;
        let filter = BrightnessFilter::new(options.brightness_range()?);
        let transform = options.crop_resize()?;
        Ok(Self {
            options,
            filter,
            transform,
        })
    }

    /// Options this pipeline was built with.
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run over `source`, drawing crop positions from a generator seeded by
    /// [`PipelineOptions::with_seed`] or from OS entropy.
    ///
    /// The source is dropped, and thereby released, when the run ends.
    ///
    /// # Errors
    ///
    /// - [`Vid2TrainError::Cancelled`] if the cancellation token fires.
    /// - [`Vid2TrainError::FrameWrite`] if a frame cannot be written and the
    ///   policy is [`WriteFailurePolicy::Abort`].
    pub fn run<S, K>(&self, source: S, sink: &mut K) -> Result<RunSummary, Vid2TrainError>
    where
        S: VideoSource,
        K: FrameSink + ?Sized,
    {
        let mut rng = match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.run_with_rng(source, sink, &mut rng)
    }

    /// Run over `source` with an explicit random source for crop placement.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Pipeline::run).
    pub fn run_with_rng<S, K, R>(
        &self,
        source: S,
        sink: &mut K,
        rng: &mut R,
    ) -> Result<RunSummary, Vid2TrainError>
    where
        S: VideoSource,
        K: FrameSink + ?Sized,
        R: RandomSource + ?Sized,
    {
        let mut sampler = FrameSampler::new(source, self.options.samples_per_second);
        let ticks = sampler.schedule().len();

        log::info!(
            "Sampling {ticks} frame(s) at {} per second, crop {}px, brightness ({}, {})",
            self.options.samples_per_second,
            self.transform.crop_size(),
            self.filter.range().min(),
            self.filter.range().max(),
        );

        let mut counters = RunCounters::default();
        let mut written = Vec::new();
        let mut tracker =
            ProgressTracker::new(self.options.progress.clone(), ticks, self.options.batch_size);

        loop {
            if self.options.is_cancelled() {
                log::info!("Run cancelled after {} tick(s)", counters.total());
                return Err(Vid2TrainError::Cancelled);
            }

            let Some(sample) = sampler.next() else {
                break;
            };

            let frame_index = match sample {
                Ok(candidate) => {
                    let frame_index = candidate.tick.frame_index;
                    if let Some(path) = self.process(candidate, sink, rng, &mut counters)? {
                        written.push(path);
                    }
                    frame_index
                }
                Err(failure) => {
                    log::warn!(
                        "Skipping tick {} (frame {}): {}",
                        failure.tick.index,
                        failure.tick.frame_index,
                        failure.error,
                    );
                    counters.record_rejected();
                    failure.tick.frame_index
                }
            };

            tracker.advance(frame_index, counters.accepted(), counters.rejected());
        }

        tracker.finish(counters.accepted(), counters.rejected());

        log::info!("Total images created: {}", counters.accepted());
        log::info!("Total frames skipped: {}", counters.rejected());

        Ok(RunSummary {
            accepted: counters.accepted(),
            rejected: counters.rejected(),
            ticks,
            elapsed: tracker.elapsed(),
            written,
        })
    }

    /// Filter, transform and save one decoded frame.
    ///
    /// Returns the written path, or `None` if the frame was rejected.
    fn process<K, R>(
        &self,
        candidate: CandidateFrame,
        sink: &mut K,
        rng: &mut R,
        counters: &mut RunCounters,
    ) -> Result<Option<PathBuf>, Vid2TrainError>
    where
        K: FrameSink + ?Sized,
        R: RandomSource + ?Sized,
    {
        let CandidateFrame { tick, image } = candidate;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            let error = Vid2TrainError::InvalidFrame { width, height };
            log::warn!("Skipping frame {}: {error}", tick.frame_index);
            counters.record_rejected();
            return Ok(None);
        }

        let mean = mean_luminance(&image);
        if self.filter.verdict_for(mean) == BrightnessVerdict::Reject {
            log::debug!(
                "Rejecting frame {} with mean luminance {mean:.2}",
                tick.frame_index
            );
            counters.record_rejected();
            return Ok(None);
        }

        // Dimensions were checked above, so the crop window always exists.
        let transformed = self.transform.apply(&image, rng)?;

        self.save(tick, &transformed, sink, counters)
    }

    fn save<K>(
        &self,
        tick: SampleTick,
        transformed: &RgbImage,
        sink: &mut K,
        counters: &mut RunCounters,
    ) -> Result<Option<PathBuf>, Vid2TrainError>
    where
        K: FrameSink + ?Sized,
    {
        let file_name = output_file_name(counters.accepted(), &self.options.run_token);

        match sink.save(transformed, &file_name) {
            Ok(path) => {
                log::debug!("Saved frame {} -> {}", tick.frame_index, path.display());
                counters.record_accepted();
                Ok(Some(path))
            }
            Err(error) => match self.options.write_failure_policy {
                WriteFailurePolicy::Abort => Err(error),
                WriteFailurePolicy::Skip => {
                    log::warn!("Skipping frame {}: {error}", tick.frame_index);
                    counters.record_rejected();
                    Ok(None)
                }
            },
        }
    }
}

/// Open `path`, create the output directory and run the pipeline over the
/// whole video.
///
/// # Errors
///
/// - [`Vid2TrainError::InvalidConfiguration`] if `options` do not validate.
/// - [`Vid2TrainError::FileOpen`] / [`Vid2TrainError::NoVideoStream`] if
///   the video cannot be opened; nothing is sampled in that case.
/// - [`Vid2TrainError::IoError`] if the output directory cannot be created.
/// - Any error from [`Pipeline::run`].
pub fn extract<P: AsRef<Path>>(
    path: P,
    options: &PipelineOptions,
) -> Result<RunSummary, Vid2TrainError> {
    let pipeline = Pipeline::new(options.clone())?;
    let video = VideoFile::open(path)?;
    let mut sink = DirectorySink::create(options.output_directory())?;
    pipeline.run(video, &mut sink)
}
