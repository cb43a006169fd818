//! # vid2train
//!
//! Turn a video into a curated set of square still images for training
//! image models.
//!
//! A run samples the video at a fixed number of frames per second of
//! playback, rejects frames whose mean luminance is outside an exclusive
//! range, cuts a randomly sized and placed square out of each surviving
//! frame, resizes it to a fixed size and writes it as a PNG. Decoding is
//! done by FFmpeg via the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)
//! crate; image handling by [`image`](https://crates.io/crates/image).
//!
//! ## Quick Start
//!
//! ```no_run
//! use vid2train::PipelineOptions;
//!
//! let options = PipelineOptions::new("frames")
//!     .with_crop_size(512)
//!     .with_brightness(20, 236)
//!     .with_samples_per_second(1.0);
//! let summary = vid2train::extract("input.mp4", &options)?;
//! println!("Total images created: {}", summary.accepted);
//! println!("Total frames skipped: {}", summary.rejected);
//! # Ok::<(), vid2train::Vid2TrainError>(())
//! ```
//!
//! ## Stages
//!
//! - **Sampling**: [`SampleSchedule`] maps ticks to source frames by time;
//!   [`FrameSampler`] seeks and decodes lazily. Undecodable frames are
//!   counted as skipped.
//! - **Brightness filter**: [`BrightnessFilter`] accepts a frame iff
//!   `min < mean luminance < max`.
//! - **Crop and resize**: [`CropResize`] draws a square window of size
//!   `[crop, min(W, H)]` (or `min(W, H)` when the frame is smaller) and
//!   resizes it to `crop × crop`. Randomness comes from a [`RandomSource`].
//! - **Persistence**: a [`FrameSink`] stores each frame as
//!   `"{index}-{token}.png"`.
//!
//! Any [`VideoSource`] can drive the [`Pipeline`]; [`VideoFile`] is the
//! FFmpeg-backed one.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod brightness;
pub mod configuration;
pub mod error;
pub mod ffmpeg;
pub mod metadata;
pub mod persistence;
pub mod pipeline;
pub mod progress;
pub mod sampler;
pub mod source;
pub mod transform;
mod utilities;
pub mod video;

pub use brightness::{BrightnessFilter, BrightnessRange, BrightnessVerdict, mean_luminance};
pub use configuration::{
    DEFAULT_BRIGHTNESS_MAX, DEFAULT_BRIGHTNESS_MIN, DEFAULT_CROP_SIZE,
    DEFAULT_SAMPLES_PER_SECOND, PipelineOptions, WriteFailurePolicy,
};
pub use error::Vid2TrainError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use image::imageops::FilterType;
pub use metadata::VideoMetadata;
pub use persistence::{DirectorySink, FrameSink, RunToken, output_file_name};
pub use pipeline::{Pipeline, RunCounters, RunSummary, extract};
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use sampler::{CandidateFrame, DecodeFailure, FrameSampler, SampleSchedule, SampleTick};
pub use source::VideoSource;
pub use transform::{CropResize, CropWindow, RandomSource};
pub use video::VideoFile;
