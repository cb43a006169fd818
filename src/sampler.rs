//! Time-based frame sampling.
//!
//! Frames are picked by time, not by raw frame count: a video of `N` frames
//! at `F` native frames per second lasts `N / F` seconds, and sampling it at
//! `R` samples per second yields `floor((N / F) * R)` ticks. Tick `t` maps
//! to source frame `floor(t * F / R)`.
//!
//! [`SampleSchedule`] is the pure, restartable description of that mapping.
//! [`FrameSampler`] walks a schedule against a [`VideoSource`], seeking and
//! decoding one frame per tick as it is consumed.
//!
//! # Example
//!
//! ```
//! use vid2train::SampleSchedule;
//!
//! let schedule = SampleSchedule::new(30.0, 300, 1.0);
//! assert_eq!(schedule.len(), 10);
//! assert_eq!(schedule.iter().map(|tick| tick.frame_index).collect::<Vec<_>>(),
//!            vec![0, 30, 60, 90, 120, 150, 180, 210, 240, 270]);
//! ```

use image::RgbImage;

use crate::{error::Vid2TrainError, source::VideoSource};

/// One position in the sampled-time sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleTick {
    /// Position in the sequence, starting at 0.
    pub index: u64,
    /// Source frame this tick maps to.
    pub frame_index: u64,
}

/// The tick-to-frame mapping for one video at one sampling rate.
///
/// Degenerate inputs (no frames, a non-positive or non-finite frame rate or
/// sampling rate) produce an empty schedule instead of dividing by zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleSchedule {
    frames_per_second: f64,
    samples_per_second: f64,
    tick_count: u64,
}

impl SampleSchedule {
    /// Build the schedule for a video with the given native rate and frame
    /// count, sampled at `samples_per_second`.
    pub fn new(frames_per_second: f64, frame_count: u64, samples_per_second: f64) -> Self {
        let usable = frame_count > 0
            && frames_per_second.is_finite()
            && frames_per_second > 0.0
            && samples_per_second.is_finite()
            && samples_per_second > 0.0;

        let tick_count = if usable {
            let duration_seconds = frame_count as f64 / frames_per_second;
            (duration_seconds * samples_per_second).floor() as u64
        } else {
            0
        };

        Self {
            frames_per_second,
            samples_per_second,
            tick_count,
        }
    }

    /// Schedule for an opened source.
    pub fn for_source<S: VideoSource + ?Sized>(source: &S, samples_per_second: f64) -> Self {
        Self::new(
            source.frames_per_second(),
            source.frame_count(),
            samples_per_second,
        )
    }

    /// Number of ticks in the schedule.
    pub fn len(&self) -> u64 {
        self.tick_count
    }

    /// Returns `true` if the schedule has no ticks.
    pub fn is_empty(&self) -> bool {
        self.tick_count == 0
    }

    /// Source frame for tick `index`, or `None` past the end.
    pub fn tick(&self, index: u64) -> Option<SampleTick> {
        if index >= self.tick_count {
            return None;
        }
        let frame_index =
            (index as f64 * self.frames_per_second / self.samples_per_second).floor() as u64;
        Some(SampleTick { index, frame_index })
    }

    /// Iterate over every tick from the start.
    pub fn iter(&self) -> impl Iterator<Item = SampleTick> + '_ {
        (0..self.tick_count).filter_map(|index| self.tick(index))
    }
}

/// A decoded frame waiting for a brightness verdict.
#[derive(Debug, Clone)]
pub struct CandidateFrame {
    /// The tick this frame was sampled at.
    pub tick: SampleTick,
    /// Decoded RGB pixels.
    pub image: RgbImage,
}

/// A tick whose frame could not be decoded.
#[derive(Debug)]
pub struct DecodeFailure {
    /// The tick that failed.
    pub tick: SampleTick,
    /// Why decoding failed.
    pub error: Vid2TrainError,
}

/// A lazy, forward-only iterator of sampled frames.
///
/// Each call to [`next()`](Iterator::next) seeks the source to the next
/// tick's frame and decodes it. A failed decode is yielded as
/// `Err(DecodeFailure)` and iteration continues with the following tick;
/// the same index is never retried.
pub struct FrameSampler<S: VideoSource> {
    source: S,
    schedule: SampleSchedule,
    next_tick: u64,
}

impl<S: VideoSource> FrameSampler<S> {
    /// Sample `source` at `samples_per_second`.
    pub fn new(source: S, samples_per_second: f64) -> Self {
        let schedule = SampleSchedule::for_source(&source, samples_per_second);
        Self {
            source,
            schedule,
            next_tick: 0,
        }
    }

    /// The schedule being walked.
    pub fn schedule(&self) -> &SampleSchedule {
        &self.schedule
    }

    /// Give back the underlying source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: VideoSource> Iterator for FrameSampler<S> {
    type Item = Result<CandidateFrame, DecodeFailure>;

    fn next(&mut self) -> Option<Self::Item> {
        let tick = self.schedule.tick(self.next_tick)?;
        self.next_tick += 1;

        let result = match self.source.seek_and_decode(tick.frame_index) {
            Ok(image) => Ok(CandidateFrame { tick, image }),
            Err(error) => Err(DecodeFailure { tick, error }),
        };
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.schedule.len().saturating_sub(self.next_tick);
        let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}
