//! The inbound video boundary.
//!
//! The pipeline never talks to FFmpeg directly. It drives anything that
//! implements [`VideoSource`]: the FFmpeg-backed [`VideoFile`](crate::VideoFile)
//! in production, or an in-memory source in tests.
//!
//! Releasing a source is tied to ownership: dropping it closes the
//! underlying stream on every exit path, including early returns from `?`.

use image::RgbImage;

use crate::error::Vid2TrainError;

/// A seekable video stream that can decode individual frames to RGB.
pub trait VideoSource {
    /// Native frame rate in frames per second.
    fn frames_per_second(&self) -> f64;

    /// Total number of frames in the stream.
    fn frame_count(&self) -> u64;

    /// Seek to `frame_index` and decode that frame as 8-bit RGB.
    ///
    /// # Errors
    ///
    /// Any error returned here is treated as a decode failure for that
    /// frame only; callers do not retry the same index.
    fn seek_and_decode(&mut self, frame_index: u64) -> Result<RgbImage, Vid2TrainError>;
}

impl<S: VideoSource + ?Sized> VideoSource for &mut S {
    fn frames_per_second(&self) -> f64 {
        (**self).frames_per_second()
    }

    fn frame_count(&self) -> u64 {
        (**self).frame_count()
    }

    fn seek_and_decode(&mut self, frame_index: u64) -> Result<RgbImage, Vid2TrainError> {
        (**self).seek_and_decode(frame_index)
    }
}
