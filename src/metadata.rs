//! Video metadata types.
//!
//! [`VideoMetadata`] is read once when a [`VideoFile`](crate::VideoFile) is
//! opened and cached for the lifetime of the file. The sampler only needs
//! the frame rate and frame count; the remaining fields are reported by the
//! command-line front end.

use std::time::Duration;

/// Metadata for the selected video stream.
///
/// # Example
///
/// ```no_run
/// use vid2train::VideoFile;
///
/// let video = VideoFile::open("input.mp4").unwrap();
/// let metadata = video.metadata();
/// println!("{}x{} @ {:.2} fps", metadata.width, metadata.height, metadata.frames_per_second);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Native frames per second (may be approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Estimated total number of frames, computed from duration and frame rate.
    pub frame_count: u64,
    /// Container-level duration.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`, `"vp9"`, `"av1"`).
    pub codec: String,
}

impl VideoMetadata {
    /// Duration implied by the frame count and frame rate, in seconds.
    ///
    /// Returns `0.0` when the frame rate is unusable.
    pub fn frame_duration_seconds(&self) -> f64 {
        if self.frames_per_second > 0.0 && self.frames_per_second.is_finite() {
            self.frame_count as f64 / self.frames_per_second
        } else {
            0.0
        }
    }
}
