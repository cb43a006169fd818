//! Error types for the `vid2train` crate.
//!
//! This module defines [`Vid2TrainError`], the unified error type returned by
//! all fallible operations in the crate. Errors raised while decoding a
//! single sampled frame are not fatal: the pipeline counts that frame as
//! rejected and moves on.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `vid2train` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Vid2TrainError {
    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A sampled frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// A decoded frame has no pixels.
    #[error("Frame has unusable dimensions {width}x{height}")]
    InvalidFrame {
        /// Frame width in pixels.
        width: u32,
        /// Frame height in pixels.
        height: u32,
    },

    /// A transformed frame could not be written to disk.
    #[error("Failed to write frame to {path}: {source}")]
    FrameWrite {
        /// Destination that was being written.
        path: PathBuf,
        /// Error reported by the image encoder.
        #[source]
        source: ImageError,
    },

    /// The pipeline options are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The run was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate during frame conversion.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for Vid2TrainError {
    fn from(error: FfmpegError) -> Self {
        Vid2TrainError::FfmpegError(error.to_string())
    }
}
