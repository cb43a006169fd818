//! FFmpeg-backed video source.
//!
//! [`VideoFile`] opens a container with `ffmpeg-next`, picks the best video
//! stream, caches its [`VideoMetadata`] and implements
//! [`VideoSource`] by seeking to the nearest keyframe before a requested
//! frame and decoding forward until that frame is reached.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::{error::Vid2TrainError, metadata::VideoMetadata, source::VideoSource, utilities};

/// An opened video file.
///
/// Holds the demuxer, a decoder for the best video stream and a lazily
/// created RGB24 scaler. Everything is released when the value is dropped.
///
/// # Example
///
/// ```no_run
/// use vid2train::{VideoFile, VideoSource};
///
/// let mut video = VideoFile::open("input.mp4")?;
/// let frame = video.seek_and_decode(0)?;
/// frame.save("first_frame.png")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct VideoFile {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: Option<(ScalingContext, (Pixel, u32, u32))>,
    video_stream_index: usize,
    time_base: Rational,
    start_pts: i64,
    metadata: VideoMetadata,
    file_path: PathBuf,
}

impl Debug for VideoFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFile")
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl VideoFile {
    /// Open a video file.
    ///
    /// Initializes FFmpeg (idempotent), opens the file, locates the best
    /// video stream and reads its metadata.
    ///
    /// # Errors
    ///
    /// - [`Vid2TrainError::FileOpen`] if the file cannot be opened or its
    ///   video decoder cannot be created.
    /// - [`Vid2TrainError::NoVideoStream`] if the file has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Vid2TrainError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening video file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| Vid2TrainError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| Vid2TrainError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(Vid2TrainError::NoVideoStream)?;
        let video_stream_index = stream.index();
        let time_base = stream.time_base();
        let start_pts = utilities::start_pts(stream.start_time());

        let decoder_context =
            CodecContext::from_parameters(stream.parameters()).map_err(|error| {
                Vid2TrainError::FileOpen {
                    path: file_path.clone(),
                    reason: format!("Failed to read video codec parameters: {error}"),
                }
            })?;
        let decoder =
            decoder_context
                .decoder()
                .video()
                .map_err(|error| Vid2TrainError::FileOpen {
                    path: file_path.clone(),
                    reason: format!("Failed to create video decoder: {error}"),
                })?;

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        // Prefer the average frame rate; fall back to the stream's base rate.
        let mut frames_per_second = utilities::rational_to_f64(stream.avg_frame_rate());
        if frames_per_second <= 0.0 {
            frames_per_second = utilities::rational_to_f64(stream.rate());
        }

        let frame_count = if stream.frames() > 0 {
            stream.frames() as u64
        } else if frames_per_second > 0.0 {
            (duration.as_secs_f64() * frames_per_second) as u64
        } else {
            0
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count,
            duration,
            codec,
        };

        log::debug!(
            "Video stream {video_stream_index}: {}x{} @ {:.3} fps, {} frames [{}], starts at {:.3}s",
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.codec,
            utilities::pts_to_seconds(start_pts, time_base),
        );

        Ok(Self {
            input_context,
            decoder,
            scaler: None,
            video_stream_index,
            time_base,
            start_pts,
            metadata,
            file_path,
        })
    }

    /// Metadata of the selected video stream.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Scale `decoded` to RGB24 and copy it into an [`RgbImage`].
    fn convert(&mut self, decoded: &VideoFrame) -> Result<RgbImage, Vid2TrainError> {
        let width = decoded.width();
        let height = decoded.height();
        if width == 0 || height == 0 {
            return Err(Vid2TrainError::InvalidFrame { width, height });
        }

        let key = (decoded.format(), width, height);
        if self.scaler.as_ref().is_none_or(|(_, cached)| *cached != key) {
            let scaler = ScalingContext::get(
                key.0,
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )?;
            self.scaler = Some((scaler, key));
        }
        let (scaler, _) = self.scaler.as_mut().ok_or_else(|| {
            Vid2TrainError::VideoDecodeError("RGB scaler is unavailable".to_string())
        })?;

        let mut rgb_frame = VideoFrame::empty();
        scaler.run(decoded, &mut rgb_frame)?;

        let buffer = utilities::frame_to_rgb_buffer(&rgb_frame, width, height);
        RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
            Vid2TrainError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })
    }
}

impl VideoSource for VideoFile {
    fn frames_per_second(&self) -> f64 {
        self.metadata.frames_per_second
    }

    fn frame_count(&self) -> u64 {
        self.metadata.frame_count
    }

    fn seek_and_decode(&mut self, frame_index: u64) -> Result<RgbImage, Vid2TrainError> {
        let frames_per_second = self.metadata.frames_per_second;
        if frames_per_second <= 0.0 {
            return Err(Vid2TrainError::VideoDecodeError(
                "Video stream has no usable frame rate".to_string(),
            ));
        }

        let video_stream_index = self.video_stream_index;
        let time_base = self.time_base;
        let start_pts = self.start_pts;

        // Seek to the nearest keyframe before the target frame. Frame 0 is
        // the first frame at or after the stream's start time.
        let target_timestamp = utilities::frame_number_to_seek_timestamp(
            frame_index,
            frames_per_second,
            utilities::pts_to_seconds(start_pts, time_base),
        );
        self.input_context
            .seek(target_timestamp, ..target_timestamp)?;
        self.decoder.flush();

        let reached = |frame: &VideoFrame| {
            let pts = frame.timestamp().or_else(|| frame.pts()).unwrap_or(start_pts);
            utilities::pts_to_frame_number(pts, start_pts, time_base, frames_per_second)
                >= frame_index
        };

        let mut decoded_frame = VideoFrame::empty();
        let mut found = false;

        // A frame past the target means the exact index does not exist; the
        // closest following frame is used instead.
        'packets: for (stream, packet) in self.input_context.packets() {
            if stream.index() != video_stream_index {
                continue;
            }

            self.decoder.send_packet(&packet)?;
            while self.decoder.receive_frame(&mut decoded_frame).is_ok() {
                if reached(&decoded_frame) {
                    found = true;
                    break 'packets;
                }
            }
        }

        if !found {
            self.decoder.send_eof()?;
            while self.decoder.receive_frame(&mut decoded_frame).is_ok() {
                if reached(&decoded_frame) {
                    found = true;
                    break;
                }
            }
        }

        if found {
            return self.convert(&decoded_frame);
        }

        Err(Vid2TrainError::VideoDecodeError(format!(
            "Could not locate frame {frame_index} in the video stream"
        )))
    }
}
