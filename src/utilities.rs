//! Internal utility functions.
//!
//! Helpers for pixel-data copying and frame/timestamp conversion shared by
//! the FFmpeg-backed source.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy pixel data from an RGB24 FFmpeg frame into a tightly-packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × 3).
/// The result can be passed directly to [`image::RgbImage::from_raw`].
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    strip_stride(
        video_frame.data(0),
        video_frame.stride(0),
        width as usize * 3,
        height as usize,
    )
}

/// Drop the padding at the end of each `stride`-byte row.
fn strip_stride(data: &[u8], stride: usize, row_bytes: usize, rows: usize) -> Vec<u8> {
    if stride == row_bytes {
        return data[..row_bytes * rows].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_bytes * rows);
    for row in 0..rows {
        let row_start = row * stride;
        buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    buffer
}

/// Convert a rational frame rate to frames per second, `0.0` if undefined.
pub(crate) fn rational_to_f64(rate: Rational) -> f64 {
    if rate.denominator() == 0 {
        0.0
    } else {
        rate.numerator() as f64 / rate.denominator() as f64
    }
}

/// Sentinel FFmpeg uses for an unset timestamp (`AV_NOPTS_VALUE`).
const NO_PTS: i64 = i64::MIN;

/// Stream start time in stream time-base units, `0` when unset.
pub(crate) fn start_pts(raw_start_time: i64) -> i64 {
    if raw_start_time == NO_PTS {
        0
    } else {
        raw_start_time
    }
}

/// Convert a PTS value in `time_base` units to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    if time_base.denominator() == 0 {
        return 0.0;
    }
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Convert a frame number to a seek timestamp in AV_TIME_BASE (microseconds).
///
/// `Input::seek` with no stream selected expects container-level
/// timestamps, so the stream time base is bypassed entirely. Frame 0 sits
/// at `start_seconds`, the stream's start time.
pub(crate) fn frame_number_to_seek_timestamp(
    frame_number: u64,
    frames_per_second: f64,
    start_seconds: f64,
) -> i64 {
    let seconds = start_seconds + frame_number as f64 / frames_per_second;
    (seconds * 1_000_000.0).round() as i64
}

/// Rescale a PTS value to the nearest frame number, counting from
/// `start_pts`.
///
/// Rounding absorbs the error of non-integer rates such as 30000/1001,
/// where exact frame timestamps can land a hair below the frame boundary.
pub(crate) fn pts_to_frame_number(
    pts: i64,
    start_pts: i64,
    time_base: Rational,
    frames_per_second: f64,
) -> u64 {
    let seconds = pts_to_seconds(pts.saturating_sub(start_pts), time_base);
    (seconds * frames_per_second).round().max(0.0) as u64
}
