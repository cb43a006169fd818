//! Shared test doubles: an in-memory video, fixed random sources and sinks.

#![allow(dead_code)]

use std::{collections::HashSet, path::PathBuf};

use image::{
    ImageError, Rgb, RgbImage,
    error::{ParameterError, ParameterErrorKind},
};
use vid2train::{FrameSink, RandomSource, Vid2TrainError, VideoSource};

/// A video whose frames are solid gray images.
///
/// The gray level of each frame comes from `level`, and indices in
/// `failing` fail to decode.
pub struct SyntheticVideo {
    pub frames_per_second: f64,
    pub frame_count: u64,
    pub width: u32,
    pub height: u32,
    pub level: fn(u64) -> u8,
    pub failing: HashSet<u64>,
    pub seeks: Vec<u64>,
}

impl SyntheticVideo {
    pub fn new(frames_per_second: f64, frame_count: u64, width: u32, height: u32) -> Self {
        Self {
            frames_per_second,
            frame_count,
            width,
            height,
            level: |_| 128,
            failing: HashSet::new(),
            seeks: Vec::new(),
        }
    }

    pub fn with_level(mut self, level: fn(u64) -> u8) -> Self {
        self.level = level;
        self
    }

    pub fn failing_at(mut self, indices: &[u64]) -> Self {
        self.failing.extend(indices.iter().copied());
        self
    }
}

impl VideoSource for SyntheticVideo {
    fn frames_per_second(&self) -> f64 {
        self.frames_per_second
    }

    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn seek_and_decode(&mut self, frame_index: u64) -> Result<RgbImage, Vid2TrainError> {
        self.seeks.push(frame_index);
        if self.failing.contains(&frame_index) {
            return Err(Vid2TrainError::VideoDecodeError(format!(
                "synthetic failure at {frame_index}"
            )));
        }
        let value = (self.level)(frame_index);
        Ok(RgbImage::from_pixel(
            self.width,
            self.height,
            Rgb([value, value, value]),
        ))
    }
}

/// Always answers the lowest value in the range.
pub struct Lowest;

impl RandomSource for Lowest {
    fn pick(&mut self, low: u32, _high: u32) -> u32 {
        low
    }
}

/// Always answers the highest value in the range.
pub struct Highest;

impl RandomSource for Highest {
    fn pick(&mut self, _low: u32, high: u32) -> u32 {
        high
    }
}

/// Records every draw and answers from a script, falling back to `low`.
#[derive(Default)]
pub struct Scripted {
    pub answers: Vec<u32>,
    pub draws: Vec<(u32, u32)>,
}

impl RandomSource for Scripted {
    fn pick(&mut self, low: u32, high: u32) -> u32 {
        self.draws.push((low, high));
        if self.answers.is_empty() {
            low
        } else {
            self.answers.remove(0).clamp(low, high)
        }
    }
}

/// Keeps saved images in memory.
#[derive(Default)]
pub struct MemorySink {
    pub saved: Vec<(String, RgbImage)>,
}

impl FrameSink for MemorySink {
    fn save(&mut self, image: &RgbImage, file_name: &str) -> Result<PathBuf, Vid2TrainError> {
        self.saved.push((file_name.to_string(), image.clone()));
        Ok(PathBuf::from(file_name))
    }
}

/// Fails every `every`th save (1-based), succeeds otherwise.
pub struct FlakySink {
    pub every: usize,
    pub attempts: usize,
    pub saved: Vec<String>,
}

impl FlakySink {
    pub fn failing_every(every: usize) -> Self {
        Self {
            every,
            attempts: 0,
            saved: Vec::new(),
        }
    }
}

impl FrameSink for FlakySink {
    fn save(&mut self, _image: &RgbImage, file_name: &str) -> Result<PathBuf, Vid2TrainError> {
        self.attempts += 1;
        if self.attempts % self.every == 0 {
            return Err(Vid2TrainError::FrameWrite {
                path: PathBuf::from(file_name),
                source: ImageError::Parameter(ParameterError::from_kind(
                    ParameterErrorKind::Generic("disk full".to_string()),
                )),
            });
        }
        self.saved.push(file_name.to_string());
        Ok(PathBuf::from(file_name))
    }
}

pub fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}
