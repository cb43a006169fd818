//! Benchmarks for the brightness filter, the crop-resize transform and a
//! full pipeline run.
//!
//! Run with: cargo bench
//!
//! The file-backed benchmark requires fixture files from
//! `tests/fixtures/generate_fixtures.sh`; the rest use synthetic frames.

use std::{hint::black_box, path::Path, path::PathBuf};

use criterion::Criterion;
use ffmpeg_next::util::log::Level as LogLevel;
use image::{Rgb, RgbImage};
use rand::{SeedableRng, rngs::StdRng};
use vid2train::{
    CropResize, FilterType, FrameSink, Pipeline, PipelineOptions, RunToken, Vid2TrainError,
    VideoFile, VideoSource, mean_luminance,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

fn full_hd_frame() -> RgbImage {
    RgbImage::from_fn(1920, 1080, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    })
}

/// Hands out the same frame for every seek.
struct StillVideo {
    frame: RgbImage,
}

impl VideoSource for StillVideo {
    fn frames_per_second(&self) -> f64 {
        30.0
    }

    fn frame_count(&self) -> u64 {
        300
    }

    fn seek_and_decode(&mut self, _frame_index: u64) -> Result<RgbImage, Vid2TrainError> {
        Ok(self.frame.clone())
    }
}

/// Drops every frame.
struct DiscardSink;

impl FrameSink for DiscardSink {
    fn save(&mut self, image: &RgbImage, file_name: &str) -> Result<PathBuf, Vid2TrainError> {
        black_box(image);
        Ok(PathBuf::from(file_name))
    }
}

fn benchmark_brightness(criterion: &mut Criterion) {
    let frame = full_hd_frame();
    criterion.bench_function("mean luminance (1920x1080)", |bencher| {
        bencher.iter(|| mean_luminance(black_box(&frame)));
    });
}

fn benchmark_crop_resize(criterion: &mut Criterion) {
    let frame = full_hd_frame();
    let mut group = criterion.benchmark_group("crop-resize to 512");

    for (name, filter) in [
        ("nearest", FilterType::Nearest),
        ("triangle", FilterType::Triangle),
        ("lanczos3", FilterType::Lanczos3),
    ] {
        let transform = CropResize::new(512).unwrap().with_filter(filter);
        group.bench_function(name, |bencher| {
            let mut rng = StdRng::seed_from_u64(0);
            bencher.iter(|| transform.apply(black_box(&frame), &mut rng).unwrap());
        });
    }

    group.finish();
}

fn benchmark_synthetic_run(criterion: &mut Criterion) {
    let frame = full_hd_frame();
    let pipeline = Pipeline::new(
        PipelineOptions::new("unused")
            .with_run_token(RunToken::new("bench"))
            .with_seed(0),
    )
    .unwrap();

    let mut group = criterion.benchmark_group("pipeline");
    group.sample_size(10);
    group.bench_function("10 ticks of a still 1080p video", |bencher| {
        bencher.iter(|| {
            let video = StillVideo {
                frame: frame.clone(),
            };
            pipeline.run(video, &mut DiscardSink).unwrap()
        });
    });
    group.finish();
}

fn benchmark_fixture_run(criterion: &mut Criterion) {
    ffmpeg_next::util::log::set_level(LogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let pipeline = Pipeline::new(
        PipelineOptions::new("unused")
            .with_crop_size(256)
            .with_run_token(RunToken::new("bench"))
            .with_seed(0),
    )
    .unwrap();

    let mut group = criterion.benchmark_group("pipeline");
    group.sample_size(10);
    group.bench_function("sample fixture video", |bencher| {
        bencher.iter(|| {
            let video = VideoFile::open(SAMPLE_VIDEO).unwrap();
            pipeline.run(video, &mut DiscardSink).unwrap()
        });
    });
    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_brightness,
    benchmark_crop_resize,
    benchmark_synthetic_run,
    benchmark_fixture_run,
);
criterion::criterion_main!(benches);
