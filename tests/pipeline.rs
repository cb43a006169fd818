//! End-to-end pipeline tests over synthetic videos.

mod common;

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use common::{FlakySink, Lowest, MemorySink, Scripted, SyntheticVideo};
use vid2train::{
    CancellationToken, DirectorySink, Pipeline, PipelineOptions, ProgressCallback, ProgressInfo,
    RunToken, Vid2TrainError, WriteFailurePolicy,
};

fn options(directory: &str) -> PipelineOptions {
    PipelineOptions::new(directory)
        .with_crop_size(32)
        .with_brightness(20, 236)
        .with_samples_per_second(1.0)
        .with_run_token(RunToken::new("905123"))
        .with_seed(3)
}

/// Gray level cycles through dark, normal, bright, normal by second.
fn cycling_level(frame_index: u64) -> u8 {
    match (frame_index / 30) % 4 {
        0 => 10,
        1 => 128,
        2 => 250,
        _ => 100,
    }
}

#[test]
fn counts_and_names_follow_the_verdicts() {
    let video = SyntheticVideo::new(30.0, 300, 64, 48).with_level(cycling_level);
    let pipeline = Pipeline::new(options("unused")).expect("valid options");
    let mut sink = MemorySink::default();

    let summary = pipeline
        .run_with_rng(video, &mut sink, &mut Lowest)
        .expect("run succeeds");

    // Seconds 0..10 map to levels 10,128,250,100,10,128,250,100,10,128.
    assert_eq!(summary.ticks, 10);
    assert_eq!(summary.accepted, 5);
    assert_eq!(summary.rejected, 5);

    let names: Vec<&str> = sink.saved.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "0-905123.png",
            "1-905123.png",
            "2-905123.png",
            "3-905123.png",
            "4-905123.png"
        ]
    );
    assert!(sink
        .saved
        .iter()
        .all(|(_, image)| image.dimensions() == (32, 32)));
}

#[test]
fn decode_failures_count_as_rejected() {
    let video = SyntheticVideo::new(30.0, 300, 64, 64).failing_at(&[0, 150, 270]);
    let pipeline = Pipeline::new(options("unused")).expect("valid options");
    let mut sink = MemorySink::default();

    let summary = pipeline.run(video, &mut sink).expect("run succeeds");
    assert_eq!(summary.accepted, 7);
    assert_eq!(summary.rejected, 3);
    assert_eq!(summary.accepted + summary.rejected, summary.ticks);
    assert_eq!(sink.saved[0].0, "0-905123.png");
}

#[test]
fn empty_video_is_an_empty_run() {
    let video = SyntheticVideo::new(30.0, 0, 64, 64);
    let pipeline = Pipeline::new(options("unused")).expect("valid options");
    let mut sink = MemorySink::default();

    let summary = pipeline.run(video, &mut sink).expect("run succeeds");
    assert_eq!(summary.ticks, 0);
    assert_eq!(summary.accepted, 0);
    assert_eq!(summary.rejected, 0);
    assert!(sink.saved.is_empty());
}

#[test]
fn zero_frame_rate_is_an_empty_run() {
    let video = SyntheticVideo::new(0.0, 300, 64, 64);
    let pipeline = Pipeline::new(options("unused")).expect("valid options");
    let summary = pipeline
        .run(video, &mut MemorySink::default())
        .expect("run succeeds");
    assert_eq!((summary.accepted, summary.rejected), (0, 0));
}

#[test]
fn small_frames_are_upscaled_to_the_crop_size() {
    let video = SyntheticVideo::new(1.0, 2, 256, 256);
    let pipeline =
        Pipeline::new(options("unused").with_crop_size(512)).expect("valid options");
    let mut sink = MemorySink::default();

    pipeline.run(video, &mut sink).expect("run succeeds");
    assert_eq!(sink.saved.len(), 2);
    assert!(sink
        .saved
        .iter()
        .all(|(_, image)| image.dimensions() == (512, 512)));
}

#[test]
fn zero_sized_frames_are_rejected_without_drawing_a_crop() {
    let video = SyntheticVideo::new(30.0, 90, 0, 48);
    let pipeline = Pipeline::new(options("unused")).expect("valid options");
    let mut sink = MemorySink::default();
    let mut rng = Scripted::default();

    let summary = pipeline
        .run_with_rng(video, &mut sink, &mut rng)
        .expect("zero-sized frames do not end the run");
    assert_eq!(summary.ticks, 3);
    assert_eq!(summary.accepted, 0);
    assert_eq!(summary.rejected, 3);
    assert!(rng.draws.is_empty());
    assert!(sink.saved.is_empty());
}

#[test]
fn summary_lists_written_paths_in_order() {
    let video = SyntheticVideo::new(30.0, 300, 64, 48).with_level(cycling_level);
    let pipeline = Pipeline::new(options("unused")).expect("valid options");

    let summary = pipeline
        .run(video, &mut MemorySink::default())
        .expect("run succeeds");
    let written: Vec<String> = summary
        .written
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    assert_eq!(written.len() as u64, summary.accepted);
    assert_eq!(written.first().map(String::as_str), Some("0-905123.png"));
    assert_eq!(written.last().map(String::as_str), Some("4-905123.png"));
}

#[test]
fn file_names_are_unique_within_a_run() {
    let video = SyntheticVideo::new(10.0, 500, 40, 40);
    let pipeline =
        Pipeline::new(options("unused").with_samples_per_second(5.0)).expect("valid options");
    let mut sink = MemorySink::default();

    let summary = pipeline.run(video, &mut sink).expect("run succeeds");
    let names: HashSet<&str> = sink.saved.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(summary.accepted, 250);
    assert_eq!(names.len() as u64, summary.accepted);
}

#[test]
fn write_failure_aborts_by_default() {
    let video = SyntheticVideo::new(30.0, 300, 64, 64);
    let pipeline = Pipeline::new(options("unused")).expect("valid options");
    let mut sink = FlakySink::failing_every(3);

    let error = pipeline
        .run(video, &mut sink)
        .expect_err("third save fails");
    assert!(matches!(error, Vid2TrainError::FrameWrite { .. }));
    assert_eq!(sink.saved, vec!["0-905123.png", "1-905123.png"]);
}

#[test]
fn write_failure_can_be_skipped() {
    let video = SyntheticVideo::new(30.0, 300, 64, 64);
    let pipeline =
        Pipeline::new(options("unused").with_write_failure_policy(WriteFailurePolicy::Skip))
            .expect("valid options");
    let mut sink = FlakySink::failing_every(3);

    let summary = pipeline.run(video, &mut sink).expect("run succeeds");
    // Attempts 3, 6 and 9 fail; the counter only moves on success, so the
    // retried name is reused by the next accepted frame.
    assert_eq!(sink.attempts, 10);
    assert_eq!(summary.accepted, 7);
    assert_eq!(summary.rejected, 3);
    assert_eq!(
        sink.saved,
        (0..7).map(|index| format!("{index}-905123.png")).collect::<Vec<_>>()
    );
}

#[test]
fn cancelled_run_stops_before_sampling() {
    let token = CancellationToken::new();
    token.cancel();

    let mut video = SyntheticVideo::new(30.0, 300, 64, 64);
    let pipeline =
        Pipeline::new(options("unused").with_cancellation(token)).expect("valid options");

    let result = pipeline.run(&mut video, &mut MemorySink::default());
    assert!(matches!(result, Err(Vid2TrainError::Cancelled)));
    assert!(video.seeks.is_empty());
}

#[test]
fn borrowed_source_is_left_with_the_caller() {
    let mut video = SyntheticVideo::new(2.0, 10, 64, 64);
    let pipeline = Pipeline::new(options("unused")).expect("valid options");

    pipeline
        .run(&mut video, &mut MemorySink::default())
        .expect("run succeeds");
    assert_eq!(video.seeks, vec![0, 2, 4, 6, 8]);
}

#[derive(Default)]
struct Recorder {
    reports: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for Recorder {
    fn on_progress(&self, info: &ProgressInfo) {
        self.reports
            .lock()
            .expect("progress lock")
            .push(info.clone());
    }
}

#[test]
fn progress_is_reported_per_batch_and_at_the_end() {
    let recorder = Arc::new(Recorder::default());
    let video = SyntheticVideo::new(30.0, 300, 64, 48).with_level(cycling_level);
    let pipeline = Pipeline::new(
        options("unused")
            .with_progress(recorder.clone())
            .with_batch_size(4),
    )
    .expect("valid options");

    pipeline
        .run(video, &mut MemorySink::default())
        .expect("run succeeds");

    let reports = recorder.reports.lock().expect("progress lock");
    let positions: Vec<u64> = reports.iter().map(|info| info.current).collect();
    assert_eq!(positions, vec![4, 8, 10]);

    let last = reports.last().expect("final report");
    assert_eq!(last.total, 10);
    assert_eq!(last.percentage, Some(100.0));
    assert_eq!(last.accepted + last.rejected, 10);
    assert!(last.current_frame.is_none());
}

#[test]
fn seeded_runs_are_reproducible() {
    let run = || {
        let video = SyntheticVideo::new(5.0, 20, 120, 80).with_level(|index| (index * 10 + 30) as u8);
        let pipeline = Pipeline::new(options("unused").with_seed(11)).expect("valid options");
        let mut sink = MemorySink::default();
        pipeline.run(video, &mut sink).expect("run succeeds");
        sink.saved
    };
    assert_eq!(run(), run());
}

#[test]
fn directory_sink_writes_png_files() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output = temporary_directory.path().join("nested").join("frames");

    let video = SyntheticVideo::new(1.0, 3, 50, 40);
    let pipeline = Pipeline::new(
        PipelineOptions::new(&output)
            .with_crop_size(24)
            .with_run_token(RunToken::new("tok")),
    )
    .expect("valid options");
    let mut sink = DirectorySink::create(&output).expect("create output directory");

    let summary = pipeline.run(video, &mut sink).expect("run succeeds");
    assert_eq!(summary.accepted, 3);
    for index in 0..3 {
        let path = output.join(format!("{index}-tok.png"));
        assert!(path.exists(), "{} missing", path.display());
        let image = image::open(&path).expect("readable png");
        assert_eq!((image.width(), image.height()), (24, 24));
    }
    assert_eq!(summary.written.len(), 3);
}

#[test]
fn unwritable_directory_reports_a_write_error() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let missing = temporary_directory.path().join("does-not-exist");

    let video = SyntheticVideo::new(1.0, 2, 32, 32);
    let pipeline = Pipeline::new(PipelineOptions::new(&missing).with_crop_size(16))
        .expect("valid options");
    let mut sink = DirectorySink::new(&missing);

    let error = pipeline
        .run(video, &mut sink)
        .expect_err("directory is missing");
    assert!(
        error.to_string().contains("Failed to write frame"),
        "unexpected error: {error}"
    );
}
