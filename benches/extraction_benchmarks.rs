//! Benchmarks for decoding, selection, and JPEG output.
//!
//! Run with: cargo bench
//! Run with all features: cargo bench --all-features
//!
//! The FFmpeg benchmarks require fixture files from
//! `tests/fixtures/generate_fixtures.sh`; the synthetic ones always run.

use std::{hint::black_box, path::Path, time::Duration};

use criterion::{BenchmarkId, Criterion};
use framegrab::{
    ExtractOptions, ExtractionController, ExtractionRequest, FfmpegLogLevel, FrameSource,
    FrameWindow, SyntheticSource, VideoDecoder,
};

#[cfg(feature = "async")]
use framegrab::ExtractionTask;
#[cfg(feature = "async")]
use tokio::runtime::Runtime;

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

fn benchmark_frame_window(criterion: &mut Criterion) {
    criterion.bench_function("frame window from times", |bencher| {
        bencher.iter(|| FrameWindow::from_times(black_box(29.97), black_box(1.5), black_box(3.2)));
    });

    let window = FrameWindow::from_times(30.0, 0.0, 10.0);
    criterion.bench_function("progress percent over 300 frames", |bencher| {
        bencher.iter(|| {
            (1..=300_u64)
                .map(|index| u64::from(window.progress_percent(black_box(index))))
                .sum::<u64>()
        });
    });
}

fn benchmark_synthetic_extraction(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("synthetic extraction");
    group.sample_size(20);

    for size in [16_u32, 320] {
        group.bench_with_input(BenchmarkId::new("21 frames", size), &size, |bencher, &size| {
            let destination = tempfile::tempdir().unwrap();
            let request = ExtractionRequest::new("synthetic", 10.0, 1.0, 3.0, destination.path());
            let controller = ExtractionController::new();
            bencher.iter(|| {
                controller
                    .start_with(&request, &ExtractOptions::new(), |_| {
                        Ok(SyntheticSource::new(10.0, 100).with_dimensions(size, size * 3 / 4))
                    })
                    .unwrap()
            });
        });
    }

    group.bench_function("skip 1000 frames before window", |bencher| {
        let destination = tempfile::tempdir().unwrap();
        let request = ExtractionRequest::new("synthetic", 10.0, 100.0, 100.0, destination.path());
        let controller = ExtractionController::new();
        bencher.iter(|| {
            controller
                .start_with(&request, &ExtractOptions::new(), |_| {
                    Ok(SyntheticSource::new(10.0, 2000))
                })
                .unwrap()
        });
    });

    group.finish();
}

fn benchmark_decoding(criterion: &mut Criterion) {
    framegrab::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    criterion.bench_function("open and probe", |bencher| {
        bencher.iter(|| framegrab::probe(SAMPLE_VIDEO).unwrap());
    });

    let mut group = criterion.benchmark_group("decoding");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("decode all frames", |bencher| {
        bencher.iter(|| {
            let mut decoder = VideoDecoder::open(SAMPLE_VIDEO).unwrap();
            let mut count = 0_u64;
            while decoder.next_frame().unwrap().is_some() {
                count += 1;
            }
            decoder.close();
            count
        });
    });

    group.bench_function("extract 1s..3s at 10 fps", |bencher| {
        let destination = tempfile::tempdir().unwrap();
        let request = ExtractionRequest::new(SAMPLE_VIDEO, 10.0, 1.0, 3.0, destination.path());
        let controller = ExtractionController::new();
        bencher.iter(|| controller.start(&request).unwrap());
    });

    group.finish();
}

#[cfg(feature = "async")]
fn benchmark_async(criterion: &mut Criterion) {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let runtime = Runtime::new().unwrap();
    let destination = tempfile::tempdir().unwrap();
    let request = ExtractionRequest::new(SAMPLE_VIDEO, 10.0, 1.0, 3.0, destination.path());

    let mut group = criterion.benchmark_group("async");
    group.sample_size(10);
    group.bench_function("extraction task 1s..3s", |bencher| {
        bencher.iter(|| {
            runtime.block_on(async {
                ExtractionTask::spawn(request.clone(), ExtractOptions::new())
                    .await
                    .unwrap()
            })
        });
    });
    group.finish();
}

#[cfg(not(feature = "async"))]
fn benchmark_async(_criterion: &mut Criterion) {}

criterion::criterion_group!(
    benches,
    benchmark_frame_window,
    benchmark_synthetic_extraction,
    benchmark_decoding,
    benchmark_async,
);
criterion::criterion_main!(benches);
