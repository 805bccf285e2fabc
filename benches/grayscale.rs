use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pixel_pipeline::utils::grayscale::{grayscale, grayscale_parallel};
use pixel_pipeline::{CpuExecutor, Executor, Operation, ParallelExecutor, PixelBuffer};

fn sample(width: usize, height: usize) -> PixelBuffer {
    let bytes: Vec<u8> = (0..width * height * 4).map(|i| (i % 251) as u8).collect();
    PixelBuffer::from_flat_bytes(&bytes, width, height).unwrap()
}

fn bench_grayscale_small(c: &mut Criterion) {
    let image = sample(100, 100);
    c.bench_function("grayscale_100x100", |b| {
        b.iter(|| {
            let mut buf = image.clone();
            grayscale(black_box(&mut buf));
            buf
        })
    });
}

fn bench_grayscale_medium(c: &mut Criterion) {
    let image = sample(640, 480);
    c.bench_function("grayscale_640x480", |b| {
        b.iter(|| {
            let mut buf = image.clone();
            grayscale(black_box(&mut buf));
            buf
        })
    });
}

fn bench_grayscale_parallel_large(c: &mut Criterion) {
    let image = sample(1920, 1080);
    c.bench_function("grayscale_parallel_1920x1080", |b| {
        b.iter(|| {
            let mut buf = image.clone();
            grayscale_parallel(black_box(&mut buf));
            buf
        })
    });
}

fn bench_executor_grayscale_medium(c: &mut Criterion) {
    let bytes = sample(640, 480).to_flat_bytes();
    c.bench_function("cpu_executor_grayscale_640x480", |b| {
        b.iter(|| CpuExecutor.execute(Operation::Grayscale, black_box(&bytes), None))
    });
    let parallel = ParallelExecutor::new();
    c.bench_function("parallel_executor_grayscale_640x480", |b| {
        b.iter(|| parallel.execute(Operation::Grayscale, black_box(&bytes), None))
    });
}

criterion_group!(
    benches,
    bench_grayscale_small,
    bench_grayscale_medium,
    bench_grayscale_parallel_large,
    bench_executor_grayscale_medium
);
criterion_main!(benches);
