use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pixel_pipeline::PixelBuffer;
use pixel_pipeline::utils::binarization::{
    otsu_threshold_histogram, otsu_threshold_naive, otsu_threshold_optimized, threshold_binarize,
};

fn bimodal(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| if i % 5 < 2 { 40 + (i % 17) as u8 } else { 190 + (i % 23) as u8 })
        .collect()
}

fn bench_otsu_naive_small(c: &mut Criterion) {
    let gray = bimodal(100 * 100);
    c.bench_function("otsu_naive_100x100", |b| {
        b.iter(|| otsu_threshold_naive(black_box(&gray)))
    });
}

fn bench_otsu_optimized_small(c: &mut Criterion) {
    let gray = bimodal(100 * 100);
    c.bench_function("otsu_optimized_100x100", |b| {
        b.iter(|| otsu_threshold_optimized(black_box(&gray)))
    });
}

fn bench_otsu_optimized_medium(c: &mut Criterion) {
    let gray = bimodal(640 * 480);
    c.bench_function("otsu_optimized_640x480", |b| {
        b.iter(|| otsu_threshold_optimized(black_box(&gray)))
    });
}

fn bench_otsu_histogram_medium(c: &mut Criterion) {
    let gray = bimodal(640 * 480);
    c.bench_function("otsu_histogram_640x480", |b| {
        b.iter(|| otsu_threshold_histogram(black_box(&gray)))
    });
}

fn bench_threshold_binarize_medium(c: &mut Criterion) {
    let bytes = vec![128u8; 640 * 480 * 4];
    let image = PixelBuffer::from_flat_bytes(&bytes, 640, 480).unwrap();
    c.bench_function("threshold_binarize_640x480", |b| {
        b.iter(|| {
            let mut buf = image.clone();
            threshold_binarize(black_box(&mut buf), black_box(128));
            buf
        })
    });
}

criterion_group!(
    benches,
    bench_otsu_naive_small,
    bench_otsu_optimized_small,
    bench_otsu_optimized_medium,
    bench_otsu_histogram_medium,
    bench_threshold_binarize_medium
);
criterion_main!(benches);
