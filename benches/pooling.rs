use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pixel_pipeline::PixelBuffer;
use pixel_pipeline::utils::pooling::{average_pooling, max_pooling};

fn sample(width: usize, height: usize) -> PixelBuffer {
    let bytes: Vec<u8> = (0..width * height * 4).map(|i| (i * 7 % 256) as u8).collect();
    PixelBuffer::from_flat_bytes(&bytes, width, height).unwrap()
}

fn bench_average_pooling_medium(c: &mut Criterion) {
    let image = sample(640, 480);
    c.bench_function("average_pooling_640x480_8", |b| {
        b.iter(|| {
            let mut buf = image.clone();
            average_pooling(black_box(&mut buf), black_box(8)).unwrap();
            buf
        })
    });
}

fn bench_max_pooling_medium(c: &mut Criterion) {
    let image = sample(640, 480);
    c.bench_function("max_pooling_640x480_8", |b| {
        b.iter(|| {
            let mut buf = image.clone();
            max_pooling(black_box(&mut buf), black_box(8)).unwrap();
            buf
        })
    });
}

criterion_group!(benches, bench_average_pooling_medium, bench_max_pooling_medium);
criterion_main!(benches);
