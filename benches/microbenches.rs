//! Criterion microbenches for the hot pure functions.
//!
//! Run with: `cargo bench`

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;
use std::path::Path;

use image::{DynamicImage, Rgb, RgbImage};
use yoloprep::dataset::labels::parse_label_line;
use yoloprep::quality::{laplacian_variance, mean_brightness};

const LABEL_LINE: &str = "17 0.481250 0.634722 0.052083 0.119444";

fn bench_label_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("labels");
    group.throughput(Throughput::Bytes(LABEL_LINE.len() as u64));

    group.bench_function("parse_label_line", |b| {
        b.iter(|| {
            let parsed = parse_label_line(black_box(LABEL_LINE), Path::new("bench.txt"), 1)
                .unwrap()
                .unwrap();
            black_box(parsed)
        })
    });

    group.finish();
}

fn textured_image(side: u32) -> DynamicImage {
    let mut img = RgbImage::new(side, side);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let v = ((x * 31 + y * 17) % 256) as u8;
        *px = Rgb([v, v.wrapping_add(40), v.wrapping_mul(3)]);
    }
    DynamicImage::ImageRgb8(img)
}

fn bench_image_heuristics(c: &mut Criterion) {
    let img = textured_image(256);

    let mut group = c.benchmark_group("quality");
    group.throughput(Throughput::Elements(256 * 256));

    group.bench_function("laplacian_variance_256", |b| {
        b.iter(|| black_box(laplacian_variance(black_box(&img))))
    });

    group.bench_function("mean_brightness_256", |b| {
        b.iter(|| black_box(mean_brightness(black_box(&img))))
    });

    group.finish();
}

criterion_group!(benches, bench_label_parse, bench_image_heuristics);
criterion_main!(benches);
