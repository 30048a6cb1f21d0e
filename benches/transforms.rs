use bitplane::extraction::{BitstreamExtractor, ExtractionRule, TraversalConfig};
use bitplane::raster::PixelMatrix;
use bitplane::transform::{self, MaskOp, MaskRule};
use bitplane::{MagicEyeConfig, OffsetSolver};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn rgb(width: usize, height: usize) -> PixelMatrix {
    PixelMatrix::from_fn(width, height, vec![8, 8, 8], |r, c, ch| {
        ((r * 131 + c * 71 + ch * 17) % 256) as u32
    })
    .unwrap()
}

fn bench_split(c: &mut Criterion) {
    let image = rgb(256, 256);

    c.bench_function("split_components 256x256", |b| {
        b.iter(|| transform::split_components(black_box(&image)).count())
    });
    c.bench_function("split_bit_layers 256x256", |b| {
        b.iter(|| {
            transform::split_bit_layers(black_box(&image), 1)
                .unwrap()
                .count()
        })
    });
}

fn bench_mask(c: &mut Criterion) {
    let image = rgb(256, 256);
    let rules = vec![
        MaskRule::new(MaskOp::And, 0, 0x0f).with_shift(4),
        MaskRule::new(MaskOp::Xor, 2, 0xff),
    ];

    c.bench_function("masked_components 256x256", |b| {
        b.iter(|| transform::masked_components(black_box(&image), &rules, true).unwrap())
    });
}

fn bench_extract(c: &mut Criterion) {
    let image = rgb(256, 256);
    let serpentine = TraversalConfig::new(true, true, false, true);
    let rules = vec![
        ExtractionRule::new(0, 0),
        ExtractionRule::new(1, 0).with_traversal(serpentine),
        ExtractionRule::new(2, 0),
    ];

    c.bench_function("extract sequential 256x256", |b| {
        let extractor = BitstreamExtractor::new(rules.clone());
        b.iter(|| extractor.extract(black_box(&image)).unwrap())
    });
    c.bench_function("extract zipped 256x256", |b| {
        let extractor = BitstreamExtractor::new(rules.clone()).zip_components(true);
        b.iter(|| extractor.extract(black_box(&image)).unwrap())
    });
}

fn bench_magic_eye(c: &mut Criterion) {
    let image = rgb(128, 64);

    c.bench_function("offset search 128x64", |b| {
        b.iter(|| {
            OffsetSolver::new(black_box(&image), MagicEyeConfig::default())
                .unwrap()
                .best()
        })
    });
}

criterion_group!(benches, bench_split, bench_mask, bench_extract, bench_magic_eye);
criterion_main!(benches);
