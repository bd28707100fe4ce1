use criterion::{black_box, criterion_group, criterion_main, Criterion};
use s3pkit::{pack, unpack, wrap_payload};

fn bench_wrap(c: &mut Criterion) {
    let data = vec![0u8; 1024 * 1024];
    c.bench_function("wrap_1mb", |b| b.iter(|| wrap_payload(black_box(data.as_slice()))));
}

fn bench_pack(c: &mut Criterion) {
    let tracks: Vec<Vec<u8>> = (0..16).map(|i| vec![i as u8; 256 * 1024]).collect();

    c.bench_function("pack_16x256k", |b| b.iter(|| pack(black_box(tracks.as_slice())).unwrap()));
}

fn bench_unpack(c: &mut Criterion) {
    let tracks: Vec<Vec<u8>> = (0..16).map(|i| vec![i as u8; 256 * 1024]).collect();
    let archive = pack(&tracks).unwrap();

    c.bench_function("unpack_16x256k", |b| b.iter(|| unpack(black_box(archive.as_slice())).unwrap().len()));
}

criterion_group!(benches, bench_wrap, bench_pack, bench_unpack);
criterion_main!(benches);
