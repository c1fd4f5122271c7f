//! Benchmarks for the binary primitives.
//!
//! Run with: cargo bench --bench codec

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use acad_codec::io::dwg::crc::OBJECT_SEED;
use acad_codec::io::dwg::modular::{decode_modular_char, encode_modular_char};
use acad_codec::io::dwg::{frame, unframe, DwgBitReader, DwgBitWriter, DwgStreamReader, DwgStreamWriter, VersionFeatures};
use acad_codec::DxfVersion;

fn bench_framing(c: &mut Criterion) {
    let mut group = c.benchmark_group("framing");
    for version in [DxfVersion::AC1015, DxfVersion::AC1032] {
        let features = VersionFeatures::for_version(version).unwrap();
        for size in [64usize, 1024, 16 * 1024] {
            let payload: Vec<u8> = (0..size).map(|i| (i * 31) as u8).collect();
            let framed = frame(&payload, 0, OBJECT_SEED, features).unwrap();
            group.throughput(Throughput::Bytes(size as u64));

            group.bench_with_input(BenchmarkId::new(format!("frame/{version}"), size), &payload, |b, p| {
                b.iter(|| frame(black_box(p), 0, OBJECT_SEED, features).unwrap())
            });
            group.bench_with_input(BenchmarkId::new(format!("unframe/{version}"), size), &framed, |b, f| {
                b.iter(|| unframe(black_box(f), OBJECT_SEED, features).unwrap())
            });
        }
    }
    group.finish();
}

fn bench_bit_doubles(c: &mut Criterion) {
    let features = VersionFeatures::for_version(DxfVersion::AC1024).unwrap();
    let values: Vec<f64> = (0..4096).map(|i| if i % 3 == 0 { 0.0 } else { i as f64 * 0.37 }).collect();

    let mut writer = DwgBitWriter::new(features);
    for v in &values {
        writer.write_bit_double(*v).unwrap();
    }
    let encoded = writer.into_bytes();

    let mut group = c.benchmark_group("bit_double");
    group.throughput(Throughput::Elements(values.len() as u64));
    group.bench_function("write", |b| {
        b.iter(|| {
            let mut writer = DwgBitWriter::new(features);
            for v in &values {
                writer.write_bit_double(black_box(*v)).unwrap();
            }
            writer.into_bytes()
        })
    });
    group.bench_function("read", |b| {
        b.iter(|| {
            let mut reader = DwgBitReader::new(black_box(&encoded), features);
            let mut sum = 0.0;
            for _ in 0..values.len() {
                sum += reader.read_bit_double().unwrap();
            }
            sum
        })
    });
    group.finish();
}

fn bench_modular(c: &mut Criterion) {
    let values: Vec<u64> = (0..1024u64).map(|i| i.wrapping_mul(0x9E37_79B9)).collect();
    c.bench_function("modular_char/round_trip", |b| {
        b.iter(|| {
            values
                .iter()
                .map(|&v| decode_modular_char(&encode_modular_char(black_box(v)), 0).unwrap().0)
                .fold(0u64, u64::wrapping_add)
        })
    });
}

criterion_group!(benches, bench_framing, bench_bit_doubles, bench_modular);
criterion_main!(benches);
