// benches/block_pipeline.rs
//
// Throughput of the in-process bz2 path through the block engine.
use std::io::Cursor;

use bzst::block_pipeline::{self, Transform};
use bzst::codec::bz2::{Bz2Decoder, Bz2Encoder};
use bzst::common::{Direction, TransferSession};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const INPUT_LEN: usize = 4 * 1024 * 1024;

/// Text-like data: words drawn from a small vocabulary.
fn corpus() -> Vec<u8> {
    let words = ["block", "stream", "archive", "engine", "tar", "level", "\n", "the", "of"];
    let mut rng = StdRng::seed_from_u64(42);
    let mut out = Vec::with_capacity(INPUT_LEN);
    while out.len() < INPUT_LEN {
        out.extend_from_slice(words[rng.gen_range(0..words.len())].as_bytes());
        out.push(b' ');
    }
    out.truncate(INPUT_LEN);
    out
}

fn run<T: Transform>(input: &[u8], transform: &mut T, direction: Direction) -> Vec<u8> {
    let mut output = Vec::new();
    let mut session = TransferSession::new("bench-in", "bench-out", direction, Some(input.len() as u64));
    block_pipeline::transfer(&mut Cursor::new(input), &mut output, transform, &mut session, &|_| {}).unwrap();
    output
}

fn bench_bz2(c: &mut Criterion) {
    let input = corpus();
    let mut group = c.benchmark_group("bz2");
    group.sample_size(10);
    group.throughput(Throughput::Bytes(input.len() as u64));

    for level in [1u32, 6, 9] {
        group.bench_with_input(BenchmarkId::new("compress", level), &level, |b, &level| {
            b.iter(|| run(black_box(&input), &mut Bz2Encoder::new(level, "bench"), Direction::Compress))
        });
    }

    let compressed = run(&input, &mut Bz2Encoder::new(9, "bench"), Direction::Compress);
    group.bench_function("decompress", |b| {
        b.iter(|| run(black_box(&compressed), &mut Bz2Decoder::new("bench"), Direction::Decompress))
    });
    group.finish();
}

criterion_group!(benches, bench_bz2);
criterion_main!(benches);
