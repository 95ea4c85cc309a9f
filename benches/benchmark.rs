//! Performance benchmarks for CramSeek
//!
//! Run with: cargo bench

#[path = "../tests/common/mod.rs"]
mod common;

use common::{build_cram, ContainerLayout, V3};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cram_seek::core::{optimize_chunks, resolve_container, CachingIndex, DiskBasedIndex, IndexSource, IoStrategy};
use cram_seek::formats::container::CramHeaderReader;
use cram_seek::formats::CraiIndex;
use cram_seek::{Chunk, CoordinateIndex, FileSpan, Reader, ValidationStringency, VirtualOffset};
use std::io::Cursor;

/// Back-to-back chr1 containers of 10 kbp each
fn tiled_layouts(n: usize) -> Vec<ContainerLayout> {
    (0..n)
        .map(|i| ContainerLayout::mapped(0, 1 + i as i32 * 10_000, 10_000))
        .collect()
}

/// Benchmark virtual offset decoding
fn bench_virtual_offset(c: &mut Criterion) {
    let raw: Vec<u64> = (0..1000u64).map(|i| ((i * 7919) << 16) | (i & 0xFFFF)).collect();

    c.bench_function("virtual_offset_decode", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for &r in &raw {
                let (offset, slice) = VirtualOffset::from_raw(black_box(r)).decode();
                sum = sum.wrapping_add(offset ^ slice as u64);
            }
            black_box(sum)
        })
    });
}

/// Benchmark chunk optimisation
fn bench_optimize_chunks(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimize_chunks");

    for size in [100usize, 1_000, 10_000].iter() {
        // overlapping, out-of-order chunks
        let chunks: Vec<Chunk> = (0..*size as u64)
            .rev()
            .map(|i| Chunk::new(VirtualOffset::new(i * 100, 0), VirtualOffset::new(i * 100 + 150, 0)))
            .collect();

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &chunks, |b, chunks| {
            b.iter(|| black_box(optimize_chunks(chunks.clone(), VirtualOffset::new(500, 0))))
        });
    }
    group.finish();
}

/// Benchmark index lookups, re-read versus cached
fn bench_index_lookup(c: &mut Criterion) {
    let fixture = build_cram(V3, &tiled_layouts(1_000));
    let bai = fixture.bai_bytes();
    let mut disk = DiskBasedIndex::new(IndexSource::Memory(bai.clone()), IoStrategy::Auto);
    let mut cached = CachingIndex::new(IndexSource::Memory(bai), IoStrategy::Auto);
    let crai = CraiIndex::from_records(fixture.crai_records());

    let mut group = c.benchmark_group("index_lookup");
    group.bench_function("bai_disk", |b| {
        b.iter(|| black_box(disk.span_overlapping(0, black_box(5_000_000), None).unwrap()))
    });
    group.bench_function("bai_cached", |b| {
        b.iter(|| black_box(cached.span_overlapping(0, black_box(5_000_000), None).unwrap()))
    });
    group.bench_function("crai", |b| {
        b.iter(|| black_box(crai.span_overlapping(0, black_box(5_000_000), None)))
    });
    group.finish();
}

/// Benchmark resolution over an in-memory file
fn bench_resolver(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_container");

    for candidates in [10usize, 100, 1_000].iter() {
        let fixture = build_cram(V3, &tiled_layouts(*candidates));
        let span = FileSpan::new(
            fixture
                .offsets
                .iter()
                .map(|&o| Chunk::new(VirtualOffset::new(o, 0), VirtualOffset::new(o, 1)))
                .collect(),
        );
        let headers = CramHeaderReader::new(V3, ValidationStringency::Strict);
        // only the last candidate overlaps
        let start = (*candidates as u32 - 1) * 10_000 + 5_000;

        group.throughput(Throughput::Elements(*candidates as u64));
        group.bench_with_input(BenchmarkId::from_parameter(candidates), &fixture.bytes, |b, bytes| {
            b.iter(|| {
                let mut stream = Cursor::new(bytes);
                black_box(resolve_container(&mut stream, &headers, &span, start).unwrap())
            })
        });
    }
    group.finish();
}

/// Benchmark a full query through the reader
fn bench_reader_query(c: &mut Criterion) {
    let fixture = build_cram(V3, &tiled_layouts(1_000));
    let mut reader = Reader::builder()
        .seekable_stream(Cursor::new(fixture.bytes.clone()))
        .index_reader(Cursor::new(fixture.crai_bytes()))
        .unwrap()
        .build()
        .unwrap();

    c.bench_function("reader_query_first_container", |b| {
        b.iter(|| {
            let mut result = reader.query_alignment_start("chr1", black_box(5_000_000)).unwrap();
            black_box(result.next().map(|c| c.unwrap().offset))
        })
    });
}

criterion_group!(
    benches,
    bench_virtual_offset,
    bench_optimize_chunks,
    bench_index_lookup,
    bench_resolver,
    bench_reader_query,
);
criterion_main!(benches);
