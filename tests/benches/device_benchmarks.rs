//! Throughput benchmarks for the built-in backends.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use blockvault::{BlockDeviceFactory, RamBackend, SetupRequest};

const BLOCK_SIZE: usize = 4096;
const BLOCK_COUNT: u64 = 256;

fn bench_ram_writes(c: &mut Criterion) {
    let mut dev = RamBackend
        .setup(SetupRequest::new("bench-ram-writes", BLOCK_SIZE, BLOCK_COUNT))
        .expect("ram setup");
    let payload = vec![0xA5u8; BLOCK_SIZE];
    let mut cursor = 0u64;

    c.bench_function("ram_write_block_4k", |b| {
        b.iter(|| {
            dev.write_block(black_box(cursor % BLOCK_COUNT), &payload)
                .expect("write");
            cursor += 1;
        })
    });
}

fn bench_ram_reads(c: &mut Criterion) {
    let mut dev = RamBackend
        .setup(SetupRequest::new("bench-ram-reads", BLOCK_SIZE, BLOCK_COUNT))
        .expect("ram setup");
    let payload = vec![0x5Au8; BLOCK_SIZE];
    for index in 0..BLOCK_COUNT {
        dev.write_block(index, &payload).expect("prefill");
    }
    let mut cursor = 0u64;

    c.bench_function("ram_read_block_4k", |b| {
        b.iter(|| {
            let data = dev
                .read_block(black_box(cursor % BLOCK_COUNT))
                .expect("read");
            cursor += 1;
            black_box(data);
        })
    });
}

fn bench_file_writes(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("temp dir");
    let name = dir
        .path()
        .join("bench.blk")
        .to_str()
        .expect("utf-8 path")
        .to_string();
    let mut dev = blockvault::FileBackend
        .setup(SetupRequest::new(&name, BLOCK_SIZE, BLOCK_COUNT))
        .expect("file setup");
    let payload = vec![0xC3u8; BLOCK_SIZE];
    let mut cursor = 0u64;

    c.bench_function("file_write_block_4k", |b| {
        b.iter(|| {
            dev.write_block(black_box(cursor % BLOCK_COUNT), &payload)
                .expect("write");
            cursor += 1;
        })
    });
}

criterion_group!(benches, bench_ram_writes, bench_ram_reads, bench_file_writes);
criterion_main!(benches);
