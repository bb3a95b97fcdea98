//! Benchmarks for name hashing and block decryption
//!
//! Run with:
//! ```bash
//! cargo bench --bench hash_benchmark
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use mpk_crypto::{NameHash, decrypt_block, table_key};
use std::hint::black_box;

fn bench_name_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("name_hash");

    for name in [
        "a.txt",
        "units\\human\\footman.mdx",
        "data\\locale\\enus\\strings\\very_long_file_name.txt",
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name.len()), name, |b, name| {
            b.iter(|| NameHash::of(black_box(name)));
        });
    }

    group.finish();
}

fn bench_decrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("decrypt_block");
    let key = table_key("(hash table)");

    for words in [64usize, 4096, 65536] {
        group.throughput(Throughput::Bytes((words * 4) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(words), &words, |b, &words| {
            let mut data = vec![0u32; words];
            b.iter(|| decrypt_block(black_box(&mut data), key));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_name_hash, bench_decrypt);
criterion_main!(benches);
