//! Criterion benchmarks for [`PathResolver`] operations.
//!
//! Path resolution runs on every file-picker result and every package check
//! in the UI, so it should stay allocation-light.
//!
//! Run with:
//! ```bash
//! cargo bench --package lpg-core --bench path_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lpg_core::{is_package, PathResolver};

const RESOLVER: PathResolver = PathResolver::new('/');

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for depth in [1usize, 4, 16] {
        let dir = vec!["segment"; depth].join("/");
        let raw = format!("/{dir}/poster.final.png");

        group.bench_with_input(BenchmarkId::from_parameter(depth), &raw, |b, raw| {
            b.iter(|| RESOLVER.resolve(black_box(raw)))
        });
    }

    group.finish();
}

fn bench_join(c: &mut Criterion) {
    c.bench_function("join_with_gaps", |b| {
        b.iter(|| {
            RESOLVER.join(black_box([
                Some("/home/me"),
                None,
                Some("packages"),
                Some(""),
                Some("pack.zip"),
            ]))
        })
    });
}

fn bench_is_package(c: &mut Criterion) {
    let data = RESOLVER.resolve("/home/me/packages/pack.zip");
    c.bench_function("is_package", |b| b.iter(|| is_package(black_box(&data))));
}

criterion_group!(benches, bench_resolve, bench_join, bench_is_package);
criterion_main!(benches);
