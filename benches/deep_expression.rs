//! Benchmarks for building and sweeping long expression chains.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use adjoint::prelude::*;

/// Builds `x * 1.0001 + 0.5` nested `depth` times.
fn chain(x: &Symbol, depth: usize) -> Expr {
    let mut e = x.expr();
    for _ in 0..depth {
        e = e * 1.0001 + 0.5;
    }
    e
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_build");

    for depth in [1_000, 10_000, 50_000] {
        group.bench_with_input(BenchmarkId::new("plain", depth), &depth, |b, &depth| {
            b.iter(|| {
                let g = Graph::new();
                let x = g.var();
                black_box(chain(&x, depth))
            });
        });
        group.bench_with_input(BenchmarkId::new("hash_consing", depth), &depth, |b, &depth| {
            b.iter(|| {
                let g = Graph::with_config(GraphConfig {
                    hash_consing: true,
                    ..GraphConfig::default()
                });
                let x = g.var();
                black_box(chain(&x, depth))
            });
        });
    }

    group.finish();
}

fn bench_sweeps(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_sweep");

    for depth in [1_000, 10_000, 50_000] {
        let g = Graph::new();
        let x = g.var();
        let e = chain(&x, depth);
        let b = at([x.bind(0.25)]).unwrap();

        group.bench_with_input(BenchmarkId::new("evaluate", depth), &depth, |bench, _| {
            bench.iter(|| black_box(evaluate_f64(&e, &b).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("grad", depth), &depth, |bench, _| {
            bench.iter(|| black_box(grad(&e, &b).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_construction, bench_sweeps);

criterion_main!(benches);
