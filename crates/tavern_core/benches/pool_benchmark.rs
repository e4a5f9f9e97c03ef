//! # Pool Recycling Benchmark
//!
//! Compares a warm get/put cycle against building a fresh instance.
//!
//! Run with: `cargo bench --package tavern_core --bench pool_benchmark`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tavern_core::{ObjectPool, PoolConfig};

/// Stand-in for a heavyweight instance.
fn build_instance() -> Vec<f32> {
    vec![0.0; 4096]
}

fn bench_warm_cycle(c: &mut Criterion) {
    let config = PoolConfig { initial_size: 64, ..PoolConfig::default() };
    let mut pool = ObjectPool::new("bench", config, build_instance).with_reset(|v| v[0] = 0.0);

    c.bench_function("pool_get_put_warm", |b| {
        b.iter(|| {
            let mut item = pool.get();
            item[0] = 1.0;
            pool.put(black_box(item));
        });
    });
}

fn bench_fresh_build(c: &mut Criterion) {
    c.bench_function("build_without_pool", |b| {
        b.iter(|| black_box(build_instance()));
    });
}

criterion_group!(benches, bench_warm_cycle, bench_fresh_build);
criterion_main!(benches);
