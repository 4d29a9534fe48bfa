//! # Transport Step Benchmark
//!
//! Budget: a 5 000 particle plume must step in well under one 90 Hz frame.
//!
//! Run with: `cargo bench --package pm25_transport`

// Benchmarks don't need strict docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use pm25_shared::Vec3;
use pm25_transport::{DensityConfig, EmissionConfig, TransportConfig, TransportSystem};

/// Builds a system holding roughly `count` particles around the origin.
fn populated(count: u32) -> TransportSystem {
    let mut system = TransportSystem::new(TransportConfig::drilling_burst(), DensityConfig::default(), 123);
    let source = system.add_source(
        Vec3::ZERO,
        EmissionConfig {
            total_budget: count,
            duration: 1.0,
            ..Default::default()
        },
    );
    let _ = system.start_emission(source);
    for _ in 0..10 {
        system.step(0.1);
    }
    let _ = system.stop_emission(source);
    system
}

/// Benchmark: integration step without emission.
fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("transport_step");

    for count in [500u32, 5_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut system = populated(count);
            b.iter(|| {
                system.step(black_box(1.0 / 90.0));
            });
        });
    }

    group.finish();
}

/// Benchmark: density pass over a dense plume.
fn bench_density(c: &mut Criterion) {
    let mut system = populated(5_000);
    let density = DensityConfig::default();

    c.bench_function("density_pass_5000", |b| {
        let mut particles = system.particles().to_vec();
        b.iter(|| {
            pm25_transport::density::update_densities(black_box(&mut particles), &[], &density);
        });
    });

    system.compact();
}

criterion_group!(benches, bench_step, bench_density);
criterion_main!(benches);
