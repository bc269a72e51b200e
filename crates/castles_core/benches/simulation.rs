//! Simulation benchmarks for castles_core.
//!
//! Run with: `cargo bench -p castles_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use castles_core::config::SimConfig;
use castles_core::entities::Side;
use castles_core::math::Fixed;
use castles_core::simulation::Simulation;

fn crowded_sim() -> Simulation {
    let mut sim = Simulation::new(SimConfig::default()).unwrap();
    // A mid-game battlefield: mixed melee and ranged on both sides.
    for i in 0..20 {
        let x = 300 + i * 20;
        sim.spawn_unit_at(Side::Left, "ant", Fixed::from_num(x)).unwrap();
        sim.spawn_unit_at(Side::Right, "fencer", Fixed::from_num(1200 - x))
            .unwrap();
    }
    for i in 0..5 {
        let x = 200 + i * 30;
        sim.spawn_unit_at(Side::Left, "ghost", Fixed::from_num(x)).unwrap();
        sim.spawn_unit_at(Side::Right, "mermaid", Fixed::from_num(1200 - x))
            .unwrap();
    }
    sim
}

/// Runs simulation benchmarks for the castles_core crate.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("tick_empty_match", |b| {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        b.iter(|| {
            black_box(sim.update(Fixed::from_num(16)));
        });
    });

    c.bench_function("tick_crowded_battle", |b| {
        b.iter_with_setup(crowded_sim, |mut sim| {
            for _ in 0..10 {
                black_box(sim.update(Fixed::from_num(16)));
            }
        });
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
