//! Tick throughput benchmarks.
//!
//! Measures a full `Simulation::step` at increasing entity counts, the
//! pairwise overlap pass on its own, and state hashing.
//!
//! Run with: `cargo bench --bench tick_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use ashfall_engine::collision::detect_overlaps;
use ashfall_engine::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A floor-backed arena with one player and `enemies` pursuing enemies spread
/// along the floor.
fn populated(enemies: usize) -> Simulation {
    let mut sim = Simulation::new(SimConfig::default()).unwrap();
    let mut grid = TileGrid::new(256, 16, 32.0);
    grid.fill_row(12);
    sim.set_map(grid);

    let player = sim.spawn(
        Entity::player(4000.0, 364.0)
            .with_health(1_000_000)
            .with_attack(1)
            .with_stamina(1_000_000.0, 30.0)
            .with_physics(1.0)
            .with_speed(2.0),
    );
    sim.set_player(player);

    for i in 0..enemies {
        let x = (i as f64 * 37.0) % 8000.0;
        sim.spawn(
            Entity::enemy(x, 366.0)
                .with_health(1_000_000)
                .with_ai(1.0)
                .with_physics(1.0),
        );
    }
    sim.set_input(InputFrame::new().with(Action::Attack));
    sim
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_tick_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_scaling");
    for &count in &[10usize, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut sim = populated(count);
            b.iter(|| black_box(sim.step()));
        });
    }
    group.finish();
}

fn bench_overlap_pass(c: &mut Criterion) {
    let sim = populated(500);
    c.bench_function("detect_overlaps_500", |b| {
        b.iter(|| black_box(detect_overlaps(sim.registry())));
    });
}

fn bench_state_hash(c: &mut Criterion) {
    let sim = populated(100);
    c.bench_function("state_hash_100", |b| {
        b.iter(|| black_box(sim.state_hash()));
    });
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_tick_scaling, bench_overlap_pass, bench_state_hash);
criterion_main!(benches);
