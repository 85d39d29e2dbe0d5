//! Benchmark for event-path performance.
//!
//! TARGET: 1,000,000 move events per second
//!
//! Run with: cargo bench --package vigil_security --bench heuristics_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use vigil_core::{BlockPos, Location, Material, PlayerSnapshot, SubjectId};
use vigil_security::{DamageCause, Heuristics, HeuristicsConfig, ReadyGate, SimServer};

const WALKER: SubjectId = SubjectId::from_u128(1);
const TARGET: SubjectId = SubjectId::from_u128(2);

fn create_world() -> Heuristics<SimServer> {
    let mut server = SimServer::new();
    for x in -4..64 {
        for z in -4..4 {
            server.set_block(BlockPos::new(x, 63, z), Material::Stone);
        }
    }
    server.join(PlayerSnapshot::new(WALKER, "Walker", Location::new(0.5, 64.0, 0.5)));
    server.join(PlayerSnapshot::new(TARGET, "Target", Location::new(0.5, 64.0, 3.5)));
    Heuristics::with_gate(HeuristicsConfig::default(), server, ReadyGate::open())
}

/// Walking back and forth on the floor at normal speed.
fn walk(heuristics: &mut Heuristics<SimServer>, step: u64) {
    let lap = (step % 200) as f64;
    let x = if lap < 100.0 { lap } else { 200.0 - lap } * 0.2;
    let from = Location::new(0.5 + x, 64.0, 0.5);
    let to = Location::new(0.5 + x + if lap < 100.0 { 0.2 } else { -0.2 }, 64.0, 0.5);
    heuristics.set_time(step * 50);
    heuristics.on_move(WALKER, from, to, false);
}

fn benchmark_single_move(c: &mut Criterion) {
    let mut heuristics = create_world();

    c.bench_function("single_move_event", |b| {
        let mut step = 0u64;
        b.iter(|| {
            step = step.wrapping_add(1);
            walk(black_box(&mut heuristics), black_box(step));
        });
    });
}

fn benchmark_million_moves(c: &mut Criterion) {
    let mut heuristics = create_world();

    let mut group = c.benchmark_group("million_moves");
    group.throughput(Throughput::Elements(1_000_000));
    group.sample_size(10);

    group.bench_function("1M_moves", |b| {
        b.iter(|| {
            for step in 0..1_000_000u64 {
                walk(&mut heuristics, step);
            }
            black_box(heuristics.take_verdicts())
        });
    });

    group.finish();
}

fn benchmark_melee(c: &mut Criterion) {
    let mut heuristics = create_world();

    c.bench_function("melee_hit", |b| {
        let mut step = 0u64;
        b.iter(|| {
            step = step.wrapping_add(1);
            heuristics.set_time(step * 500);
            heuristics.on_damaged_by_entity(
                black_box(TARGET),
                black_box(Some(WALKER)),
                4.0,
                DamageCause::EntityAttack,
            );
        });
    });
}

criterion_group!(benches, benchmark_single_move, benchmark_million_moves, benchmark_melee);
criterion_main!(benches);
