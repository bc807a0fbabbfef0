//! Simulation benchmarks for arena_core.
//!
//! Run with: `cargo bench -p arena_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use arena_core::buffs::{create_buff, BuffController, BuffKind};
use arena_core::combatant::cast_skill;
use arena_core::components::{BaseStats, Health};
use arena_core::math::{Fixed, Vec2Fixed};
use arena_core::skill::SkillPipeline;
use arena_core::world::World;
use arena_test_utils::fixtures::{sample_enemy, spawn_simulation};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

/// Full scheduler pass over a populated arena.
pub fn simulation_benchmark(c: &mut Criterion) {
    let dt = Fixed::ONE / Fixed::from_num(60);

    c.bench_function("arena_tick", |b| {
        b.iter_batched(
            spawn_simulation,
            |mut sim| {
                sim.tick(black_box(dt));
                sim
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("arena_tick_crowded", |b| {
        b.iter_batched(
            || {
                let mut sim = spawn_simulation();
                let enemy = sample_enemy();
                for i in 0..100 {
                    sim.spawn_enemy(&enemy, Vec2Fixed::from_ints(i % 10 - 5, i / 10 - 5));
                }
                sim
            },
            |mut sim| {
                sim.tick(black_box(dt));
                sim
            },
            BatchSize::SmallInput,
        );
    });
}

/// One standard skill cast through a buffed attacker.
pub fn skill_benchmark(c: &mut Criterion) {
    let pipeline = SkillPipeline::standard();

    c.bench_function("cast_skill_standard", |b| {
        b.iter_batched(
            || {
                let mut world = World::new();
                let attacker = world.create_entity();
                world.add_component(
                    attacker,
                    BaseStats {
                        attack: 30,
                        ..BaseStats::default()
                    },
                );
                world.add_component(attacker, Health::new(100));
                let mut chain = BuffController::new();
                chain.add_buff(create_buff(BuffKind::IncreaseDamage, 5), attacker);
                chain.add_buff(create_buff(BuffKind::DecreaseDamage, 3), attacker);
                world.add_component(attacker, chain);

                let target = world.create_entity();
                world.add_component(
                    target,
                    BaseStats {
                        defense: 4,
                        ..BaseStats::default()
                    },
                );
                world.add_component(target, Health::new(1_000));
                (world, attacker, target)
            },
            |(mut world, attacker, target)| {
                black_box(cast_skill(&mut world, &pipeline, attacker, target, None))
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, simulation_benchmark, skill_benchmark);
criterion_main!(benches);
