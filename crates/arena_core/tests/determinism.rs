//! Reproducibility of whole runs and of single skill casts.

use arena_core::attributes::add_stat_modifier;
use arena_core::buffs::{BuffController, BuffDef, BuffKind};
use arena_core::combatant::cast_skill;
use arena_core::components::{
    AttributeDirty, Attributes, BaseStats, Health, StatKind, StatModifier,
};
use arena_core::math::Vec2Fixed;
use arena_core::simulation::Simulation;
use arena_core::skill::SkillPipeline;
use arena_core::world::{EntityId, World};
use arena_test_utils::determinism::{
    compute_hash, find_first_divergence, verify_determinism, verify_simulation_determinism,
};
use arena_test_utils::fixtures::{
    fixed, sample_character, sample_enemy, sample_weapon, spawn_simulation,
};
use arena_test_utils::strategies::{
    arb_buff_chain, arb_dt, arb_health, arb_stat, arb_stat_modifier, arb_vec2_position,
};
use proptest::prelude::*;

fn arena_with(enemies: &[Vec2Fixed], buffs: &[BuffDef]) -> Simulation {
    let mut hero = sample_character();
    hero.starting_buffs = buffs.to_vec();
    let mut sim = Simulation::new();
    let player = sim.spawn_player(&hero);
    sim.spawn_orbit_weapon(&sample_weapon(), player)
        .expect("player has a position");
    for &spot in enemies {
        sim.spawn_enemy(&sample_enemy(), spot);
    }
    sim
}

fn combatant(world: &mut World, stats: BaseStats, hp: u32) -> EntityId {
    let entity = world.create_entity();
    world.add_component(entity, stats);
    world.add_component(entity, Health::new(hp));
    entity
}

#[test]
fn arena_run_is_reproducible() {
    let dt = fixed(1) / fixed(60);
    assert!(verify_simulation_determinism(spawn_simulation, 600, dt));

    let divergence = find_first_divergence(spawn_simulation, 600, dt);
    assert!(divergence.is_none(), "runs split at tick {divergence:?}");
}

#[test]
fn state_hash_tracks_progress() {
    let idle = spawn_simulation();
    let mut running = spawn_simulation();
    assert_eq!(idle.state_hash(), running.state_hash());

    running.tick(fixed(1) / fixed(60));
    assert_ne!(idle.state_hash(), running.state_hash());
}

#[test]
fn stat_modifiers_settle_identically() {
    let result = verify_determinism(
        3,
        5,
        || {
            let mut sim = Simulation::new();
            let player = sim.spawn_player(&sample_character());
            for amount in [3, -2, 7] {
                let bonus = StatModifier {
                    stat: StatKind::Attack,
                    amount,
                };
                assert!(add_stat_modifier(sim.world_mut(), player, bonus));
            }
            (sim, player)
        },
        |(sim, _)| sim.tick(fixed(1) / fixed(60)),
        |(sim, player)| compute_hash(&sim.world().try_get_component::<Attributes>(*player)),
    );

    result.assert_deterministic();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_random_arena_is_reproducible(
        enemies in proptest::collection::vec(arb_vec2_position(), 1..6),
        buffs in arb_buff_chain(4),
        dt in arb_dt(),
    ) {
        let setup = || arena_with(&enemies, &buffs);
        prop_assert!(verify_simulation_determinism(setup, 90, dt));
    }

    #[test]
    fn prop_cast_follows_buff_fields(
        attack in arb_stat(),
        defense in arb_stat(),
        hp in arb_health(),
        chain in arb_buff_chain(6),
    ) {
        let mut world = World::new();
        let caster = combatant(&mut world, BaseStats { attack, ..BaseStats::default() }, 10);
        let target = combatant(&mut world, BaseStats { defense, ..BaseStats::default() }, hp);
        let mut buffs = BuffController::new();
        for buff in &chain {
            buffs.add_buff(buff.build(), caster);
        }
        world.add_component(caster, buffs);

        let damage = cast_skill(&mut world, &SkillPipeline::standard(), caster, target, None)
            .expect("caster exists");

        let sum = |kind: BuffKind| -> i32 {
            chain.iter().filter(|b| b.kind == kind).map(|b| b.value).sum()
        };
        let base = (attack - defense).max(1);
        let committed = u32::try_from(base - sum(BuffKind::DecreaseDamage)).unwrap_or(0);

        prop_assert_eq!(damage.base_damage, base);
        prop_assert_eq!(damage.value, base + sum(BuffKind::IncreaseDamage));
        prop_assert_eq!(damage.applied, Some(committed));
        let left = world.get_component::<Health>(target).unwrap().current;
        prop_assert_eq!(left, hp.saturating_sub(committed));
    }

    #[test]
    fn prop_modifiers_recompute_within_one_tick(
        modifiers in proptest::collection::vec(arb_stat_modifier(), 1..5),
    ) {
        let mut sim = Simulation::new();
        let player = sim.spawn_player(&sample_character());
        for modifier in &modifiers {
            prop_assert!(add_stat_modifier(sim.world_mut(), player, *modifier));
        }

        sim.tick(fixed(1) / fixed(60));

        let world = sim.world();
        prop_assert!(!world.has_component::<AttributeDirty>(player));
        let health = world.get_component::<Health>(player).unwrap();
        let attributes = world.get_component::<Attributes>(player).unwrap();
        prop_assert_eq!(health.max, attributes.max_health);
        prop_assert!(health.current <= health.max);
    }
}
