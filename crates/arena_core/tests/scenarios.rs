//! End-to-end checks of the store, scheduler and skill pipeline contracts.

use std::cell::RefCell;
use std::rc::Rc;

use arena_core::buffs::{create_buff, BuffController, BuffKind};
use arena_core::combatant::cast_skill;
use arena_core::components::{BaseStats, Health, PickupKind, Position};
use arena_core::damage::base_damage;
use arena_core::math::{Fixed, Vec2Fixed};
use arena_core::progression::{spawn_pickup, ExperienceSystem, PickupSystem};
use arena_core::scheduler::Scheduler;
use arena_core::skill::SkillPipeline;
use arena_core::world::{EntityId, World};
use arena_test_utils::fixtures::{fixed, spawn_world_with_player};
use arena_test_utils::init_test_tracing;

fn fighter(world: &mut World, attack: i32, defense: i32, hp: u32) -> EntityId {
    let entity = world.create_entity();
    world.add_component(
        entity,
        BaseStats {
            attack,
            defense,
            max_health: hp,
            ..BaseStats::default()
        },
    );
    world.add_component(entity, Health::new(hp));
    entity
}

#[test]
fn defense_above_attack_still_deals_one() {
    init_test_tracing();
    let mut world = World::new();
    let attacker = fighter(&mut world, 10, 0, 50);
    let target = fighter(&mut world, 1, 15, 50);

    assert_eq!(base_damage(10, 15), 1);
    let damage = cast_skill(&mut world, &SkillPipeline::standard(), attacker, target, None);

    assert_eq!(damage.map(|d| d.base_damage), Some(1));
    assert_eq!(world.get_component::<Health>(target).unwrap().current, 49);
}

#[test]
fn increase_buff_is_recorded_but_not_committed() {
    init_test_tracing();
    let mut world = World::new();
    let attacker = fighter(&mut world, 20, 0, 100);
    let target = fighter(&mut world, 1, 5, 100);
    let mut chain = BuffController::new();
    chain.add_buff(create_buff(BuffKind::IncreaseDamage, 5), attacker);
    world.add_component(attacker, chain);

    let damage = cast_skill(&mut world, &SkillPipeline::standard(), attacker, target, None)
        .expect("attacker exists");

    assert_eq!(damage.base_damage, 15);
    assert_eq!(damage.value, 20);
    assert_eq!(damage.final_damage, 15);
    assert_eq!(damage.applied, Some(15));
    assert_eq!(world.get_component::<Health>(target).unwrap().current, 85);
}

#[test]
fn position_query_returns_only_holders_and_restarts() {
    let mut world = World::new();
    let a = world.create_entity();
    let b = world.create_entity();
    let c = world.create_entity();
    world.add_component(a, Position::new(Vec2Fixed::from_ints(1, 1)));
    world.add_component(b, Health::new(5));
    world.add_component(c, Position::new(Vec2Fixed::from_ints(3, 3)));

    let first = world.get_components::<Position>();
    let second = world.get_components::<Position>();

    assert_eq!(first.len(), 2);
    assert_eq!(first.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![a, c]);
    assert_eq!(first, second);
}

#[test]
fn dependent_system_starts_once_service_appears() {
    init_test_tracing();
    let (mut world, _player) = spawn_world_with_player();
    let pickups = Rc::new(RefCell::new(PickupSystem::new()));
    let mut scheduler = Scheduler::new();
    scheduler.add_shared(Rc::clone(&pickups));

    let first = spawn_pickup(&mut world, PickupKind::Experience, 3, Vec2Fixed::ZERO);
    scheduler.run(&mut world, fixed(1));
    assert!(world.is_alive(first), "no service yet, nothing collected");
    assert_eq!(pickups.borrow().collected(), 0);

    let experience = world.register_service(ExperienceSystem::new());
    scheduler.run(&mut world, fixed(1));

    assert!(!world.is_alive(first));
    assert_eq!(pickups.borrow().collected(), 1);
    assert_eq!(experience.borrow().total_experience(), 3);
}

#[test]
fn set_then_get_returns_written_value() {
    let mut world = World::new();
    let entity = world.create_entity();
    world.add_component(entity, Health::new(10));

    let written = Health { current: 3, max: 10 };
    world.set_component(entity, written);

    assert_eq!(world.get_component::<Health>(entity).unwrap(), written);
}

#[test]
fn unwritten_copy_is_not_visible() {
    let mut world = World::new();
    let entity = world.create_entity();
    world.add_component(entity, Health::new(10));

    let mut copy = world.get_component::<Health>(entity).unwrap();
    copy.apply_damage(4);

    assert_eq!(world.get_component::<Health>(entity).unwrap().current, 10);
}

#[test]
fn custom_pipeline_runs_steps_in_given_order() {
    use arena_core::skill::{ApplyFinalDamage, CalculateBaseDamage, SkillContext, SkillStep};

    struct Halve;
    impl SkillStep for Halve {
        fn name(&self) -> &'static str {
            "halve"
        }
        fn execute(&self, ctx: &mut SkillContext<'_>) {
            ctx.damage.multiplier = Fixed::from_num(0.5);
        }
    }

    let mut world = World::new();
    let attacker = fighter(&mut world, 21, 1, 10);
    let target = fighter(&mut world, 1, 1, 100);
    let pipeline = SkillPipeline::with_steps(vec![
        Box::new(CalculateBaseDamage),
        Box::new(Halve),
        Box::new(ApplyFinalDamage),
    ]);

    let damage = cast_skill(&mut world, &pipeline, attacker, target, None).unwrap();

    assert_eq!(pipeline.step_names(), vec!["calculate_base_damage", "halve", "apply_final_damage"]);
    assert_eq!(damage.applied, Some(10));
}
