//! Test fixtures and helpers.
//!
//! Pre-built records and worlds for consistent testing.

use arena_core::buffs::{BuffDef, BuffKind};
use arena_core::components::{
    BaseStats, Collider, Health, Level, PickupRange, PlayerTag, Position, SpriteKey, Team,
    Velocity,
};
use arena_core::data::{CharacterData, ContactDamageData, GrowthData, MagnetData, WeaponData};
use arena_core::math::{Fixed, Vec2Fixed};
use arena_core::simulation::Simulation;
use arena_core::world::{EntityId, World};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

fn half() -> Fixed {
    Fixed::ONE / fixed(2)
}

/// A level 1 player character with a damage buff and a magnet.
#[must_use]
pub fn sample_character() -> CharacterData {
    CharacterData {
        id: "knight".to_string(),
        name: "Knight".to_string(),
        level: 1,
        max_health: 100,
        attack: 20,
        defense: 5,
        growth: GrowthData {
            attack: 2,
            defense: 1,
            health: 10,
        },
        speed: fixed(5),
        collider_radius: half(),
        pickup_range: fixed(1),
        magnet: Some(MagnetData {
            radius: fixed(4),
            strength: fixed(10),
        }),
        contact_damage: None,
        experience_reward: 0,
        sprite: SpriteKey {
            sheet_id: 1,
            key_id: 0,
        },
        tags: vec!["hero".to_string()],
        starting_buffs: vec![BuffDef {
            kind: BuffKind::IncreaseDamage,
            value: 5,
        }],
    }
}

/// A weak melee enemy worth 5 experience.
#[must_use]
pub fn sample_enemy() -> CharacterData {
    CharacterData {
        id: "slime".to_string(),
        name: "Slime".to_string(),
        level: 1,
        max_health: 12,
        attack: 6,
        defense: 1,
        growth: GrowthData::default(),
        speed: fixed(2),
        collider_radius: half(),
        pickup_range: Fixed::ZERO,
        magnet: None,
        contact_damage: Some(ContactDamageData {
            damage: 6,
            knockback: half(),
        }),
        experience_reward: 5,
        sprite: SpriteKey {
            sheet_id: 2,
            key_id: 0,
        },
        tags: Vec::new(),
        starting_buffs: Vec::new(),
    }
}

/// Two blades orbiting at radius 2.
#[must_use]
pub fn sample_weapon() -> WeaponData {
    WeaponData {
        id: "twin_blades".to_string(),
        damage: 8,
        knockback: fixed(1),
        orbit_radius: fixed(2),
        angular_speed: fixed(3),
        collider_radius: half(),
        blade_count: 2,
        sprite: SpriteKey {
            sheet_id: 3,
            key_id: 0,
        },
    }
}

/// A bare world holding only a player at the origin.
///
/// The player carries the components the gameplay systems probe for,
/// without going through [`Simulation`].
#[must_use]
pub fn spawn_world_with_player() -> (World, EntityId) {
    let mut world = World::new();
    let data = sample_character();
    let player = world.create_entity();
    world.add_component(player, PlayerTag);
    world.add_component(player, Team::Player);
    world.add_component(player, Position::new(Vec2Fixed::ZERO));
    world.add_component(player, Velocity::idle(data.speed));
    world.add_component(player, Collider::new(data.collider_radius));
    world.add_component(player, Health::new(data.max_health));
    world.add_component(player, PickupRange { radius: data.pickup_range });
    world.add_component(player, data.base_stats());
    world.add_component(player, Level::default());
    (world, player)
}

/// A full arena: armed player and a ring of enemies.
#[must_use]
pub fn spawn_simulation() -> Simulation {
    let mut sim = Simulation::new();
    let player = sim.spawn_player(&sample_character());
    if let Err(err) = sim.spawn_orbit_weapon(&sample_weapon(), player) {
        tracing::warn!(%err, "Fixture weapon not spawned");
    }
    for (x, y) in [(6, 0), (-6, 0), (0, 6), (0, -6), (5, 5)] {
        sim.spawn_enemy(&sample_enemy(), Vec2Fixed::from_ints(x, y));
    }
    sim
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_helpers() {
        assert_eq!(fixed(3), Fixed::from_num(3));
        assert_eq!(half() * fixed(2), Fixed::ONE);
    }

    #[test]
    fn test_sample_records_are_valid() {
        assert!(sample_character().validate().is_ok());
        assert!(sample_enemy().validate().is_ok());
        assert!(sample_weapon().validate().is_ok());
    }

    #[test]
    fn test_world_with_player() {
        let (world, player) = spawn_world_with_player();
        assert!(world.has_component::<PlayerTag>(player));
        assert_eq!(world.get_component::<BaseStats>(player).unwrap().attack, 20);
    }

    #[test]
    fn test_arena_population() {
        let sim = spawn_simulation();
        assert_eq!(sim.world().component_count::<Team>(), 1 + 2 + 5);
    }
}
