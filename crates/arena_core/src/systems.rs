//! Gameplay systems.
//!
//! Each system reads a snapshot of the components it cares about, computes
//! new values and writes them back. A system that finds one of its inputs
//! missing skips that entity (or the whole tick) instead of failing.
//!
//! All systems use fixed-point math and iterate in entity-id order, so a
//! run is fully deterministic.

use std::collections::BTreeMap;

use crate::combatant::{cast_skill_with, CombatantSnapshot};
use crate::components::{
    Collider, DamageSource, ExperienceReward, Health, Magnet, Orbit, PickupKind, Pickupable,
    PlayerTag, Position, Rotation, Team, Velocity,
};
use crate::math::{wrap_angle, Fixed, Vec2Fixed};
use crate::progression::spawn_pickup;
use crate::scheduler::System;
use crate::skill::SkillPipeline;
use crate::world::{EntityId, World};

/// Minimum time between two contact hits of the same source on the same
/// target: 0.5 seconds.
pub const HIT_INTERVAL: Fixed = Fixed::from_bits(1 << 31);

/// Position of the player entity, if one exists.
#[must_use]
pub fn player_position(world: &World) -> Option<(EntityId, Vec2Fixed)> {
    let player = world.entities_with::<PlayerTag>().into_iter().next()?;
    let position = world.try_get_component::<Position>(player)?;
    Some((player, position.value))
}

/// Steers enemy velocities toward the player.
///
/// Without a player every enemy keeps its current heading.
pub fn chase_system(world: &mut World, _dt: Fixed) {
    let Some((player, target)) = player_position(world) else {
        tracing::trace!("No player to chase");
        return;
    };

    for (entity, mut velocity) in world.get_components::<Velocity>() {
        if entity == player || world.try_get_component::<Team>(entity) != Some(Team::Enemy) {
            continue;
        }
        let Some(position) = world.try_get_component::<Position>(entity) else {
            continue;
        };
        velocity.direction = (target - position.value).normalize();
        world.set_component(entity, velocity);
    }
}

/// Integrates velocities: `position += direction * speed * dt`.
pub fn movement_system(world: &mut World, dt: Fixed) {
    for (entity, velocity) in world.get_components::<Velocity>() {
        if velocity.is_stationary() {
            continue;
        }
        let Some(mut position) = world.try_get_component::<Position>(entity) else {
            continue;
        };
        position.value += velocity.displacement(dt);
        world.set_component(entity, position);
    }
}

/// Advances orbiters around their center and faces them along the angle.
///
/// An orbiter whose center no longer has a position is left where it is.
pub fn orbit_system(world: &mut World, dt: Fixed) {
    for (entity, mut orbit) in world.get_components::<Orbit>() {
        let Some(center) = world.try_get_component::<Position>(orbit.center) else {
            tracing::warn!(entity, center = orbit.center, "Orbit center is gone; skipping");
            continue;
        };

        orbit.angle = wrap_angle(orbit.angle + orbit.angular_speed * dt);
        let offset = Vec2Fixed::from_angle(orbit.angle).scale(orbit.radius);

        world.set_component(entity, Position::new(center.value + offset));
        world.set_component(entity, Rotation { angle: orbit.angle });
        world.set_component(entity, orbit);
    }
}

/// Pulls pickups inside an active magnet's radius toward the magnet owner.
///
/// A pickup never overshoots: once within one step it lands on the owner.
pub fn magnet_system(world: &mut World, dt: Fixed) {
    let pickups = world.entities_with::<Pickupable>();
    if pickups.is_empty() {
        return;
    }

    for (owner, magnet) in world.get_components::<Magnet>() {
        if !magnet.active {
            continue;
        }
        let Some(anchor) = world.try_get_component::<Position>(owner) else {
            continue;
        };
        let step = magnet.strength * dt;

        for &pickup in &pickups {
            let Some(mut position) = world.try_get_component::<Position>(pickup) else {
                continue;
            };
            if !anchor.value.within(position.value, magnet.radius) {
                continue;
            }
            let offset = anchor.value - position.value;
            position.value = if offset.length() <= step {
                anchor.value
            } else {
                position.value + offset.normalize().scale(step)
            };
            world.set_component(pickup, position);
        }
    }
}

/// Removes dead non-player entities, dropping their experience reward.
///
/// A dead player stays in the world; reacting to it is up to the caller.
pub fn death_system(world: &mut World, _dt: Fixed) {
    for (entity, health) in world.get_components::<Health>() {
        if !health.is_dead() || world.has_component::<PlayerTag>(entity) {
            continue;
        }

        let reward = world.try_get_component::<ExperienceReward>(entity);
        let position = world.try_get_component::<Position>(entity);
        if let (Some(reward), Some(position)) = (reward, position) {
            if reward.value > 0 {
                spawn_pickup(world, PickupKind::Experience, reward.value, position.value);
            }
        }

        world.destroy_entity(entity);
        tracing::info!(entity, "Entity died");
    }
}

/// Deals contact damage between overlapping hostile entities.
///
/// Every [`DamageSource`] with a [`Position`] and a [`Team`] is tested
/// against every hostile entity with [`Health`]. An overlap (sum of the
/// collider radii, zero without a collider) resolves a skill through the
/// pipeline, using the source's damage as attack. An orbiter borrows level,
/// tags and buff chain from its orbit center.
///
/// The same source can hit the same target at most once per
/// [`HIT_INTERVAL`]. A landed hit pushes the target away from the source by
/// the source's knockback distance.
#[derive(Debug, Default)]
pub struct ContactDamageSystem {
    pipeline: SkillPipeline,
    cooldowns: BTreeMap<(EntityId, EntityId), Fixed>,
    hits: u64,
}

impl ContactDamageSystem {
    /// Create the system with the standard pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the system with a custom pipeline.
    #[must_use]
    pub fn with_pipeline(pipeline: SkillPipeline) -> Self {
        Self {
            pipeline,
            ..Self::default()
        }
    }

    /// Total hits landed so far.
    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    /// Whether `source` is still waiting to hit `target` again.
    #[must_use]
    pub fn is_cooling_down(&self, source: EntityId, target: EntityId) -> bool {
        self.cooldowns.contains_key(&(source, target))
    }

    fn tick_cooldowns(&mut self, dt: Fixed) {
        for remaining in self.cooldowns.values_mut() {
            *remaining -= dt;
        }
        self.cooldowns.retain(|_, remaining| *remaining > Fixed::ZERO);
    }

    fn hit(&mut self, world: &mut World, source: EntityId, damage: DamageSource, target: EntityId) {
        let owner = world
            .try_get_component::<Orbit>(source)
            .map(|orbit| orbit.center)
            .filter(|&center| world.is_alive(center))
            .unwrap_or(source);
        let Some(snapshot) = CombatantSnapshot::capture(world, owner) else {
            return;
        };

        let ctx = cast_skill_with(
            world,
            &self.pipeline,
            &snapshot.with_attack(damage.damage),
            owner,
            target,
        );
        let Some(applied) = ctx.applied else {
            return;
        };

        self.cooldowns.insert((source, target), HIT_INTERVAL);
        self.hits += 1;
        tracing::debug!(source, target, damage = applied, "Contact hit");

        if damage.knockback > Fixed::ZERO {
            knock_back(world, source, target, damage.knockback);
        }
    }
}

impl System for ContactDamageSystem {
    fn name(&self) -> &'static str {
        "contact_damage"
    }

    fn update(&mut self, world: &mut World, dt: Fixed) {
        self.tick_cooldowns(dt);

        let targets = world.entities_with::<Health>();
        for (source, damage) in world.get_components::<DamageSource>() {
            let (Some(source_pos), Some(source_team)) = (
                world.try_get_component::<Position>(source),
                world.try_get_component::<Team>(source),
            ) else {
                continue;
            };
            let source_radius = collider_radius(world, source);

            for &target in &targets {
                if target == source || self.is_cooling_down(source, target) {
                    continue;
                }
                let Some(target_team) = world.try_get_component::<Team>(target) else {
                    continue;
                };
                if !source_team.is_hostile_to(target_team) {
                    continue;
                }
                let Some(target_pos) = world.try_get_component::<Position>(target) else {
                    continue;
                };
                let reach = source_radius + collider_radius(world, target);
                if source_pos.value.within(target_pos.value, reach) {
                    self.hit(world, source, damage, target);
                }
            }
        }
    }
}

fn collider_radius(world: &World, entity: EntityId) -> Fixed {
    world
        .try_get_component::<Collider>(entity)
        .map_or(Fixed::ZERO, |c| c.radius)
}

fn knock_back(world: &mut World, source: EntityId, target: EntityId, distance: Fixed) {
    let (Some(from), Some(mut position)) = (
        world.try_get_component::<Position>(source),
        world.try_get_component::<Position>(target),
    ) else {
        return;
    };
    let direction = (position.value - from.value).normalize();
    position.value += direction.scale(distance);
    world.set_component(target, position);
}
