//! Core simulation loop.
//!
//! [`Simulation`] owns the [`World`], the [`Scheduler`] and the shared
//! [`ExperienceSystem`]. Each [`tick`](Simulation::tick) runs every system
//! once, in this order:
//!
//! 1. chase (enemies steer toward the player)
//! 2. movement
//! 3. orbit
//! 4. magnet
//! 5. pickup
//! 6. contact damage
//! 7. death
//! 8. experience
//! 9. attributes
//!
//! The order is part of the public contract. Level-ups written by the
//! experience system are turned into attributes by the attribute pass of
//! the same tick.
//!
//! # Determinism
//!
//! - No floating-point math (uses fixed-point via [`Fixed`])
//! - No randomness
//! - Every query iterates in entity-id order
//!
//! # Example
//!
//! ```
//! use arena_core::data::CharacterData;
//! use arena_core::math::{Fixed, Vec2Fixed};
//! use arena_core::simulation::Simulation;
//!
//! let hero = CharacterData::from_ron(r#"
//!     CharacterData(
//!         id: "hero",
//!         name: "Hero",
//!         max_health: 100,
//!         attack: 10,
//!         speed: 4294967296,
//!         collider_radius: 2147483648,
//!     )
//! "#).unwrap();
//!
//! let mut sim = Simulation::new();
//! sim.spawn_player(&hero);
//! sim.set_player_direction(Vec2Fixed::from_ints(1, 0)).unwrap();
//! sim.tick(Fixed::ONE);
//!
//! assert_eq!(sim.get_tick(), 1);
//! ```

use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::attributes::{attribute_system, compute_attributes};
use crate::buffs::BuffController;
use crate::components::{
    Attributes, CameraFollow, Collider, DamageSource, ExperienceReward, Health, Level, Magnet,
    Orbit, PickupKind, PickupRange, Pickupable, PlayerTag, Position, Rotation, StatModifiers,
    Tags, Team, Velocity,
};
use crate::data::{CharacterData, WeaponData};
use crate::error::{GameError, Result};
use crate::math::{Fixed, Vec2Fixed};
use crate::progression::{spawn_pickup, ExperienceSystem, PickupSystem};
use crate::scheduler::Scheduler;
use crate::systems::{
    chase_system, death_system, magnet_system, movement_system, orbit_system,
    ContactDamageSystem,
};
use crate::world::{EntityId, World};

/// Ticks per second for the simulation.
pub const TICK_RATE: u32 = 60;

/// Elapsed time of one tick at [`TICK_RATE`].
#[must_use]
pub fn tick_duration() -> Fixed {
    Fixed::ONE / Fixed::from_num(TICK_RATE)
}

/// The main simulation state.
pub struct Simulation {
    tick: u64,
    world: World,
    scheduler: Scheduler,
    experience: Rc<RefCell<ExperienceSystem>>,
}

impl Simulation {
    /// Create an empty simulation with the standard system order.
    #[must_use]
    pub fn new() -> Self {
        let mut world = World::new();
        let experience = world.register_service(ExperienceSystem::new());

        let mut scheduler = Scheduler::new();
        scheduler
            .add_fn("chase", chase_system)
            .add_fn("movement", movement_system)
            .add_fn("orbit", orbit_system)
            .add_fn("magnet", magnet_system)
            .add_system(PickupSystem::new())
            .add_system(ContactDamageSystem::new())
            .add_fn("death", death_system)
            .add_shared(Rc::clone(&experience))
            .add_fn("attributes", attribute_system);

        Self {
            tick: 0,
            world,
            scheduler,
            experience,
        }
    }

    /// Get the current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Read access to the world, e.g. for render and UI sync.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Write access to the world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The system scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Progression service, as looked up by UI sync.
    #[must_use]
    pub fn experience(&self) -> Option<Rc<RefCell<ExperienceSystem>>> {
        self.world.try_get_service::<ExperienceSystem>()
    }

    /// The player entity, if spawned.
    #[must_use]
    pub fn player(&self) -> Option<EntityId> {
        self.world.entities_with::<PlayerTag>().into_iter().next()
    }

    /// Advance the simulation by one tick of `dt` seconds.
    pub fn tick(&mut self, dt: Fixed) {
        self.scheduler.run(&mut self.world, dt);
        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }
    }

    /// Spawn the player from a character record.
    ///
    /// Progression restarts at the record's level.
    pub fn spawn_player(&mut self, data: &CharacterData) -> EntityId {
        let player = self.spawn_character(data, Team::Player, Vec2Fixed::ZERO);
        self.world.add_component(player, PlayerTag);
        self.world.add_component(player, CameraFollow);

        match self.experience.try_borrow_mut() {
            Ok(mut experience) => experience.reset_to_level(data.level),
            Err(_) => tracing::warn!("Experience service busy; progression not reset"),
        }

        tracing::info!(entity = player, id = %data.id, "Player spawned");
        player
    }

    /// Spawn an enemy from a character record.
    pub fn spawn_enemy(&mut self, data: &CharacterData, position: Vec2Fixed) -> EntityId {
        let enemy = self.spawn_character(data, Team::Enemy, position);
        if data.experience_reward > 0 {
            self.world.add_component(
                enemy,
                ExperienceReward {
                    value: data.experience_reward,
                },
            );
        }
        tracing::debug!(entity = enemy, id = %data.id, "Enemy spawned");
        enemy
    }

    /// Spawn the blades of an orbiting weapon around `owner`.
    ///
    /// Blades fight for the owner's team.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::EntityNotFound`] if `owner` has no position.
    pub fn spawn_orbit_weapon(&mut self, data: &WeaponData, owner: EntityId) -> Result<Vec<EntityId>> {
        let center = self
            .world
            .try_get_component::<Position>(owner)
            .ok_or(GameError::EntityNotFound(owner))?;
        let team = self
            .world
            .try_get_component::<Team>(owner)
            .unwrap_or(Team::Player);

        let blades = (0..data.blade_count)
            .map(|index| {
                let angle = data.blade_angle(index);
                let offset = Vec2Fixed::from_angle(angle).scale(data.orbit_radius);
                let blade = self.world.create_entity();
                self.world.add_component(blade, Position::new(center.value + offset));
                self.world.add_component(blade, Rotation { angle });
                self.world.add_component(
                    blade,
                    Orbit {
                        center: owner,
                        radius: data.orbit_radius,
                        angular_speed: data.angular_speed,
                        angle,
                    },
                );
                self.world.add_component(blade, Collider::new(data.collider_radius));
                self.world.add_component(
                    blade,
                    DamageSource {
                        damage: data.damage,
                        knockback: data.knockback,
                    },
                );
                self.world.add_component(blade, team);
                self.world.add_component(blade, data.sprite);
                blade
            })
            .collect();

        tracing::debug!(owner, id = %data.id, count = data.blade_count, "Weapon spawned");
        Ok(blades)
    }

    /// Spawn a pickup lying in the world.
    pub fn spawn_pickup(&mut self, kind: PickupKind, value: u32, position: Vec2Fixed) -> EntityId {
        spawn_pickup(&mut self.world, kind, value, position)
    }

    /// Set the player's heading. The direction is normalized; zero stops.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] without a player and
    /// [`GameError::ComponentNotFound`] if the player cannot move.
    pub fn set_player_direction(&mut self, direction: Vec2Fixed) -> Result<()> {
        let player = self
            .player()
            .ok_or_else(|| GameError::InvalidState("no player entity".to_string()))?;
        let mut velocity = self.world.get_component::<Velocity>(player)?;
        velocity.direction = direction.normalize();
        self.world.set_component(player, velocity);
        Ok(())
    }

    /// Calculate a hash of the observable simulation state.
    ///
    /// Two simulations fed the same inputs produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.world.entity_count().hash(&mut hasher);

        for (id, position) in self.world.get_components::<Position>() {
            id.hash(&mut hasher);
            position.hash(&mut hasher);
        }
        for (id, velocity) in self.world.get_components::<Velocity>() {
            id.hash(&mut hasher);
            velocity.hash(&mut hasher);
        }
        for (id, health) in self.world.get_components::<Health>() {
            id.hash(&mut hasher);
            health.hash(&mut hasher);
        }
        for (id, orbit) in self.world.get_components::<Orbit>() {
            id.hash(&mut hasher);
            orbit.hash(&mut hasher);
        }
        for (id, attributes) in self.world.get_components::<Attributes>() {
            id.hash(&mut hasher);
            attributes.hash(&mut hasher);
        }
        for (id, pickup) in self.world.get_components::<Pickupable>() {
            id.hash(&mut hasher);
            pickup.hash(&mut hasher);
        }

        if let Ok(experience) = self.experience.try_borrow() {
            experience.level().hash(&mut hasher);
            experience.total_experience().hash(&mut hasher);
        }

        hasher.finish()
    }

    fn spawn_character(&mut self, data: &CharacterData, team: Team, position: Vec2Fixed) -> EntityId {
        let entity = self.world.create_entity();
        let base = data.base_stats();
        let modifiers = StatModifiers::default();
        let attributes = compute_attributes(&base, data.level, &modifiers);

        self.world.add_component(entity, Position::new(position));
        self.world.add_component(entity, Velocity::idle(data.speed));
        self.world.add_component(entity, Rotation::default());
        self.world.add_component(entity, Collider::new(data.collider_radius));
        self.world.add_component(entity, Health::new(attributes.max_health));
        self.world.add_component(entity, team);
        self.world.add_component(entity, base);
        self.world.add_component(entity, Level { value: attributes.level });
        self.world.add_component(entity, modifiers);
        self.world.add_component(entity, attributes);
        self.world.add_component(entity, data.sprite);

        if !data.tags.is_empty() {
            self.world.add_component(entity, Tags::new(data.tags.clone()));
        }
        if data.pickup_range > Fixed::ZERO {
            self.world.add_component(
                entity,
                PickupRange {
                    radius: data.pickup_range,
                },
            );
        }
        if let Some(magnet) = data.magnet {
            self.world.add_component(
                entity,
                Magnet {
                    radius: magnet.radius,
                    strength: magnet.strength,
                    active: true,
                },
            );
        }
        if let Some(contact) = data.contact_damage {
            self.world.add_component(
                entity,
                DamageSource {
                    damage: contact.damage,
                    knockback: contact.knockback,
                },
            );
        }
        if !data.starting_buffs.is_empty() {
            let mut chain = BuffController::new();
            for buff in &data.starting_buffs {
                chain.add_buff(buff.build(), entity);
            }
            self.world.add_component(entity, chain);
        }

        entity
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.tick)
            .field("entities", &self.world.entity_count())
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}
