//! Experience, levels and pickups.
//!
//! [`ExperienceSystem`] is both a scheduled system and a world service: the
//! [`PickupSystem`] and the UI sync find it through the service registry.
//! The pickup side never holds it at construction time; it looks it up
//! every tick until the service shows up.

use std::cell::RefCell;
use std::rc::Rc;

use crate::components::{
    AttributeDirty, Collider, Health, Level, PickupKind, PickupRange, Pickupable, PlayerTag,
    Position,
};
use crate::math::{Fixed, Vec2Fixed};
use crate::scheduler::System;
use crate::world::{EntityId, World};

/// Experience needed to leave level 1.
pub const BASE_EXPERIENCE: u32 = 10;

/// Additional experience needed for every level above 1.
pub const EXPERIENCE_PER_LEVEL: u32 = 5;

/// Collision radius of dropped pickups.
pub const PICKUP_RADIUS: Fixed = Fixed::from_bits(1 << 31);

/// Experience needed to advance from `level` to the next one.
#[must_use]
pub const fn experience_for_level(level: u32) -> u32 {
    let extra = EXPERIENCE_PER_LEVEL.saturating_mul(level.saturating_sub(1));
    BASE_EXPERIENCE.saturating_add(extra)
}

/// Spawn an auto-collected pickup.
pub fn spawn_pickup(world: &mut World, kind: PickupKind, value: u32, position: Vec2Fixed) -> EntityId {
    let pickup = world.create_entity();
    world.add_component(pickup, Position::new(position));
    world.add_component(pickup, Collider::new(PICKUP_RADIUS));
    world.add_component(
        pickup,
        Pickupable {
            kind,
            value,
            auto_pickup: true,
        },
    );
    tracing::trace!(entity = pickup, ?kind, value, "Pickup spawned");
    pickup
}

/// Player progression.
///
/// Collected experience is banked with [`add_experience`] and converted into
/// levels when the system runs. A level-up writes the player's [`Level`]
/// and marks it [`AttributeDirty`].
///
/// [`add_experience`]: ExperienceSystem::add_experience
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperienceSystem {
    level: u32,
    experience: u32,
    total_experience: u64,
    pending: u32,
}

impl Default for ExperienceSystem {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
            total_experience: 0,
            pending: 0,
        }
    }
}

impl ExperienceSystem {
    /// Start at level 1 with no experience.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart progression at `level`, dropping collected experience.
    pub fn reset_to_level(&mut self, level: u32) {
        *self = Self {
            level: level.max(1),
            ..Self::default()
        };
    }

    /// Bank experience to be processed on the next run.
    pub fn add_experience(&mut self, amount: u32) {
        self.pending = self.pending.saturating_add(amount);
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Experience collected toward the next level.
    #[must_use]
    pub const fn experience(&self) -> u32 {
        self.experience
    }

    /// Experience collected since the start, including banked amounts.
    #[must_use]
    pub fn total_experience(&self) -> u64 {
        self.total_experience + u64::from(self.pending)
    }

    /// Experience needed to reach the next level.
    #[must_use]
    pub const fn experience_to_next_level(&self) -> u32 {
        experience_for_level(self.level)
    }

    /// Progress toward the next level in `[0, 1)`.
    #[must_use]
    pub fn experience_ratio(&self) -> Fixed {
        let needed = self.experience_to_next_level();
        if needed == 0 {
            return Fixed::ZERO;
        }
        Fixed::from_num(self.experience) / Fixed::from_num(needed)
    }

    /// Apply banked experience. Returns the number of levels gained.
    fn settle(&mut self) -> u32 {
        if self.pending == 0 {
            return 0;
        }
        self.total_experience += u64::from(self.pending);
        self.experience = self.experience.saturating_add(self.pending);
        self.pending = 0;

        let mut gained = 0;
        while self.experience >= self.experience_to_next_level() {
            self.experience -= self.experience_to_next_level();
            self.level += 1;
            gained += 1;
        }
        gained
    }
}

impl System for ExperienceSystem {
    fn name(&self) -> &'static str {
        "experience"
    }

    fn update(&mut self, world: &mut World, _dt: Fixed) {
        let gained = self.settle();
        if gained == 0 {
            return;
        }

        tracing::info!(level = self.level, gained, "Level up");

        let Some(player) = world.entities_with::<PlayerTag>().into_iter().next() else {
            tracing::debug!(level = self.level, "Level up without a player entity");
            return;
        };
        world.set_component(player, Level { value: self.level });
        world.set_component(player, AttributeDirty);
    }
}

/// Collects auto-pickup items within the player's pickup range.
///
/// Experience goes to the [`ExperienceSystem`] service, healing to the
/// player's [`Health`]. Nothing is collected while the service is missing.
#[derive(Debug, Default)]
pub struct PickupSystem {
    experience: Option<Rc<RefCell<ExperienceSystem>>>,
    collected: u64,
}

impl PickupSystem {
    /// Create the system with no resolved service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pickups collected so far.
    #[must_use]
    pub const fn collected(&self) -> u64 {
        self.collected
    }

    /// Whether the experience service has been found.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.experience.is_some()
    }

    fn collect(
        experience: &RefCell<ExperienceSystem>,
        world: &mut World,
        player: EntityId,
        pickup: Pickupable,
    ) -> bool {
        match pickup.kind {
            PickupKind::Experience => {
                let Ok(mut progression) = experience.try_borrow_mut() else {
                    tracing::warn!("Experience service busy; pickup left in place");
                    return false;
                };
                progression.add_experience(pickup.value);
            }
            PickupKind::Heal => {
                let Some(mut health) = world.try_get_component::<Health>(player) else {
                    tracing::trace!(entity = player, "Player has no health; heal left in place");
                    return false;
                };
                health.heal(pickup.value);
                world.set_component(player, health);
            }
        }
        true
    }
}

impl System for PickupSystem {
    fn name(&self) -> &'static str {
        "pickup"
    }

    fn update(&mut self, world: &mut World, _dt: Fixed) {
        if self.experience.is_none() {
            self.experience = world.try_get_service::<ExperienceSystem>();
        }
        let Some(experience) = self.experience.clone() else {
            tracing::trace!("Experience service not registered yet");
            return;
        };

        let Some(player) = world.entities_with::<PlayerTag>().into_iter().next() else {
            return;
        };
        let (Some(anchor), Some(range)) = (
            world.try_get_component::<Position>(player),
            world.try_get_component::<PickupRange>(player),
        ) else {
            return;
        };

        for (entity, pickup) in world.get_components::<Pickupable>() {
            if !pickup.auto_pickup {
                continue;
            }
            let Some(position) = world.try_get_component::<Position>(entity) else {
                continue;
            };
            if !anchor.value.within(position.value, range.radius) {
                continue;
            }
            if Self::collect(&experience, world, player, pickup) {
                world.destroy_entity(entity);
                self.collected += 1;
                tracing::debug!(entity, kind = ?pickup.kind, value = pickup.value, "Pickup collected");
            }
        }
    }
}
