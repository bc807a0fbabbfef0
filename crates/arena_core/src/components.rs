//! Component definitions.
//!
//! Components are pure data with no behavior beyond small helpers. Every
//! value is fully valid once attached: constructors fill every field.

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed};
use crate::world::{Component, EntityId};

macro_rules! impl_component {
    ($($ty:ty),* $(,)?) => {
        $(impl Component for $ty {})*
    };
}

impl_component!(
    Position,
    Velocity,
    Rotation,
    Health,
    Collider,
    DamageSource,
    Orbit,
    SpriteKey,
    PickupRange,
    Pickupable,
    Magnet,
    PlayerTag,
    CameraFollow,
    AttributeDirty,
    Team,
    BaseStats,
    Level,
    Attributes,
    StatModifiers,
    ExperienceReward,
    Tags,
);

// ============================================================================
// Spatial
// ============================================================================

/// Position component in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// World position.
    pub value: Vec2Fixed,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(value: Vec2Fixed) -> Self {
        Self { value }
    }
}

/// Velocity component: a direction and a scalar speed.
///
/// Displacement per tick is `direction * speed * dt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Velocity {
    /// Heading, expected to be unit length or zero.
    pub direction: Vec2Fixed,
    /// Units per second.
    pub speed: Fixed,
}

impl Velocity {
    /// Create a new velocity.
    #[must_use]
    pub const fn new(direction: Vec2Fixed, speed: Fixed) -> Self {
        Self { direction, speed }
    }

    /// A stationary velocity with the given top speed.
    #[must_use]
    pub const fn idle(speed: Fixed) -> Self {
        Self {
            direction: Vec2Fixed::ZERO,
            speed,
        }
    }

    /// Displacement for an elapsed time.
    #[must_use]
    pub fn displacement(&self, dt: Fixed) -> Vec2Fixed {
        self.direction.scale(self.speed * dt)
    }

    /// Check if the entity is stationary.
    #[must_use]
    pub fn is_stationary(&self) -> bool {
        self.direction == Vec2Fixed::ZERO || self.speed == Fixed::ZERO
    }
}

/// Facing angle in radians.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rotation {
    /// Angle in radians.
    pub angle: Fixed,
}

/// Circular collision shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Collider {
    /// Radius in world units.
    pub radius: Fixed,
}

impl Collider {
    /// Create a collider with the given radius.
    #[must_use]
    pub const fn new(radius: Fixed) -> Self {
        Self { radius }
    }
}

/// Circular motion around another entity.
///
/// `center` is a non-owning reference: the center may be destroyed while
/// the orbiter lives on, so every lookup through it must tolerate absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Orbit {
    /// Entity being orbited.
    pub center: EntityId,
    /// Distance from the center.
    pub radius: Fixed,
    /// Radians per second.
    pub angular_speed: Fixed,
    /// Current angle in radians.
    pub angle: Fixed,
}

// ============================================================================
// Combat
// ============================================================================

/// Health component for damageable entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create new health component at full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if entity is dead (health == 0).
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Apply damage, returning actual damage dealt.
    /// Uses saturating subtraction to prevent underflow.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current = self.current.saturating_sub(actual);
        actual
    }

    /// Heal the entity, returning actual amount healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let headroom = self.max.saturating_sub(self.current);
        let actual = amount.min(headroom);
        self.current = self.current.saturating_add(actual);
        actual
    }

    /// Change the maximum. A raise grants the gained points, a cut clamps.
    pub fn set_max(&mut self, max: u32) {
        if max > self.max {
            self.current = self.current.saturating_add(max - self.max);
        }
        self.max = max;
        self.current = self.current.min(max);
    }

    /// Fraction of health remaining in `[0, 1]`; zero when `max` is zero.
    ///
    /// Read by the UI health bar.
    #[must_use]
    pub fn ratio(&self) -> Fixed {
        if self.max == 0 {
            return Fixed::ZERO;
        }
        // Computed on raw bits: pools past `i32::MAX` do not fit an integer `Fixed`.
        let current = u64::from(self.current.min(self.max));
        Fixed::from_bits(((current << Fixed::FRAC_NBITS) / u64::from(self.max)) as i64)
    }
}

/// Contact damage dealt to hostile entities on overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DamageSource {
    /// Attack power of the hit.
    pub damage: i32,
    /// Distance the victim is pushed away from the source.
    pub knockback: Fixed,
}

/// Side an entity fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Team {
    /// The player and everything they own.
    Player,
    /// Hostile creatures.
    #[default]
    Enemy,
}

impl Team {
    /// Check whether two teams fight each other.
    #[must_use]
    pub fn is_hostile_to(self, other: Self) -> bool {
        self != other
    }
}

/// Experience dropped when the entity dies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExperienceReward {
    /// Experience value of the dropped pickup.
    pub value: u32,
}

/// Free-form tags used by the skill source capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Tags {
    /// Tag names.
    pub tags: Vec<String>,
}

impl Tags {
    /// Build from a list of tag names.
    #[must_use]
    pub fn new(tags: Vec<String>) -> Self {
        Self { tags }
    }

    /// Check for a tag.
    #[must_use]
    pub fn has(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// Unmodified stat block copied from the character definition at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BaseStats {
    /// Attack at level 1.
    pub attack: i32,
    /// Defense at level 1.
    pub defense: i32,
    /// Maximum health at level 1.
    pub max_health: u32,
    /// Attack gained per level above 1.
    pub attack_per_level: i32,
    /// Defense gained per level above 1.
    pub defense_per_level: i32,
    /// Maximum health gained per level above 1.
    pub health_per_level: u32,
}

/// Character level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Level {
    /// Level, starting at 1.
    pub value: u32,
}

impl Default for Level {
    fn default() -> Self {
        Self { value: 1 }
    }
}

/// Derived combat attributes, recomputed whenever [`AttributeDirty`] is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attributes {
    /// Level the attributes were computed for.
    pub level: u32,
    /// Effective attack.
    pub attack: i32,
    /// Effective defense.
    pub defense: i32,
    /// Effective maximum health.
    pub max_health: u32,
}

/// Which derived attribute a modifier touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    /// Attack.
    Attack,
    /// Defense.
    Defense,
    /// Maximum health.
    MaxHealth,
}

/// A flat bonus (or malus) to one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatModifier {
    /// Affected attribute.
    pub stat: StatKind,
    /// Signed flat amount.
    pub amount: i32,
}

/// Ordered set of attribute modifiers on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StatModifiers {
    /// Modifiers in the order they were added.
    pub modifiers: Vec<StatModifier>,
}

impl StatModifiers {
    /// Sum of all modifiers for one attribute.
    #[must_use]
    pub fn total(&self, stat: StatKind) -> i32 {
        self.modifiers
            .iter()
            .filter(|m| m.stat == stat)
            .map(|m| m.amount)
            .sum()
    }
}

/// Marker: derived attributes must be recomputed.
///
/// Added whenever level or modifiers change and removed by the attribute
/// pass of the next scheduled run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AttributeDirty;

// ============================================================================
// Pickups
// ============================================================================

/// What a pickup grants when collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    /// Experience points.
    Experience,
    /// Restores health.
    Heal,
}

/// An item lying in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pickupable {
    /// Item type.
    pub kind: PickupKind,
    /// Amount granted.
    pub value: u32,
    /// Collected on contact without an explicit action.
    pub auto_pickup: bool,
}

/// Radius within which an entity collects pickups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PickupRange {
    /// Collection radius.
    pub radius: Fixed,
}

/// Pulls nearby pickups toward its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Magnet {
    /// Attraction radius.
    pub radius: Fixed,
    /// Pull speed in units per second.
    pub strength: Fixed,
    /// Whether the magnet is currently pulling.
    pub active: bool,
}

// ============================================================================
// Presentation-facing
// ============================================================================

/// Sprite lookup key, read by the render sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SpriteKey {
    /// Sprite sheet id.
    pub sheet_id: u32,
    /// Frame id within the sheet.
    pub key_id: u32,
}

/// Marker for the player-controlled entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlayerTag;

/// Marker for the entity the camera tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CameraFollow;
