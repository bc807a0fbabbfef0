//! Character definitions for players and enemies.

use serde::{Deserialize, Serialize};

use crate::buffs::BuffDef;
use crate::components::{BaseStats, SpriteKey};
use crate::error::{GameError, Result};
use crate::math::{fixed_serde, Fixed};

/// Stat growth per level above 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GrowthData {
    /// Attack gained per level.
    #[serde(default)]
    pub attack: i32,
    /// Defense gained per level.
    #[serde(default)]
    pub defense: i32,
    /// Maximum health gained per level.
    #[serde(default)]
    pub health: u32,
}

/// Pickup magnet carried by a character.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MagnetData {
    /// Attraction radius.
    #[serde(with = "fixed_serde")]
    pub radius: Fixed,
    /// Pull speed in units per second.
    #[serde(with = "fixed_serde")]
    pub strength: Fixed,
}

/// Damage dealt on body contact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactDamageData {
    /// Attack power of a contact hit.
    pub damage: i32,
    /// Knockback distance.
    #[serde(with = "fixed_serde", default)]
    pub knockback: Fixed,
}

/// Data-driven character definition.
///
/// # Example RON
///
/// ```ron
/// CharacterData(
///     id: "slime",
///     name: "Slime",
///     max_health: 30,
///     attack: 6,
///     defense: 1,
///     speed: 8589934592,  // Fixed-point for 2.0
///     collider_radius: 2147483648,  // Fixed-point for 0.5
///     contact_damage: Some(ContactDamageData(damage: 6)),
///     experience_reward: 3,
///     tags: ["melee"],
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterData {
    /// Unique string identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Starting level.
    #[serde(default = "default_level")]
    pub level: u32,

    /// Maximum health at level 1.
    pub max_health: u32,

    /// Attack at level 1.
    pub attack: i32,

    /// Defense at level 1.
    #[serde(default)]
    pub defense: i32,

    /// Growth per level.
    #[serde(default)]
    pub growth: GrowthData,

    /// Movement speed in units per second.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,

    /// Collision radius.
    #[serde(with = "fixed_serde")]
    pub collider_radius: Fixed,

    /// Pickup collection radius; zero disables collection.
    #[serde(with = "fixed_serde", default)]
    pub pickup_range: Fixed,

    /// Pickup magnet, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnet: Option<MagnetData>,

    /// Body contact damage, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_damage: Option<ContactDamageData>,

    /// Experience dropped on death.
    #[serde(default)]
    pub experience_reward: u32,

    /// Sprite used by the render sync.
    #[serde(default)]
    pub sprite: SpriteKey,

    /// Tags queried by skills.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Buffs attached at spawn, in order.
    #[serde(default)]
    pub starting_buffs: Vec<BuffDef>,
}

/// Default level for characters without an explicit level.
const fn default_level() -> u32 {
    1
}

impl CharacterData {
    /// Parse a character from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] for malformed text or an
    /// invalid record.
    pub fn from_ron(text: &str) -> Result<Self> {
        let data: Self = super::parse_ron("CharacterData", text)?;
        data.validate()?;
        Ok(data)
    }

    /// Check record invariants.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        let problem = if self.max_health == 0 {
            Some("max_health must be positive")
        } else if self.level == 0 {
            Some("level starts at 1")
        } else if self.speed < Fixed::ZERO || self.collider_radius < Fixed::ZERO {
            Some("speed and collider_radius must not be negative")
        } else {
            None
        };

        match problem {
            Some(message) => Err(GameError::DataParseError {
                source_name: self.id.clone(),
                message: message.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Stat block copied onto the spawned entity.
    #[must_use]
    pub fn base_stats(&self) -> BaseStats {
        BaseStats {
            attack: self.attack,
            defense: self.defense,
            max_health: self.max_health,
            attack_per_level: self.growth.attack,
            defense_per_level: self.growth.defense,
            health_per_level: self.growth.health,
        }
    }

    /// Check if this character has the specified tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
