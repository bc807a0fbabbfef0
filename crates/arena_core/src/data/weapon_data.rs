//! Orbiting weapon definitions.

use serde::{Deserialize, Serialize};

use crate::components::SpriteKey;
use crate::error::{GameError, Result};
use crate::math::{fixed_serde, Fixed};

/// Data-driven orbiting weapon.
///
/// A weapon spawns `blade_count` blades evenly spaced around its owner.
///
/// # Example RON
///
/// ```ron
/// WeaponData(
///     id: "twin_blades",
///     damage: 8,
///     knockback: 4294967296,  // Fixed-point for 1.0
///     orbit_radius: 12884901888,  // Fixed-point for 3.0
///     angular_speed: 8589934592,  // Fixed-point for 2.0 rad/s
///     collider_radius: 2147483648,  // Fixed-point for 0.5
///     blade_count: 2,
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeaponData {
    /// Unique string identifier.
    pub id: String,

    /// Attack power of one blade hit.
    pub damage: i32,

    /// Knockback distance.
    #[serde(with = "fixed_serde", default)]
    pub knockback: Fixed,

    /// Distance from the owner.
    #[serde(with = "fixed_serde")]
    pub orbit_radius: Fixed,

    /// Radians per second.
    #[serde(with = "fixed_serde")]
    pub angular_speed: Fixed,

    /// Blade collision radius.
    #[serde(with = "fixed_serde")]
    pub collider_radius: Fixed,

    /// Number of blades.
    #[serde(default = "default_blade_count")]
    pub blade_count: u32,

    /// Blade sprite.
    #[serde(default)]
    pub sprite: SpriteKey,
}

const fn default_blade_count() -> u32 {
    1
}

impl WeaponData {
    /// Parse a weapon from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] for malformed text or an
    /// invalid record.
    pub fn from_ron(text: &str) -> Result<Self> {
        let data: Self = super::parse_ron("WeaponData", text)?;
        data.validate()?;
        Ok(data)
    }

    /// Check record invariants.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.blade_count == 0 {
            return Err(GameError::DataParseError {
                source_name: self.id.clone(),
                message: "blade_count must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Starting angle of blade `index`, spacing blades evenly on the circle.
    #[must_use]
    pub fn blade_angle(&self, index: u32) -> Fixed {
        if self.blade_count == 0 {
            return Fixed::ZERO;
        }
        Fixed::TAU / Fixed::from_num(self.blade_count) * Fixed::from_num(index)
    }
}
