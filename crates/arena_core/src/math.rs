//! Fixed-point math utilities for deterministic simulation.
//!
//! All continuous simulation quantities (positions, speeds, radii, angles,
//! elapsed time) use fixed-point arithmetic so that identical inputs give
//! identical outputs on every platform.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Check whether `other` lies within `radius` of this point (inclusive).
    #[must_use]
    pub fn within(self, other: Self, radius: Fixed) -> bool {
        self.distance_squared(other) <= radius.saturating_mul(radius)
    }

    /// Dot product of two vectors.
    #[must_use]
    ///
    /// Saturates instead of overflowing for far-apart points.
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
    }

    /// Length of the vector.
    ///
    /// Scaled by the larger component first, so the squares never leave
    /// the `[0, 2]` range.
    #[must_use]
    pub fn length(self) -> Fixed {
        let Some((largest, unit)) = self.reduced() else {
            return Fixed::ZERO;
        };
        largest.saturating_mul(fixed_sqrt(unit.dot(unit)))
    }

    /// Scale both components by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Normalize vector using fixed-point math.
    ///
    /// The zero vector normalizes to zero.
    #[must_use]
    pub fn normalize(self) -> Self {
        let Some((_, unit)) = self.reduced() else {
            return Self::ZERO;
        };
        // `unit` has its larger component at +-1, so `len` is in [1, sqrt 2].
        let len = fixed_sqrt(unit.dot(unit));
        Self::new(unit.x / len, unit.y / len)
    }

    /// Splits the vector into its largest absolute component and the vector
    /// divided by it. `None` for the zero vector.
    fn reduced(self) -> Option<(Fixed, Self)> {
        let largest = self.x.saturating_abs().max(self.y.saturating_abs());
        if largest == Fixed::ZERO {
            return None;
        }
        Some((largest, Self::new(self.x / largest, self.y / largest)))
    }

    /// Unit vector pointing along `angle` (radians).
    #[must_use]
    pub fn from_angle(angle: Fixed) -> Self {
        Self::new(fixed_cos(angle), fixed_sin(angle))
    }
}

/// Square root of a fixed-point number; non-positive input gives zero.
///
/// Delegates to the `fixed` crate, which rounds toward zero and is exact
/// for perfect squares.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }
    value.sqrt()
}

/// Wrap an angle into `[0, TAU)`.
#[must_use]
pub fn wrap_angle(angle: Fixed) -> Fixed {
    let wrapped = angle % Fixed::TAU;
    if wrapped < Fixed::ZERO {
        wrapped + Fixed::TAU
    } else {
        wrapped
    }
}

/// Fixed-point sine.
///
/// Reduces the argument to `[-PI/2, PI/2]` and evaluates a 9th order Taylor
/// polynomial; absolute error stays below 1e-5.
#[must_use]
pub fn fixed_sin(angle: Fixed) -> Fixed {
    let mut x = wrap_angle(angle);
    if x > Fixed::PI {
        x -= Fixed::TAU;
    }
    if x > Fixed::FRAC_PI_2 {
        x = Fixed::PI - x;
    } else if x < -Fixed::FRAC_PI_2 {
        x = -Fixed::PI - x;
    }

    let x2 = x * x;
    // Horner form of x - x^3/3! + x^5/5! - x^7/7! + x^9/9!
    let mut term = Fixed::ONE - x2 / Fixed::from_num(72);
    term = Fixed::ONE - x2 / Fixed::from_num(42) * term;
    term = Fixed::ONE - x2 / Fixed::from_num(20) * term;
    term = Fixed::ONE - x2 / Fixed::from_num(6) * term;
    x * term
}

/// Fixed-point cosine.
#[must_use]
pub fn fixed_cos(angle: Fixed) -> Fixed {
    fixed_sin(wrap_angle(angle) + Fixed::FRAC_PI_2)
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::AddAssign for Vec2Fixed {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}
