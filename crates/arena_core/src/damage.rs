//! Base damage calculation.
//!
//! Pure functions: no component access, no logging, no side effects. The
//! result depends only on the two capabilities read from the context.

use crate::skill::SkillContext;

/// Minimum damage floor - a hit always deals at least 1 damage.
pub const MIN_DAMAGE: i32 = 1;

/// Base damage for an attack/defense pair: `max(attack - defense, 1)`.
#[must_use]
pub const fn base_damage(attack: i32, defense: i32) -> i32 {
    let raw = attack.saturating_sub(defense);
    if raw < MIN_DAMAGE {
        MIN_DAMAGE
    } else {
        raw
    }
}

/// Compute base damage from the context's source attack and target defense.
#[must_use]
pub fn calculate_damage(ctx: &SkillContext<'_>) -> i32 {
    base_damage(ctx.source.attack(), ctx.target.defense())
}
