//! Proptest strategies.
//!
//! These strategies generate random but reproducible inputs for
//! property-based testing of the simulation core.

use arena_core::buffs::{BuffDef, BuffKind};
use arena_core::components::{StatKind, StatModifier};
use arena_core::math::{Fixed, Vec2Fixed};
use proptest::prelude::*;

/// Generate a fixed-point number in a reasonable range for positions.
///
/// Range: -1000 to 1000 (typical arena size)
pub fn arb_fixed_position() -> impl Strategy<Value = Fixed> {
    (-1000i32..1000i32).prop_map(Fixed::from_num)
}

/// Generate a fixed-point 2D vector for positions.
pub fn arb_vec2_position() -> impl Strategy<Value = Vec2Fixed> {
    (arb_fixed_position(), arb_fixed_position()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
}

/// Generate a tick duration between 1/120 s and 1/10 s.
pub fn arb_dt() -> impl Strategy<Value = Fixed> {
    (10i32..=120i32).prop_map(|rate| Fixed::ONE / Fixed::from_num(rate))
}

/// Generate attack or defense values, including negative ones.
pub fn arb_stat() -> impl Strategy<Value = i32> {
    -500i32..500i32
}

/// Generate health values (1-1000).
pub fn arb_health() -> impl Strategy<Value = u32> {
    1u32..1000u32
}

/// Generate a buff kind.
pub fn arb_buff_kind() -> impl Strategy<Value = BuffKind> {
    prop_oneof![Just(BuffKind::IncreaseDamage), Just(BuffKind::DecreaseDamage)]
}

/// Generate a buff description with a modest value.
pub fn arb_buff_def() -> impl Strategy<Value = BuffDef> {
    (arb_buff_kind(), 0i32..50i32).prop_map(|(kind, value)| BuffDef { kind, value })
}

/// Generate an ordered buff chain description.
pub fn arb_buff_chain(max_len: usize) -> impl Strategy<Value = Vec<BuffDef>> {
    proptest::collection::vec(arb_buff_def(), 0..max_len)
}

/// Generate an attribute modifier.
pub fn arb_stat_modifier() -> impl Strategy<Value = StatModifier> {
    (
        prop_oneof![
            Just(StatKind::Attack),
            Just(StatKind::Defense),
            Just(StatKind::MaxHealth),
        ],
        -20i32..20i32,
    )
        .prop_map(|(stat, amount)| StatModifier { stat, amount })
}
