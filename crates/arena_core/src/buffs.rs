//! Buffs and the per-combatant buff chain.
//!
//! A [`Buff`] reacts to being attached or detached and adjusts a
//! [`SkillContext`] while a skill resolves. A [`BuffController`] owns the
//! ordered chain for one combatant and applies it first-attached,
//! first-applied.
//!
//! The two built-in buffs deliberately write different damage fields:
//!
//! - [`IncreaseDamageBuff`] adds to [`DamageContext::value`], the running
//!   pre-final value.
//! - [`DecreaseDamageBuff`] subtracts from [`DamageContext::final_damage`],
//!   the number that gets committed to the target.
//!
//! With the standard pipeline an increase is therefore recorded but does not
//! change the committed damage, while a decrease does.
//!
//! [`DamageContext::value`]: crate::skill::DamageContext::value
//! [`DamageContext::final_damage`]: crate::skill::DamageContext::final_damage

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::skill::SkillContext;
use crate::world::{Component, EntityId};

/// Built-in buff vocabulary, used by the factory and by buff queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuffKind {
    /// Flat increase of the running damage value.
    IncreaseDamage,
    /// Flat reduction of the final damage.
    DecreaseDamage,
}

/// A modifier attached to a combatant.
pub trait Buff: fmt::Debug {
    /// Which kind of buff this is.
    fn kind(&self) -> BuffKind;

    /// Called once when the buff is attached to `owner`.
    fn on_attach(&mut self, _owner: EntityId) {}

    /// Called once when the buff is removed from `owner`.
    fn on_detach(&mut self, _owner: EntityId) {}

    /// Adjust the damage of a resolving skill.
    fn modify(&self, ctx: &mut SkillContext<'_>);

    /// Clone into a new box. Lets [`BuffController`] be a value component.
    fn clone_box(&self) -> Box<dyn Buff>;
}

impl Clone for Box<dyn Buff> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Adds a flat amount to the running damage value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncreaseDamageBuff {
    /// Amount added.
    pub amount: i32,
}

impl Buff for IncreaseDamageBuff {
    fn kind(&self) -> BuffKind {
        BuffKind::IncreaseDamage
    }

    fn modify(&self, ctx: &mut SkillContext<'_>) {
        ctx.damage.value = ctx.damage.value.saturating_add(self.amount);
    }

    fn clone_box(&self) -> Box<dyn Buff> {
        Box::new(*self)
    }
}

/// Subtracts a flat amount from the final damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecreaseDamageBuff {
    /// Amount subtracted.
    pub amount: i32,
}

impl Buff for DecreaseDamageBuff {
    fn kind(&self) -> BuffKind {
        BuffKind::DecreaseDamage
    }

    fn modify(&self, ctx: &mut SkillContext<'_>) {
        ctx.damage.final_damage = ctx.damage.final_damage.saturating_sub(self.amount);
    }

    fn clone_box(&self) -> Box<dyn Buff> {
        Box::new(*self)
    }
}

/// Build a buff from its kind and numeric value.
#[must_use]
pub fn create_buff(kind: BuffKind, value: i32) -> Box<dyn Buff> {
    match kind {
        BuffKind::IncreaseDamage => Box::new(IncreaseDamageBuff { amount: value }),
        BuffKind::DecreaseDamage => Box::new(DecreaseDamageBuff { amount: value }),
    }
}

/// Serializable buff description, used by character definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuffDef {
    /// Buff kind.
    pub kind: BuffKind,
    /// Numeric value handed to the factory.
    pub value: i32,
}

impl BuffDef {
    /// Instantiate through [`create_buff`].
    #[must_use]
    pub fn build(&self) -> Box<dyn Buff> {
        create_buff(self.kind, self.value)
    }
}

/// Ordered buff chain of one combatant.
#[derive(Debug, Clone, Default)]
pub struct BuffController {
    buffs: Vec<Box<dyn Buff>>,
}

impl Component for BuffController {}

impl BuffController {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a buff and notify it of its owner.
    pub fn add_buff(&mut self, mut buff: Box<dyn Buff>, owner: EntityId) {
        buff.on_attach(owner);
        tracing::trace!(owner, kind = ?buff.kind(), "Buff attached");
        self.buffs.push(buff);
    }

    /// Remove the earliest attached buff of `kind`, notifying it.
    pub fn remove_buff(&mut self, kind: BuffKind, owner: EntityId) -> Option<Box<dyn Buff>> {
        let index = self.buffs.iter().position(|b| b.kind() == kind)?;
        let mut buff = self.buffs.remove(index);
        buff.on_detach(owner);
        tracing::trace!(owner, ?kind, "Buff detached");
        Some(buff)
    }

    /// Run every buff's modifier over the context in attachment order.
    pub fn apply_damage_modifiers(&self, ctx: &mut SkillContext<'_>) {
        for buff in &self.buffs {
            buff.modify(ctx);
        }
    }

    /// Check whether a buff of `kind` is attached.
    #[must_use]
    pub fn has_buff(&self, kind: BuffKind) -> bool {
        self.buffs.iter().any(|b| b.kind() == kind)
    }

    /// Kinds of the attached buffs, in attachment order.
    #[must_use]
    pub fn kinds(&self) -> Vec<BuffKind> {
        self.buffs.iter().map(|b| b.kind()).collect()
    }

    /// Number of attached buffs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffs.len()
    }

    /// Check if no buffs are attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::test_support::{StubSource, StubTarget};
    use proptest::prelude::*;

    /// Appends its digit to the running value so the final number spells
    /// out the order in which modifiers ran.
    #[derive(Debug, Clone, Copy)]
    struct DigitBuff {
        digit: i32,
        attached_to: Option<EntityId>,
    }

    impl DigitBuff {
        fn new(digit: i32) -> Self {
            Self {
                digit,
                attached_to: None,
            }
        }
    }

    impl Buff for DigitBuff {
        fn kind(&self) -> BuffKind {
            BuffKind::IncreaseDamage
        }

        fn on_attach(&mut self, owner: EntityId) {
            self.attached_to = Some(owner);
        }

        fn modify(&self, ctx: &mut SkillContext<'_>) {
            ctx.damage.value = ctx.damage.value * 10 + self.digit;
        }

        fn clone_box(&self) -> Box<dyn Buff> {
            Box::new(*self)
        }
    }

    fn run_chain(chain: &BuffController) -> i32 {
        let source = StubSource::with_attack(1);
        let mut target = StubTarget::with_defense(0, 10);
        let mut ctx = SkillContext::new(&source, &mut target);
        chain.apply_damage_modifiers(&mut ctx);
        ctx.damage.value
    }

    #[test]
    fn test_factory_builds_requested_kind() {
        assert_eq!(create_buff(BuffKind::IncreaseDamage, 5).kind(), BuffKind::IncreaseDamage);
        assert_eq!(create_buff(BuffKind::DecreaseDamage, 5).kind(), BuffKind::DecreaseDamage);
    }

    #[test]
    fn test_increase_and_decrease_touch_different_fields() {
        let source = StubSource::with_attack(1);
        let mut target = StubTarget::with_defense(0, 10);
        let mut ctx = SkillContext::new(&source, &mut target);
        ctx.damage.value = 10;
        ctx.damage.final_damage = 10;

        create_buff(BuffKind::IncreaseDamage, 5).modify(&mut ctx);
        assert_eq!((ctx.damage.value, ctx.damage.final_damage), (15, 10));

        create_buff(BuffKind::DecreaseDamage, 3).modify(&mut ctx);
        assert_eq!((ctx.damage.value, ctx.damage.final_damage), (15, 7));
    }

    #[test]
    fn test_modifiers_apply_in_attachment_order() {
        let mut chain = BuffController::new();
        chain.add_buff(Box::new(DigitBuff::new(1)), 1);
        chain.add_buff(Box::new(DigitBuff::new(2)), 1);
        assert_eq!(run_chain(&chain), 12);
    }

    #[test]
    fn test_order_is_independent_of_other_chains() {
        let mut first = BuffController::new();
        let mut second = BuffController::new();
        first.add_buff(Box::new(DigitBuff::new(1)), 1);
        second.add_buff(Box::new(DigitBuff::new(9)), 2);
        first.add_buff(Box::new(DigitBuff::new(2)), 1);
        second.add_buff(Box::new(DigitBuff::new(8)), 2);

        assert_eq!(run_chain(&first), 12);
        assert_eq!(run_chain(&second), 98);
    }

    #[test]
    fn test_remove_buff_detaches_earliest_of_kind() {
        let mut chain = BuffController::new();
        chain.add_buff(create_buff(BuffKind::DecreaseDamage, 1), 4);
        chain.add_buff(create_buff(BuffKind::IncreaseDamage, 2), 4);
        chain.add_buff(create_buff(BuffKind::DecreaseDamage, 3), 4);

        assert!(chain.remove_buff(BuffKind::DecreaseDamage, 4).is_some());
        assert_eq!(
            chain.kinds(),
            vec![BuffKind::IncreaseDamage, BuffKind::DecreaseDamage]
        );
        assert!(chain.remove_buff(BuffKind::IncreaseDamage, 4).is_some());
        assert!(chain.remove_buff(BuffKind::IncreaseDamage, 4).is_none());
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut chain = BuffController::new();
        chain.add_buff(create_buff(BuffKind::IncreaseDamage, 2), 1);
        let copy = chain.clone();
        chain.add_buff(create_buff(BuffKind::DecreaseDamage, 2), 1);
        assert_eq!(copy.len(), 1);
        assert!(!copy.has_buff(BuffKind::DecreaseDamage));
        assert!(chain.has_buff(BuffKind::DecreaseDamage));
    }

    #[test]
    fn test_attach_notifies_owner() {
        let mut buff = DigitBuff::new(1);
        buff.on_attach(42);
        assert_eq!(buff.attached_to, Some(42));
        // Built-in buffs accept notifications as no-ops.
        let mut builtin = create_buff(BuffKind::DecreaseDamage, 1);
        builtin.on_attach(42);
        builtin.on_detach(42);
    }

    proptest! {
        #[test]
        fn prop_chain_applies_first_attached_first(digits in proptest::collection::vec(1i32..10, 1..7)) {
            let mut chain = BuffController::new();
            for &digit in &digits {
                chain.add_buff(Box::new(DigitBuff::new(digit)), 1);
            }
            let expected = digits.iter().fold(1, |acc, d| acc * 10 + d);
            // Running value starts at 0 when no base step ran; prefix with a 1.
            let source = StubSource::with_attack(1);
            let mut target = StubTarget::with_defense(0, 10);
            let mut ctx = SkillContext::new(&source, &mut target);
            ctx.damage.value = 1;
            chain.apply_damage_modifiers(&mut ctx);
            prop_assert_eq!(ctx.damage.value, expected);
        }
    }
}
