//! Skill resolution pipeline.
//!
//! A cast builds a transient [`SkillContext`] and runs it through an ordered
//! list of [`SkillStep`]s. The standard order is fixed:
//!
//! 1. [`CalculateBaseDamage`] - base damage must exist before any modifier.
//! 2. [`ApplySourceBuffs`] - the caster's buff chain.
//! 3. [`ApplyTargetBuffs`] - the target's buff chain.
//! 4. [`ApplyFinalDamage`] - commit the result to the target.
//!
//! Steps only communicate through [`DamageContext`]. A missing buff chain
//! turns its step into a no-op.
//!
//! ```
//! use arena_core::buffs::{create_buff, BuffController, BuffKind};
//! use arena_core::skill::{SkillContext, SkillPipeline, SkillSource, SkillTarget};
//!
//! struct Caster;
//! impl SkillSource for Caster {
//!     fn level(&self) -> u32 { 1 }
//!     fn attack(&self) -> i32 { 20 }
//!     fn has_tag(&self, _tag: &str) -> bool { false }
//! }
//!
//! struct Dummy { hp: u32 }
//! impl SkillTarget for Dummy {
//!     fn defense(&self) -> i32 { 5 }
//!     fn is_alive(&self) -> bool { self.hp > 0 }
//!     fn apply_damage(&mut self, amount: u32) -> u32 {
//!         let dealt = amount.min(self.hp);
//!         self.hp -= dealt;
//!         dealt
//!     }
//!     fn has_buff(&self, _kind: BuffKind) -> bool { false }
//! }
//!
//! let mut chain = BuffController::new();
//! chain.add_buff(create_buff(BuffKind::IncreaseDamage, 5), 1);
//!
//! let caster = Caster;
//! let mut dummy = Dummy { hp: 100 };
//! let mut ctx = SkillContext::new(&caster, &mut dummy).with_source_buffs(Some(&chain));
//! let applied = SkillPipeline::standard().execute(&mut ctx);
//!
//! assert_eq!(ctx.damage.value, 20);
//! assert_eq!(applied, Some(15));
//! ```

use std::fmt;

use crate::buffs::{BuffController, BuffKind};
use crate::damage::calculate_damage;
use crate::math::Fixed;

/// What the pipeline needs from whoever casts the skill.
pub trait SkillSource {
    /// Caster level.
    fn level(&self) -> u32;
    /// Effective attack.
    fn attack(&self) -> i32;
    /// Tag query.
    fn has_tag(&self, tag: &str) -> bool;
}

/// What the pipeline needs from whoever receives the skill.
pub trait SkillTarget {
    /// Effective defense.
    fn defense(&self) -> i32;
    /// Whether the target can still take damage.
    fn is_alive(&self) -> bool;
    /// Apply damage, returning the amount actually removed.
    fn apply_damage(&mut self, amount: u32) -> u32;
    /// Buff query.
    fn has_buff(&self, kind: BuffKind) -> bool;
}

/// Numbers flowing between the pipeline steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageContext {
    /// Output of the damage calculator.
    pub base_damage: i32,
    /// Running value adjusted by pre-final modifiers.
    pub value: i32,
    /// Value committed to the target.
    pub final_damage: i32,
    /// Scale applied to `final_damage` at commit time.
    pub multiplier: Fixed,
    /// Whether the hit was critical.
    pub is_critical: bool,
    /// Amount committed by the final step, `None` until it ran.
    pub applied: Option<u32>,
}

impl Default for DamageContext {
    fn default() -> Self {
        Self {
            base_damage: 0,
            value: 0,
            final_damage: 0,
            multiplier: Fixed::ONE,
            is_critical: false,
            applied: None,
        }
    }
}

/// Per-cast state shared by every pipeline step. Never stored.
pub struct SkillContext<'a> {
    /// Caster capabilities.
    pub source: &'a dyn SkillSource,
    /// Target capabilities.
    pub target: &'a mut dyn SkillTarget,
    /// Caster's buff chain, if any.
    pub source_buffs: Option<&'a BuffController>,
    /// Target's buff chain, if any.
    pub target_buffs: Option<&'a BuffController>,
    /// Damage numbers.
    pub damage: DamageContext,
}

impl<'a> SkillContext<'a> {
    /// Create a context with no buff chains.
    pub fn new(source: &'a dyn SkillSource, target: &'a mut dyn SkillTarget) -> Self {
        Self {
            source,
            target,
            source_buffs: None,
            target_buffs: None,
            damage: DamageContext::default(),
        }
    }

    /// Attach the caster's buff chain.
    #[must_use]
    pub fn with_source_buffs(mut self, buffs: Option<&'a BuffController>) -> Self {
        self.source_buffs = buffs;
        self
    }

    /// Attach the target's buff chain.
    #[must_use]
    pub fn with_target_buffs(mut self, buffs: Option<&'a BuffController>) -> Self {
        self.target_buffs = buffs;
        self
    }
}

impl fmt::Debug for SkillContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillContext")
            .field("source_buffs", &self.source_buffs.map(BuffController::len))
            .field("target_buffs", &self.target_buffs.map(BuffController::len))
            .field("damage", &self.damage)
            .finish_non_exhaustive()
    }
}

/// One stage of the pipeline.
pub trait SkillStep {
    /// Step name for logs.
    fn name(&self) -> &'static str;
    /// Run the step.
    fn execute(&self, ctx: &mut SkillContext<'_>);
}

/// Seeds every damage field with the calculator's output.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculateBaseDamage;

impl SkillStep for CalculateBaseDamage {
    fn name(&self) -> &'static str {
        "calculate_base_damage"
    }

    fn execute(&self, ctx: &mut SkillContext<'_>) {
        let base = calculate_damage(ctx);
        ctx.damage.base_damage = base;
        ctx.damage.value = base;
        ctx.damage.final_damage = base;
    }
}

/// Applies the caster's buff chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplySourceBuffs;

impl SkillStep for ApplySourceBuffs {
    fn name(&self) -> &'static str {
        "apply_source_buffs"
    }

    fn execute(&self, ctx: &mut SkillContext<'_>) {
        if let Some(chain) = ctx.source_buffs {
            chain.apply_damage_modifiers(ctx);
        }
    }
}

/// Applies the target's buff chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyTargetBuffs;

impl SkillStep for ApplyTargetBuffs {
    fn name(&self) -> &'static str {
        "apply_target_buffs"
    }

    fn execute(&self, ctx: &mut SkillContext<'_>) {
        if let Some(chain) = ctx.target_buffs {
            chain.apply_damage_modifiers(ctx);
        }
    }
}

/// Commits `final_damage * multiplier` (never negative) to a live target.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyFinalDamage;

impl SkillStep for ApplyFinalDamage {
    fn name(&self) -> &'static str {
        "apply_final_damage"
    }

    fn execute(&self, ctx: &mut SkillContext<'_>) {
        if !ctx.target.is_alive() {
            tracing::trace!("Skill target already dead; nothing applied");
            return;
        }

        let scaled: i32 = Fixed::from_num(ctx.damage.final_damage)
            .saturating_mul(ctx.damage.multiplier)
            .to_num();
        let amount = u32::try_from(scaled).unwrap_or(0);
        let dealt = ctx.target.apply_damage(amount);
        ctx.damage.applied = Some(amount);

        tracing::debug!(
            base = ctx.damage.base_damage,
            value = ctx.damage.value,
            committed = amount,
            dealt,
            critical = ctx.damage.is_critical,
            "Skill damage applied"
        );
    }
}

/// Ordered list of steps run against one context.
pub struct SkillPipeline {
    steps: Vec<Box<dyn SkillStep>>,
}

impl SkillPipeline {
    /// Base damage, source buffs, target buffs, final damage.
    #[must_use]
    pub fn standard() -> Self {
        Self::with_steps(vec![
            Box::new(CalculateBaseDamage),
            Box::new(ApplySourceBuffs),
            Box::new(ApplyTargetBuffs),
            Box::new(ApplyFinalDamage),
        ])
    }

    /// Pipeline with a custom step list.
    #[must_use]
    pub fn with_steps(steps: Vec<Box<dyn SkillStep>>) -> Self {
        Self { steps }
    }

    /// Step names in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order; returns the committed damage, if any.
    pub fn execute(&self, ctx: &mut SkillContext<'_>) -> Option<u32> {
        for step in &self.steps {
            step.execute(ctx);
        }
        ctx.damage.applied
    }
}

impl Default for SkillPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for SkillPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillPipeline")
            .field("steps", &self.step_names())
            .finish()
    }
}
