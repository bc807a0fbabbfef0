//! Skill capabilities backed by world entities.
//!
//! The pipeline only sees [`SkillSource`] and [`SkillTarget`]. Here the
//! caster is copied out of the world into a [`CombatantSnapshot`], and the
//! target is a [`WorldTarget`] view that writes damage back through
//! [`World::set_component`].
//!
//! Stats are read from [`Attributes`] when present and fall back to
//! [`BaseStats`], so a freshly spawned entity can fight before the
//! attribute pass has run once.

use crate::buffs::{BuffController, BuffKind};
use crate::components::{Attributes, BaseStats, Health, Level, Tags};
use crate::skill::{DamageContext, SkillContext, SkillPipeline, SkillSource, SkillTarget};
use crate::world::{EntityId, World};

/// Caster state captured at cast time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatantSnapshot {
    /// Entity the snapshot was taken from.
    pub entity: EntityId,
    /// Level at cast time.
    pub level: u32,
    /// Attack at cast time.
    pub attack: i32,
    /// Tags at cast time.
    pub tags: Tags,
}

impl CombatantSnapshot {
    /// Copy the caster's stats out of the world.
    ///
    /// Returns `None` for an entity without any components.
    #[must_use]
    pub fn capture(world: &World, entity: EntityId) -> Option<Self> {
        if !world.is_alive(entity) {
            return None;
        }

        let attributes = world.try_get_component::<Attributes>(entity);
        let base = world.try_get_component::<BaseStats>(entity);

        let level = attributes
            .map(|a| a.level)
            .or_else(|| world.try_get_component::<Level>(entity).map(|l| l.value))
            .unwrap_or(1);
        let attack = attributes
            .map(|a| a.attack)
            .or_else(|| base.map(|b| b.attack))
            .unwrap_or(0);

        Some(Self {
            entity,
            level,
            attack,
            tags: world.try_get_component::<Tags>(entity).unwrap_or_default(),
        })
    }

    /// Replace the attack value, e.g. with a weapon's damage.
    #[must_use]
    pub fn with_attack(mut self, attack: i32) -> Self {
        self.attack = attack;
        self
    }
}

impl SkillSource for CombatantSnapshot {
    fn level(&self) -> u32 {
        self.level
    }

    fn attack(&self) -> i32 {
        self.attack
    }

    fn has_tag(&self, tag: &str) -> bool {
        self.tags.has(tag)
    }
}

/// Target capability over a world entity.
pub struct WorldTarget<'w> {
    world: &'w mut World,
    entity: EntityId,
}

impl<'w> WorldTarget<'w> {
    /// View `entity` as a skill target.
    pub fn new(world: &'w mut World, entity: EntityId) -> Self {
        Self { world, entity }
    }

    /// The viewed entity.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }
}

impl SkillTarget for WorldTarget<'_> {
    fn defense(&self) -> i32 {
        self.world
            .try_get_component::<Attributes>(self.entity)
            .map(|a| a.defense)
            .or_else(|| {
                self.world
                    .try_get_component::<BaseStats>(self.entity)
                    .map(|b| b.defense)
            })
            .unwrap_or(0)
    }

    fn is_alive(&self) -> bool {
        self.world
            .try_get_component::<Health>(self.entity)
            .is_some_and(|h| !h.is_dead())
    }

    fn apply_damage(&mut self, amount: u32) -> u32 {
        let Some(mut health) = self.world.try_get_component::<Health>(self.entity) else {
            return 0;
        };
        let dealt = health.apply_damage(amount);
        self.world.set_component(self.entity, health);
        dealt
    }

    fn has_buff(&self, kind: BuffKind) -> bool {
        self.world
            .try_get_component::<BuffController>(self.entity)
            .is_some_and(|chain| chain.has_buff(kind))
    }
}

/// Resolve one skill from `caster` against `target` through `pipeline`.
///
/// Buff chains are read from the [`BuffController`] components of `buffs_from`
/// (usually the caster itself) and `target`. Returns the final damage
/// context.
pub fn cast_skill_with(
    world: &mut World,
    pipeline: &SkillPipeline,
    source: &CombatantSnapshot,
    buffs_from: EntityId,
    target: EntityId,
) -> DamageContext {
    let source_buffs = world.try_get_component::<BuffController>(buffs_from);
    let target_buffs = world.try_get_component::<BuffController>(target);

    let mut view = WorldTarget::new(world, target);
    let mut ctx = SkillContext::new(source, &mut view)
        .with_source_buffs(source_buffs.as_ref())
        .with_target_buffs(target_buffs.as_ref());
    pipeline.execute(&mut ctx);
    ctx.damage
}

/// Resolve one skill cast by `caster` on `target`.
///
/// `attack_override` replaces the caster's attack for this cast only.
/// Returns `None` if the caster does not exist.
pub fn cast_skill(
    world: &mut World,
    pipeline: &SkillPipeline,
    caster: EntityId,
    target: EntityId,
    attack_override: Option<i32>,
) -> Option<DamageContext> {
    let mut source = CombatantSnapshot::capture(world, caster)?;
    if let Some(attack) = attack_override {
        source = source.with_attack(attack);
    }
    Some(cast_skill_with(world, pipeline, &source, caster, target))
}
