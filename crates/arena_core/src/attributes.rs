//! Derived attribute recomputation.
//!
//! [`Attributes`] are derived from [`BaseStats`], [`Level`] and
//! [`StatModifiers`]. Anything that changes one of the inputs marks the
//! entity with [`AttributeDirty`]; [`attribute_system`] recomputes and
//! clears the marker on its next run, so the marker never survives a full
//! scheduler pass.

use crate::components::{
    AttributeDirty, Attributes, BaseStats, Health, Level, StatKind, StatModifier, StatModifiers,
};
use crate::math::Fixed;
use crate::world::{EntityId, World};

/// Compute attributes for a stat block at a level with modifiers.
///
/// Maximum health never drops below 1.
#[must_use]
pub fn compute_attributes(base: &BaseStats, level: u32, modifiers: &StatModifiers) -> Attributes {
    let level = level.max(1);
    let growth = i32::try_from(level - 1).unwrap_or(i32::MAX);

    let attack = base
        .attack
        .saturating_add(base.attack_per_level.saturating_mul(growth))
        .saturating_add(modifiers.total(StatKind::Attack));
    let defense = base
        .defense
        .saturating_add(base.defense_per_level.saturating_mul(growth))
        .saturating_add(modifiers.total(StatKind::Defense));

    let grown_health = i64::from(base.max_health)
        + i64::from(base.health_per_level) * i64::from(level - 1)
        + i64::from(modifiers.total(StatKind::MaxHealth));
    let max_health = u32::try_from(grown_health.max(1)).unwrap_or(u32::MAX);

    Attributes {
        level,
        attack,
        defense,
        max_health,
    }
}

/// Recomputes attributes of every entity marked [`AttributeDirty`].
///
/// The marker is removed even when the entity has no [`BaseStats`].
pub fn attribute_system(world: &mut World, _dt: Fixed) {
    for entity in world.entities_with::<AttributeDirty>() {
        world.remove_component::<AttributeDirty>(entity);

        let Some(base) = world.try_get_component::<BaseStats>(entity) else {
            tracing::trace!(entity, "Dirty entity has no base stats");
            continue;
        };
        let level = world.try_get_component::<Level>(entity).unwrap_or_default();
        let modifiers = world
            .try_get_component::<StatModifiers>(entity)
            .unwrap_or_default();

        let attributes = compute_attributes(&base, level.value, &modifiers);
        if let Some(mut health) = world.try_get_component::<Health>(entity) {
            health.set_max(attributes.max_health);
            world.set_component(entity, health);
        }
        world.set_component(entity, attributes);

        tracing::debug!(
            entity,
            level = attributes.level,
            attack = attributes.attack,
            defense = attributes.defense,
            max_health = attributes.max_health,
            "Attributes recomputed"
        );
    }
}

/// Append a modifier to an entity and mark it dirty.
///
/// Returns `false` if the entity does not exist.
pub fn add_stat_modifier(world: &mut World, entity: EntityId, modifier: StatModifier) -> bool {
    if !world.is_alive(entity) {
        return false;
    }
    let mut modifiers = world
        .try_get_component::<StatModifiers>(entity)
        .unwrap_or_default();
    modifiers.modifiers.push(modifier);
    world.set_component(entity, modifiers);
    world.set_component(entity, AttributeDirty);
    true
}

/// Remove the earliest modifier on `stat` and mark the entity dirty.
pub fn remove_stat_modifier(
    world: &mut World,
    entity: EntityId,
    stat: StatKind,
) -> Option<StatModifier> {
    let mut modifiers = world.try_get_component::<StatModifiers>(entity)?;
    let index = modifiers.modifiers.iter().position(|m| m.stat == stat)?;
    let removed = modifiers.modifiers.remove(index);
    world.set_component(entity, modifiers);
    world.set_component(entity, AttributeDirty);
    Some(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn warrior() -> BaseStats {
        BaseStats {
            attack: 10,
            defense: 4,
            max_health: 100,
            attack_per_level: 2,
            defense_per_level: 1,
            health_per_level: 10,
        }
    }

    fn spawn(world: &mut World) -> EntityId {
        let entity = world.create_entity();
        world.add_component(entity, warrior());
        world.add_component(entity, Health::new(100));
        entity
    }

    #[test]
    fn test_compute_with_growth_and_modifiers() {
        let modifiers = StatModifiers {
            modifiers: vec![
                StatModifier {
                    stat: StatKind::Attack,
                    amount: 5,
                },
                StatModifier {
                    stat: StatKind::MaxHealth,
                    amount: -30,
                },
            ],
        };
        let attributes = compute_attributes(&warrior(), 3, &modifiers);
        assert_eq!(
            attributes,
            Attributes {
                level: 3,
                attack: 19,
                defense: 6,
                max_health: 90,
            }
        );
    }

    #[test]
    fn test_max_health_floor() {
        let modifiers = StatModifiers {
            modifiers: vec![StatModifier {
                stat: StatKind::MaxHealth,
                amount: -1000,
            }],
        };
        assert_eq!(compute_attributes(&warrior(), 1, &modifiers).max_health, 1);
    }

    #[test]
    fn test_dirty_entity_is_recomputed_and_cleared() {
        let mut world = World::new();
        let hero = spawn(&mut world);
        world.add_component(hero, Level { value: 2 });
        world.add_component(hero, AttributeDirty);

        attribute_system(&mut world, Fixed::ONE);

        assert!(!world.has_component::<AttributeDirty>(hero));
        let attributes = world.get_component::<Attributes>(hero).unwrap();
        assert_eq!(attributes.attack, 12);
        let health = world.get_component::<Health>(hero).unwrap();
        assert_eq!((health.current, health.max), (110, 110));
    }

    #[test]
    fn test_clean_entity_is_untouched() {
        let mut world = World::new();
        let hero = spawn(&mut world);

        attribute_system(&mut world, Fixed::ONE);

        assert!(!world.has_component::<Attributes>(hero));
    }

    #[test]
    fn test_marker_cleared_without_base_stats() {
        let mut world = World::new();
        let prop = world.create_entity();
        world.add_component(prop, AttributeDirty);

        attribute_system(&mut world, Fixed::ONE);

        assert!(!world.has_component::<AttributeDirty>(prop));
        assert!(!world.has_component::<Attributes>(prop));
    }

    #[test]
    fn test_add_and_remove_modifier() {
        let mut world = World::new();
        let hero = spawn(&mut world);
        let bonus = StatModifier {
            stat: StatKind::Defense,
            amount: 3,
        };

        assert!(add_stat_modifier(&mut world, hero, bonus));
        assert!(world.has_component::<AttributeDirty>(hero));
        attribute_system(&mut world, Fixed::ONE);
        assert_eq!(world.get_component::<Attributes>(hero).unwrap().defense, 7);

        assert_eq!(remove_stat_modifier(&mut world, hero, StatKind::Defense), Some(bonus));
        attribute_system(&mut world, Fixed::ONE);
        assert_eq!(world.get_component::<Attributes>(hero).unwrap().defense, 4);
        assert_eq!(remove_stat_modifier(&mut world, hero, StatKind::Defense), None);
    }

    #[test]
    fn test_add_modifier_to_missing_entity() {
        let mut world = World::new();
        let modifier = StatModifier {
            stat: StatKind::Attack,
            amount: 1,
        };
        assert!(!add_stat_modifier(&mut world, 77, modifier));
        assert!(!world.is_alive(77));
    }

    proptest! {
        #[test]
        fn prop_marker_never_survives_a_pass(
            marks in proptest::collection::vec(any::<bool>(), 1..20),
        ) {
            let mut world = World::new();
            let entities: Vec<EntityId> = marks.iter().map(|_| spawn(&mut world)).collect();
            for (&entity, &dirty) in entities.iter().zip(&marks) {
                if dirty {
                    world.add_component(entity, AttributeDirty);
                }
            }

            attribute_system(&mut world, Fixed::ONE);

            prop_assert_eq!(world.component_count::<AttributeDirty>(), 0);
            for (&entity, &dirty) in entities.iter().zip(&marks) {
                prop_assert_eq!(world.has_component::<Attributes>(entity), dirty);
            }
        }
    }
}
