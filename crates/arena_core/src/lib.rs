//! # Arena Core
//!
//! Deterministic simulation core for an orbit-arena action game.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO (config records are parsed from text handed in by the caller)
//! - No randomness
//! - No floating-point math (uses fixed-point)
//!
//! ## Crate Structure
//!
//! - [`world`] - Entity/component store and the service registry
//! - [`components`] - Component definitions
//! - [`scheduler`] - Ordered per-tick system execution
//! - [`systems`], [`progression`], [`attributes`] - Gameplay systems
//! - [`skill`], [`buffs`], [`damage`], [`combatant`] - Skill resolution
//! - [`data`] - Config records used at spawn time
//! - [`simulation`] - The assembled simulation
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod attributes;
pub mod buffs;
pub mod combatant;
pub mod components;
pub mod damage;
pub mod data;
pub mod error;
pub mod math;
pub mod progression;
pub mod scheduler;
pub mod simulation;
pub mod skill;
pub mod systems;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::buffs::{create_buff, Buff, BuffController, BuffKind};
    pub use crate::combatant::cast_skill;
    pub use crate::components::*;
    pub use crate::data::{CharacterData, WeaponData};
    pub use crate::error::{GameError, Result};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::progression::ExperienceSystem;
    pub use crate::scheduler::{Scheduler, System};
    pub use crate::simulation::Simulation;
    pub use crate::skill::{SkillContext, SkillPipeline, SkillSource, SkillTarget};
    pub use crate::world::{Component, EntityId, World};
}
