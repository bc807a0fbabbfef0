//! Config records used at spawn time.
//!
//! Records are immutable once parsed and are only read when an entity is
//! spawned. This module parses RON text but performs no IO; loading files
//! is the caller's job.

mod character_data;
mod weapon_data;

pub use character_data::{CharacterData, ContactDamageData, GrowthData, MagnetData};
pub use weapon_data::WeaponData;

use serde::de::DeserializeOwned;

use crate::error::{GameError, Result};

/// Parse a RON record, tagging errors with `source_name`.
///
/// # Errors
///
/// Returns [`GameError::DataParseError`] if the text is not a valid record.
pub fn parse_ron<T: DeserializeOwned>(source_name: &str, text: &str) -> Result<T> {
    ron::from_str(text).map_err(|e| GameError::DataParseError {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })
}
