//! Error types for the arena simulation.
//!
//! Most recoverable conditions (missing service, dangling relation, a system
//! whose preconditions are not met this tick) are absorbed by the systems
//! themselves and never surface as a [`GameError`].

use thiserror::Error;

use crate::world::EntityId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all arena simulation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    /// Strict component access on an entity that does not hold the type.
    #[error("Component {component} not found on entity {entity}")]
    ComponentNotFound {
        /// Entity that was queried.
        entity: EntityId,
        /// Type name of the missing component.
        component: &'static str,
    },

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Config record parsing error.
    #[error("Failed to parse data record '{source_name}': {message}")]
    DataParseError {
        /// Name of the record source (file name or record id).
        source_name: String,
        /// Error message.
        message: String,
    },

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_not_found_message() {
        let err = GameError::ComponentNotFound {
            entity: 7,
            component: "Health",
        };
        assert_eq!(err.to_string(), "Component Health not found on entity 7");
    }

    #[test]
    fn test_data_parse_error_message() {
        let err = GameError::DataParseError {
            source_name: "knight.ron".to_string(),
            message: "unexpected token".to_string(),
        };
        assert!(err.to_string().contains("knight.ron"));
    }
}
