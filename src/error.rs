//! Error taxonomy for scene construction and plugin configuration.
//!
//! Only configuration problems are errors. Stale load completions and calls
//! made after a scene was destroyed are silently ignored by the engine.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("identifier must not be empty")]
    EmptyId,

    #[error("identifier '{id}' contains the reserved separator '{separator}'")]
    ReservedSeparator { id: String, separator: char },

    #[error("duplicate building id '{0}'")]
    DuplicateBuilding(String),

    #[error("duplicate floor id '{floor_id}' in building '{building_id}'")]
    DuplicateFloor {
        building_id: String,
        floor_id: String,
    },

    #[error("duplicate label group id '{group_id}' on floor '{floor_id}' of building '{building_id}'")]
    DuplicateLabelGroup {
        building_id: String,
        floor_id: String,
        group_id: String,
    },

    #[error("unknown building '{0}'")]
    UnknownBuilding(String),

    #[error("unknown floor '{floor_id}' in building '{building_id}'")]
    UnknownFloor {
        building_id: String,
        floor_id: String,
    },

    #[error("a realty scene is already added; remove it first")]
    SceneAlreadyAdded,

    #[error("invalid color '{0}', expected #RRGGBB or #RRGGBBAA")]
    InvalidColor(String),
}

pub type Result<T> = std::result::Result<T, SceneError>;
