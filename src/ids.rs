//! Identifier scheme for floor models and POI label groups.
//!
//! A Building's own model is identified by its raw `building_id`. Floor
//! models and label groups get composite ids:
//!
//! ```text
//! floor model   {building_id}_{floor_id}
//! label group   {building_id}_{floor_id}_{group_id}
//! ```
//!
//! Raw ids may not contain [`SEPARATOR`]; [`validate_raw_id`] enforces this
//! when a scene is built, which keeps every derived id collision-free
//! (including against raw building ids). Callers never split composites.

use crate::error::{Result, SceneError};

/// Joins raw ids into composite ids.
pub const SEPARATOR: char = '_';

/// Reject ids that are empty or would make composite ids ambiguous.
pub fn validate_raw_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(SceneError::EmptyId);
    }
    if id.contains(SEPARATOR) {
        return Err(SceneError::ReservedSeparator {
            id: id.to_string(),
            separator: SEPARATOR,
        });
    }
    Ok(())
}

/// Model id of a Floor.
pub fn model_id(building_id: &str, floor_id: &str) -> String {
    format!("{building_id}{SEPARATOR}{floor_id}")
}

/// Id of a POI label group attached to a Floor.
pub fn poi_group_id(building_id: &str, floor_id: &str, group_id: &str) -> String {
    format!("{building_id}{SEPARATOR}{floor_id}{SEPARATOR}{group_id}")
}
