//! Floor control state: what the floor picker displays for a Building.

use crate::config::ControlPosition;
use crate::scene::{Building, SceneModel};
use serde::{Deserialize, Serialize};

/// Icon of the synthetic entry that selects the Building's own model.
pub const BUILDING_ICON: &str = "building";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorLevel {
    /// Model selected when this button is clicked.
    pub model_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Full content of the control for one `show` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorControlState {
    pub building_id: String,
    pub active_model_id: String,
    pub floor_levels: Vec<FloorLevel>,
    pub position: ControlPosition,
}

impl FloorControlState {
    /// Build the control for the Building owning `active_model_id`.
    pub fn for_active(
        scene: &SceneModel,
        active_model_id: &str,
        position: ControlPosition,
    ) -> Option<Self> {
        let model = scene.model(active_model_id)?;
        Some(Self {
            building_id: model.building.id.clone(),
            active_model_id: active_model_id.to_string(),
            floor_levels: floor_levels(model.building),
            position,
        })
    }
}

/// The Building entry followed by each Floor in declaration order.
pub fn floor_levels(building: &Building) -> Vec<FloorLevel> {
    let mut levels = Vec::with_capacity(building.floors.len() + 1);
    levels.push(FloorLevel {
        model_id: building.id.clone(),
        text: None,
        icon: Some(BUILDING_ICON.to_string()),
    });
    levels.extend(building.floors.iter().map(|f| FloorLevel {
        model_id: f.model_id.clone(),
        text: Some(f.text.clone()),
        icon: None,
    }));
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PluginConfig;
    use crate::scene::{BuildingFloorOptions, BuildingOptions};
    use crate::types::{LngLat, UserData};

    fn building(id: &str, floors: &[&str]) -> BuildingOptions {
        BuildingOptions {
            model_id: id.into(),
            coordinates: LngLat::new(55.27, 25.2),
            model_url: format!("{id}.glb"),
            rotation: [0.0; 3],
            scale: None,
            elevation: 0.0,
            interactive: None,
            map_options: None,
            popup_options: None,
            user_data: UserData::default(),
            floors: floors
                .iter()
                .map(|f| BuildingFloorOptions {
                    id: (*f).into(),
                    text: f.to_uppercase(),
                    model_url: format!("{id}-{f}.glb"),
                    is_underground: false,
                    map_options: None,
                    label_groups: vec![],
                    user_data: UserData::default(),
                })
                .collect(),
        }
    }

    #[test]
    fn levels_start_with_building_entry() {
        let scene = SceneModel::new(vec![building("B2", &["f1", "f2"])], &PluginConfig::default())
            .unwrap();
        let levels = floor_levels(scene.building("B2").unwrap());

        let ids: Vec<_> = levels.iter().map(|l| l.model_id.as_str()).collect();
        assert_eq!(ids, ["B2", "B2_f1", "B2_f2"]);
        assert_eq!(levels[0].icon.as_deref(), Some(BUILDING_ICON));
        assert_eq!(levels[2].text.as_deref(), Some("F2"));
    }

    #[test]
    fn state_for_floor_points_at_owning_building() {
        let scene = SceneModel::new(
            vec![building("B1", &[]), building("B2", &["f1"])],
            &PluginConfig::default(),
        )
        .unwrap();

        let state = FloorControlState::for_active(&scene, "B2_f1", ControlPosition::TopLeft)
            .unwrap();
        assert_eq!(state.building_id, "B2");
        assert_eq!(state.active_model_id, "B2_f1");
        assert_eq!(state.floor_levels.len(), 2);

        assert!(FloorControlState::for_active(&scene, "nope", ControlPosition::TopLeft).is_none());
    }
}
