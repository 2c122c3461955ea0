//! Scene subsystem: the caller-supplied scene description and the
//! validated, immutable [`SceneModel`] the engine works against.

use crate::config::PluginConfig;
use crate::error::{Result, SceneError};
use crate::ids;
use crate::types::{
    CameraPreset, LabelGroup, LabelOptions, LngLat, ModelOptions, PopupOptions, UserData,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ---------------------------------------------------------------------------
// Scene description (caller input)
// ---------------------------------------------------------------------------

/// One Building in a scene description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingOptions {
    /// Building id, also the id of the Building's own model.
    pub model_id: String,
    pub coordinates: LngLat,
    pub model_url: String,
    #[serde(default)]
    pub rotation: [f64; 3],
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub elevation: f64,
    #[serde(default)]
    pub interactive: Option<bool>,
    #[serde(default)]
    pub map_options: Option<CameraPreset>,
    #[serde(default)]
    pub popup_options: Option<PopupOptions>,
    #[serde(default)]
    pub user_data: UserData,
    /// Floors, lowest first.
    #[serde(default)]
    pub floors: Vec<BuildingFloorOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingFloorOptions {
    pub id: String,
    /// Caption on the floor control button.
    pub text: String,
    pub model_url: String,
    #[serde(default)]
    pub is_underground: bool,
    #[serde(default)]
    pub map_options: Option<CameraPreset>,
    #[serde(default)]
    pub label_groups: Vec<LabelGroupOptions>,
    #[serde(default)]
    pub user_data: UserData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelGroupOptions {
    pub id: String,
    pub labels: Vec<LabelOptions>,
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub font_color: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub min_zoom: Option<f64>,
    #[serde(default)]
    pub max_zoom: Option<f64>,
    #[serde(default)]
    pub elevation: Option<f64>,
}

/// Initial focus for a scene: a Building, or one of its Floors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneFocus {
    pub building_id: String,
    #[serde(default)]
    pub floor_id: Option<String>,
}

impl SceneFocus {
    pub fn building(building_id: impl Into<String>) -> Self {
        Self {
            building_id: building_id.into(),
            floor_id: None,
        }
    }

    pub fn floor(building_id: impl Into<String>, floor_id: impl Into<String>) -> Self {
        Self {
            building_id: building_id.into(),
            floor_id: Some(floor_id.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Validated scene
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Building {
    pub id: String,
    pub model: ModelOptions,
    pub map_options: Option<CameraPreset>,
    pub popup_options: Option<PopupOptions>,
    pub floors: Vec<Floor>,
}

impl Building {
    /// Last declared floor.
    pub fn highest_floor(&self) -> Option<&Floor> {
        self.floors.last()
    }
}

#[derive(Debug, Clone)]
pub struct Floor {
    pub id: String,
    pub building_id: String,
    pub model_id: String,
    pub text: String,
    pub is_underground: bool,
    pub model: ModelOptions,
    pub map_options: Option<CameraPreset>,
    pub label_groups: Vec<LabelGroup>,
}

/// A model in the scene, either a Building's own or one of its Floors.
#[derive(Debug, Clone, Copy)]
pub struct ModelRef<'a> {
    pub building: &'a Building,
    pub floor: Option<&'a Floor>,
}

impl<'a> ModelRef<'a> {
    pub fn model_id(&self) -> &'a str {
        match self.floor {
            Some(f) => &f.model_id,
            None => &self.building.id,
        }
    }

    pub fn options(&self) -> &'a ModelOptions {
        match self.floor {
            Some(f) => &f.model,
            None => &self.building.model,
        }
    }

    pub fn map_options(&self) -> Option<&'a CameraPreset> {
        match self.floor {
            Some(f) => f.map_options.as_ref(),
            None => self.building.map_options.as_ref(),
        }
    }

    pub fn is_underground(&self) -> bool {
        self.floor.is_some_and(|f| f.is_underground)
    }

    pub fn label_groups(&self) -> &'a [LabelGroup] {
        match self.floor {
            Some(f) => &f.label_groups,
            None => &[],
        }
    }
}

/// Where a model id points inside [`SceneModel::buildings`].
#[derive(Debug, Clone, Copy)]
struct ModelSlot {
    building: usize,
    floor: Option<usize>,
}

/// The immutable data layer of a realty scene.
#[derive(Debug, Clone)]
pub struct SceneModel {
    buildings: Vec<Building>,
    building_index: HashMap<String, usize>,
    models: HashMap<String, ModelSlot>,
}

impl SceneModel {
    /// Validate a scene description and resolve every model and label group.
    ///
    /// Fails on the first empty, reserved or duplicate id; nothing is kept
    /// from a rejected description.
    pub fn new(options: Vec<BuildingOptions>, config: &PluginConfig) -> Result<Self> {
        let mut buildings = Vec::with_capacity(options.len());
        let mut building_index = HashMap::new();
        let mut models = HashMap::new();

        for (bi, b) in options.into_iter().enumerate() {
            ids::validate_raw_id(&b.model_id)?;
            if building_index.contains_key(&b.model_id) {
                return Err(SceneError::DuplicateBuilding(b.model_id));
            }

            let scale = b.scale.unwrap_or(config.model_defaults.scale);
            let interactive = b.interactive.unwrap_or(config.model_defaults.interactive);

            let mut floors = Vec::with_capacity(b.floors.len());
            let mut floor_ids = HashSet::new();
            for (fi, f) in b.floors.into_iter().enumerate() {
                ids::validate_raw_id(&f.id)?;
                if !floor_ids.insert(f.id.clone()) {
                    return Err(SceneError::DuplicateFloor {
                        building_id: b.model_id.clone(),
                        floor_id: f.id,
                    });
                }

                let model_id = ids::model_id(&b.model_id, &f.id);
                let label_groups = resolve_label_groups(&b.model_id, &f.id, f.label_groups, config)?;

                models.insert(
                    model_id.clone(),
                    ModelSlot {
                        building: bi,
                        floor: Some(fi),
                    },
                );
                floors.push(Floor {
                    model: ModelOptions {
                        model_id: model_id.clone(),
                        model_url: f.model_url,
                        coordinates: b.coordinates,
                        rotation: b.rotation,
                        scale,
                        elevation: b.elevation,
                        interactive,
                        user_data: f.user_data,
                    },
                    id: f.id,
                    building_id: b.model_id.clone(),
                    model_id,
                    text: f.text,
                    is_underground: f.is_underground,
                    map_options: f.map_options,
                    label_groups,
                });
            }

            models.insert(
                b.model_id.clone(),
                ModelSlot {
                    building: bi,
                    floor: None,
                },
            );
            building_index.insert(b.model_id.clone(), bi);
            buildings.push(Building {
                model: ModelOptions {
                    model_id: b.model_id.clone(),
                    model_url: b.model_url,
                    coordinates: b.coordinates,
                    rotation: b.rotation,
                    scale,
                    elevation: b.elevation,
                    interactive,
                    user_data: b.user_data,
                },
                id: b.model_id,
                map_options: b.map_options,
                popup_options: b.popup_options,
                floors,
            });
        }

        Ok(Self {
            buildings,
            building_index,
            models,
        })
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn building(&self, id: &str) -> Option<&Building> {
        self.building_index.get(id).map(|&i| &self.buildings[i])
    }

    pub fn model(&self, model_id: &str) -> Option<ModelRef<'_>> {
        let slot = self.models.get(model_id)?;
        let building = &self.buildings[slot.building];
        Some(ModelRef {
            building,
            floor: slot.floor.map(|fi| &building.floors[fi]),
        })
    }

    pub fn contains_model(&self, model_id: &str) -> bool {
        self.models.contains_key(model_id)
    }

    pub fn owner_building_id(&self, model_id: &str) -> Option<&str> {
        self.model(model_id).map(|m| m.building.id.as_str())
    }

    pub fn is_underground_floor(&self, model_id: &str) -> bool {
        self.model(model_id).is_some_and(|m| m.is_underground())
    }

    /// Every model id in the scene, Buildings first in declaration order,
    /// each followed by its Floors.
    pub fn model_ids(&self) -> impl Iterator<Item = &str> {
        self.buildings.iter().flat_map(|b| {
            std::iter::once(b.id.as_str()).chain(b.floors.iter().map(|f| f.model_id.as_str()))
        })
    }

    pub fn floor_count(&self) -> usize {
        self.buildings.iter().map(|b| b.floors.len()).sum()
    }

    /// Map an initial focus onto a model id.
    pub fn resolve_focus(&self, focus: &SceneFocus) -> Result<String> {
        let building = self
            .building(&focus.building_id)
            .ok_or_else(|| SceneError::UnknownBuilding(focus.building_id.clone()))?;

        match &focus.floor_id {
            None => Ok(building.id.clone()),
            Some(floor_id) => building
                .floors
                .iter()
                .find(|f| &f.id == floor_id)
                .map(|f| f.model_id.clone())
                .ok_or_else(|| SceneError::UnknownFloor {
                    building_id: building.id.clone(),
                    floor_id: floor_id.clone(),
                }),
        }
    }
}

fn resolve_label_groups(
    building_id: &str,
    floor_id: &str,
    groups: Vec<LabelGroupOptions>,
    config: &PluginConfig,
) -> Result<Vec<LabelGroup>> {
    let defaults = &config.label_defaults;
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(groups.len());

    for g in groups {
        ids::validate_raw_id(&g.id)?;
        if !seen.insert(g.id.clone()) {
            return Err(SceneError::DuplicateLabelGroup {
                building_id: building_id.to_string(),
                floor_id: floor_id.to_string(),
                group_id: g.id,
            });
        }

        resolved.push(LabelGroup {
            id: ids::poi_group_id(building_id, floor_id, &g.id),
            group_id: g.id,
            labels: g.labels,
            font_size: g.font_size.unwrap_or(defaults.font_size),
            font_color: g.font_color.unwrap_or_else(|| defaults.font_color.clone()),
            image: g.image,
            min_zoom: g.min_zoom.unwrap_or(defaults.min_zoom),
            max_zoom: g.max_zoom.unwrap_or(defaults.max_zoom),
            elevation: g.elevation.unwrap_or(defaults.elevation),
        });
    }

    Ok(resolved)
}
