//! Ground covering: a world-sized polygon that masks the map beneath an
//! underground floor plan.
//!
//! The layer is added once per scene and only its color attribute is
//! toggled afterwards.

use crate::host::{MapHost, PolygonLayer};
use crate::types::LngLat;

pub const GROUND_COVERING_LAYER_ID: &str = "realty-scene-ground-covering";

/// Web-mercator latitude limit.
const MAX_LAT: f64 = 85.051129;

#[derive(Debug)]
pub struct GroundCovering {
    color: String,
    enabled: bool,
    attached: bool,
}

impl GroundCovering {
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            enabled: false,
            attached: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    /// Add the (initially transparent) layer to the map.
    pub fn attach(&mut self, map: &mut dyn MapHost) {
        if self.attached {
            return;
        }
        map.add_layer(&PolygonLayer {
            id: GROUND_COVERING_LAYER_ID.to_string(),
            rings: vec![world_ring()],
            color: None,
        });
        self.attached = true;
    }

    pub fn set_enabled(&mut self, map: &mut dyn MapHost, enabled: bool) {
        if !self.attached || self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        let color = enabled.then_some(self.color.as_str());
        map.set_layer_color(GROUND_COVERING_LAYER_ID, color);
    }

    pub fn set_color(&mut self, map: &mut dyn MapHost, color: impl Into<String>) {
        self.color = color.into();
        if self.attached && self.enabled {
            map.set_layer_color(GROUND_COVERING_LAYER_ID, Some(&self.color));
        }
    }

    pub fn destroy(&mut self, map: &mut dyn MapHost) {
        if !self.attached {
            return;
        }
        map.remove_layer(GROUND_COVERING_LAYER_ID);
        self.attached = false;
        self.enabled = false;
    }
}

fn world_ring() -> Vec<LngLat> {
    vec![
        LngLat::new(-180.0, -MAX_LAT),
        LngLat::new(180.0, -MAX_LAT),
        LngLat::new(180.0, MAX_LAT),
        LngLat::new(-180.0, MAX_LAT),
        LngLat::new(-180.0, -MAX_LAT),
    ]
}
