//! Collaborator seams.
//!
//! The plugin never talks to a map SDK, a 3D renderer or a DOM directly.
//! Whoever embeds it supplies these three traits; everything the engine
//! does to the outside world goes through them.

use crate::floor_control::FloorControlState;
use crate::types::{AnimationOptions, LabelGroup, LngLat, ModelOptions, PopupOptions};

// ---------------------------------------------------------------------------
// Map widget
// ---------------------------------------------------------------------------

/// A polygon overlay layer drawn by the map.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonLayer {
    pub id: String,
    /// Closed rings in lng/lat.
    pub rings: Vec<Vec<LngLat>>,
    /// Fill color; `None` renders nothing.
    pub color: Option<String>,
}

pub trait MapHost: Send {
    fn set_center(&mut self, center: LngLat, animation: &AnimationOptions);
    fn set_pitch(&mut self, pitch: f64, animation: &AnimationOptions);
    fn set_zoom(&mut self, zoom: f64, animation: &AnimationOptions);
    fn set_rotation(&mut self, rotation: f64, animation: &AnimationOptions);

    fn add_layer(&mut self, layer: &PolygonLayer);
    fn remove_layer(&mut self, layer_id: &str);
    /// Change the fill attribute of an existing layer.
    fn set_layer_color(&mut self, layer_id: &str, color: Option<&str>);

    fn show_popup(&mut self, popup: &PopupOptions);
    fn hide_popup(&mut self);

    fn open_url(&mut self, url: &str);
}

// ---------------------------------------------------------------------------
// 3D model renderer
// ---------------------------------------------------------------------------

/// Mesh loading and drawing. Loads are asynchronous: after `load_model` the
/// embedder reports the outcome through
/// [`crate::RealtyPlugin::handle_model_loaded`] or
/// [`crate::RealtyPlugin::handle_model_load_failed`]. A freshly loaded model
/// is hidden until `show_model` is called.
pub trait ModelRenderer: Send {
    fn load_model(&mut self, options: &ModelOptions);
    fn show_model(&mut self, model_id: &str);
    fn hide_model(&mut self, model_id: &str);
    fn destroy_model(&mut self, model_id: &str);

    fn add_label_group(&mut self, group: &LabelGroup);
    fn remove_label_group(&mut self, group_id: &str);
}

// ---------------------------------------------------------------------------
// Floor control widget
// ---------------------------------------------------------------------------

/// Button column for picking a Building's floors.
///
/// Stateless between calls: each `show` replaces whatever was displayed.
/// Clicks come back through [`crate::RealtyPlugin::handle_floor_selected`].
pub trait FloorControl: Send {
    fn show(&mut self, state: &FloorControlState);
    fn hide(&mut self);
    fn destroy(&mut self);
}
