//! Core types shared across all modules.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Geographic coordinates in degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl std::fmt::Display for LngLat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lng, self.lat)
    }
}

/// Screen-space position in pixels.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

/// Camera preset applied when a model becomes the focused one.
///
/// Absent fields leave the corresponding camera parameter untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CameraPreset {
    #[serde(default)]
    pub center: Option<LngLat>,
    #[serde(default)]
    pub pitch: Option<f64>,
    #[serde(default)]
    pub zoom: Option<f64>,
    #[serde(default)]
    pub rotation: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnimationOptions {
    pub duration_ms: u64,
    pub easing: Easing,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            duration_ms: 500,
            easing: Easing::EaseInOut,
        }
    }
}

// ---------------------------------------------------------------------------
// Caller payloads
// ---------------------------------------------------------------------------

/// Opaque caller-defined payload attached to models and labels.
///
/// The plugin passes it through untouched; the only field it reads is
/// `url` on POI labels. Lookups of absent or mistyped fields return `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct UserData(pub serde_json::Map<String, serde_json::Value>);

impl UserData {
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// Fully resolved description of one loadable model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelOptions {
    pub model_id: String,
    pub model_url: String,
    pub coordinates: LngLat,
    /// Euler rotation in degrees (x, y, z).
    pub rotation: [f64; 3],
    pub scale: f64,
    /// Altitude offset in metres.
    pub elevation: f64,
    pub interactive: bool,
    pub user_data: UserData,
}

/// Load state of a model as tracked by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    /// Never requested, removed, or its last load failed.
    NoModel,
    Loading,
    Loaded,
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelOptions {
    pub coordinates: LngLat,
    pub text: String,
    #[serde(default)]
    pub user_data: UserData,
}

/// A resolved POI label group, ready to hand to the renderer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelGroup {
    /// Composite id, see [`crate::ids::poi_group_id`].
    pub id: String,
    pub group_id: String,
    pub labels: Vec<LabelOptions>,
    pub font_size: f64,
    pub font_color: String,
    pub image: Option<String>,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub elevation: f64,
}

/// Building/floor a label group belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelGroupOwner {
    pub building_id: String,
    pub floor_id: String,
}

// ---------------------------------------------------------------------------
// Popups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopupOptions {
    pub coordinates: LngLat,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Scene status & stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneStatus {
    #[default]
    Visible,
    Hidden,
    /// Terminal.
    Destroyed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneStats {
    pub buildings: usize,
    pub floors: usize,
    pub loaded_models: usize,
    pub visible_models: usize,
    pub active_model_id: Option<String>,
    pub status: SceneStatus,
}
