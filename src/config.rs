//! Plugin configuration.
//!
//! [`PluginOptions`] mirrors what a caller may write (every field optional);
//! [`PluginConfig::resolve`] fills in defaults once and validates, so the
//! rest of the crate only ever sees fully-populated values.

use crate::error::{Result, SceneError};
use crate::types::{AnimationOptions, Easing};
use serde::{Deserialize, Serialize};

pub const DEFAULT_GROUND_COVERING_COLOR: &str = "#F8F8EBCC";

// ---------------------------------------------------------------------------
// Caller-facing options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginOptions {
    #[serde(default)]
    pub ground_covering_color: Option<String>,
    #[serde(default)]
    pub floor_control_position: Option<ControlPosition>,
    #[serde(default)]
    pub camera_animation: Option<AnimationOptionsPatch>,
    #[serde(default)]
    pub label_defaults: Option<LabelDefaultsPatch>,
    #[serde(default)]
    pub model_defaults: Option<ModelDefaultsPatch>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimationOptionsPatch {
    pub duration_ms: Option<u64>,
    pub easing: Option<Easing>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelDefaultsPatch {
    pub font_size: Option<f64>,
    pub font_color: Option<String>,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    pub elevation: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelDefaultsPatch {
    pub scale: Option<f64>,
    pub interactive: Option<bool>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ControlPosition {
    TopLeft,
    TopCenter,
    TopRight,
    #[default]
    CenterLeft,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelDefaults {
    pub font_size: f64,
    pub font_color: String,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub elevation: f64,
}

impl Default for LabelDefaults {
    fn default() -> Self {
        Self {
            font_size: 13.0,
            font_color: "#000000".into(),
            min_zoom: 0.0,
            max_zoom: 24.0,
            elevation: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelDefaults {
    pub scale: f64,
    pub interactive: bool,
}

impl Default for ModelDefaults {
    fn default() -> Self {
        Self {
            scale: 1.0,
            interactive: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginConfig {
    pub ground_covering_color: String,
    pub floor_control_position: ControlPosition,
    pub camera_animation: AnimationOptions,
    pub label_defaults: LabelDefaults,
    pub model_defaults: ModelDefaults,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            ground_covering_color: DEFAULT_GROUND_COVERING_COLOR.into(),
            floor_control_position: ControlPosition::default(),
            camera_animation: AnimationOptions::default(),
            label_defaults: LabelDefaults::default(),
            model_defaults: ModelDefaults::default(),
        }
    }
}

impl PluginConfig {
    pub fn resolve(options: PluginOptions) -> Result<Self> {
        let base = Self::default();

        let ground_covering_color = match options.ground_covering_color {
            Some(c) => validate_color(&c)?,
            None => base.ground_covering_color,
        };

        let camera_animation = match options.camera_animation {
            Some(p) => AnimationOptions {
                duration_ms: p.duration_ms.unwrap_or(base.camera_animation.duration_ms),
                easing: p.easing.unwrap_or(base.camera_animation.easing),
            },
            None => base.camera_animation,
        };

        let label_defaults = match options.label_defaults {
            Some(p) => {
                let d = base.label_defaults;
                LabelDefaults {
                    font_size: p.font_size.unwrap_or(d.font_size),
                    font_color: match p.font_color {
                        Some(c) => validate_color(&c)?,
                        None => d.font_color,
                    },
                    min_zoom: p.min_zoom.unwrap_or(d.min_zoom),
                    max_zoom: p.max_zoom.unwrap_or(d.max_zoom),
                    elevation: p.elevation.unwrap_or(d.elevation),
                }
            }
            None => base.label_defaults,
        };

        let model_defaults = match options.model_defaults {
            Some(p) => ModelDefaults {
                scale: p.scale.unwrap_or(base.model_defaults.scale),
                interactive: p.interactive.unwrap_or(base.model_defaults.interactive),
            },
            None => base.model_defaults,
        };

        Ok(Self {
            ground_covering_color,
            floor_control_position: options
                .floor_control_position
                .unwrap_or(base.floor_control_position),
            camera_animation,
            label_defaults,
            model_defaults,
        })
    }
}

/// Accepts `#RRGGBB` or `#RRGGBBAA`, returned unchanged.
pub fn validate_color(color: &str) -> Result<String> {
    let hex = color
        .strip_prefix('#')
        .ok_or_else(|| SceneError::InvalidColor(color.to_string()))?;
    if !matches!(hex.len(), 6 | 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SceneError::InvalidColor(color.to_string()));
    }
    Ok(color.to_string())
}
