//! Simulated collaborators for the interactive driver.
//!
//! `SimRenderer` turns load requests into messages on a Tokio channel;
//! [`spawn_loader`] answers each one after a delay, the way a real mesh
//! loader resolves asynchronously. Map and floor control just log.
//!
//! ```text
//! ModelStore ──load_model──► SimRenderer ──LoadRequest──► loader task
//!                                                            │ sleep(delay)
//! RealtyPlugin ◄──handle_model_loaded/failed── LoadOutcome ◄─┘
//! ```

use crate::floor_control::FloorControlState;
use crate::host::{FloorControl, MapHost, ModelRenderer, PolygonLayer};
use crate::types::{AnimationOptions, LabelGroup, LngLat, ModelOptions, PopupOptions};
use log::info;
use std::time::Duration;
use tokio::sync::mpsc;

/// URLs containing this marker fail to load.
pub const FAILING_URL_MARKER: &str = "missing";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub model_id: String,
    pub model_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub model_id: String,
    pub result: Result<(), String>,
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

pub struct SimRenderer {
    requests: mpsc::UnboundedSender<LoadRequest>,
}

impl SimRenderer {
    pub fn new(requests: mpsc::UnboundedSender<LoadRequest>) -> Self {
        Self { requests }
    }
}

impl ModelRenderer for SimRenderer {
    fn load_model(&mut self, options: &ModelOptions) {
        let request = LoadRequest {
            model_id: options.model_id.clone(),
            model_url: options.model_url.clone(),
        };
        if self.requests.send(request).is_err() {
            log::warn!("Loader stopped; dropping load of {}", options.model_id);
        }
    }

    fn show_model(&mut self, model_id: &str) {
        info!("[renderer] show {}", model_id);
    }

    fn hide_model(&mut self, model_id: &str) {
        info!("[renderer] hide {}", model_id);
    }

    fn destroy_model(&mut self, model_id: &str) {
        info!("[renderer] destroy {}", model_id);
    }

    fn add_label_group(&mut self, group: &LabelGroup) {
        info!("[renderer] labels + {} ({} labels)", group.id, group.labels.len());
    }

    fn remove_label_group(&mut self, group_id: &str) {
        info!("[renderer] labels - {}", group_id);
    }
}

/// Answer every request after `delay`. Requests are served concurrently.
pub fn spawn_loader(
    mut requests: mpsc::UnboundedReceiver<LoadRequest>,
    delay: Duration,
) -> mpsc::UnboundedReceiver<LoadOutcome> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(req) = requests.recv().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let result = if req.model_url.contains(FAILING_URL_MARKER) {
                    Err(format!("cannot fetch {}", req.model_url))
                } else {
                    Ok(())
                };
                let _ = tx.send(LoadOutcome {
                    model_id: req.model_id,
                    result,
                });
            });
        }
    });
    rx
}

// ---------------------------------------------------------------------------
// Map & floor control
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct LogMap;

impl MapHost for LogMap {
    fn set_center(&mut self, center: LngLat, animation: &AnimationOptions) {
        info!("[map] center {} over {}ms", center, animation.duration_ms);
    }

    fn set_pitch(&mut self, pitch: f64, _animation: &AnimationOptions) {
        info!("[map] pitch {:.1}", pitch);
    }

    fn set_zoom(&mut self, zoom: f64, _animation: &AnimationOptions) {
        info!("[map] zoom {:.2}", zoom);
    }

    fn set_rotation(&mut self, rotation: f64, _animation: &AnimationOptions) {
        info!("[map] rotation {:.1}", rotation);
    }

    fn add_layer(&mut self, layer: &PolygonLayer) {
        info!("[map] add layer {}", layer.id);
    }

    fn remove_layer(&mut self, layer_id: &str) {
        info!("[map] remove layer {}", layer_id);
    }

    fn set_layer_color(&mut self, layer_id: &str, color: Option<&str>) {
        info!("[map] layer {} color {}", layer_id, color.unwrap_or("<none>"));
    }

    fn show_popup(&mut self, popup: &PopupOptions) {
        info!("[map] popup '{}' at {}", popup.title, popup.coordinates);
    }

    fn hide_popup(&mut self) {
        info!("[map] popup closed");
    }

    fn open_url(&mut self, url: &str) {
        info!("[map] open {}", url);
    }
}

#[derive(Debug, Default)]
pub struct LogFloorControl;

impl FloorControl for LogFloorControl {
    fn show(&mut self, state: &FloorControlState) {
        let levels: Vec<_> = state
            .floor_levels
            .iter()
            .map(|l| {
                let label = l.text.as_deref().or(l.icon.as_deref()).unwrap_or("?");
                if l.model_id == state.active_model_id {
                    format!("[{label}]")
                } else {
                    label.to_string()
                }
            })
            .collect();
        info!("[floors] {}: {}", state.building_id, levels.join(" "));
    }

    fn hide(&mut self) {
        info!("[floors] hidden");
    }

    fn destroy(&mut self) {
        info!("[floors] destroyed");
    }
}
