//! Realty Scene
//!
//! Overlays building models and their floor plans on a map widget, keeping
//! at most one model per Building visible while new models stream in.
//!
//! ## Architecture
//!
//! ```text
//! RealtyPlugin  (plugin.rs)          ← public surface, pointer/floor events
//!   ├── RealtySceneEngine (engine.rs) ← visibility state machine
//!   │     ├── SceneModel     (scene.rs)  ← immutable buildings/floors
//!   │     └── GroundCovering (ground.rs)
//!   ├── ModelStore  (registry.rs)     ← load status, show/hide, label groups
//!   └── MapHost / ModelRenderer / FloorControl  (host.rs) ← embedder seams
//! ```
//!
//! Every call runs to completion on the caller's thread. Asynchronous loads
//! come back through [`RealtyPlugin::handle_model_loaded`].

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod floor_control;
pub mod ground;
pub mod host;
pub mod ids;
pub mod plugin;
pub mod registry;
pub mod scene;
pub mod types;

// Simulated renderer for the interactive driver.
#[cfg(feature = "cli")]
pub mod sim;

pub use config::{PluginConfig, PluginOptions};
pub use engine::{BuildingVisibility, RealtySceneEngine, SceneState};
pub use error::{Result, SceneError};
pub use events::{EventKind, EventTarget, PluginEvent, PointerEvent, PointerTarget};
pub use floor_control::{FloorControlState, FloorLevel};
pub use host::{FloorControl, MapHost, ModelRenderer};
pub use plugin::RealtyPlugin;
pub use registry::{LoadTicket, ModelStore};
pub use scene::{BuildingFloorOptions, BuildingOptions, SceneFocus, SceneModel};
pub use types::{LngLat, ModelStatus, SceneStats, SceneStatus};
