//! RealtyPlugin – public entry point tying the collaborators, the model
//! registry and the scene engine together.
//!
//! The embedder forwards four kinds of input:
//!
//! | Input                        | Method                          |
//! |------------------------------|---------------------------------|
//! | renderer finished a load     | `handle_model_loaded`           |
//! | renderer failed a load       | `handle_model_load_failed`      |
//! | floor control button clicked | `handle_floor_selected`         |
//! | raycast hit under pointer    | `handle_pointer_event`          |

use crate::config::{validate_color, PluginConfig};
use crate::engine::{Host, RealtySceneEngine, SceneState};
use crate::error::{Result, SceneError};
use crate::events::{
    EventChannel, EventHandler, EventKind, EventTarget, PluginEvent, PointerEvent, PointerTarget,
    SubscriptionId,
};
use crate::host::{FloorControl, MapHost, ModelRenderer};
use crate::registry::{ModelStore, SettledLoad};
use crate::scene::{BuildingOptions, SceneFocus, SceneModel};
use crate::types::{SceneStats, SceneStatus};
use log::{debug, info, warn};

/// `user_data` key opened as a link when its POI is clicked.
pub const LINK_FIELD: &str = "url";

pub struct RealtyPlugin {
    config: PluginConfig,
    map: Box<dyn MapHost>,
    models: ModelStore,
    floor_control: Box<dyn FloorControl>,
    scene: Option<RealtySceneEngine>,
    events: EventChannel,
    /// Building whose popup is open.
    popup: Option<String>,
}

impl RealtyPlugin {
    pub fn new(
        config: PluginConfig,
        map: Box<dyn MapHost>,
        renderer: Box<dyn ModelRenderer>,
        floor_control: Box<dyn FloorControl>,
    ) -> Self {
        Self {
            config,
            map,
            models: ModelStore::new(renderer),
            floor_control,
            scene: None,
            events: EventChannel::new(),
            popup: None,
        }
    }

    // -----------------------------------------------------------------------
    // Scene lifecycle
    // -----------------------------------------------------------------------

    /// Validate `buildings`, build the scene and start loading it.
    ///
    /// Fails without side effects on invalid ids, an unknown focus, or when
    /// a live scene already exists.
    pub fn add_realty_scene(
        &mut self,
        buildings: Vec<BuildingOptions>,
        focus: Option<SceneFocus>,
    ) -> Result<()> {
        if self.scene.as_ref().is_some_and(|s| !s.is_destroyed()) {
            return Err(SceneError::SceneAlreadyAdded);
        }

        let model = SceneModel::new(buildings, &self.config)?;
        if let Some(f) = &focus {
            model.resolve_focus(f)?;
        }

        let Self {
            map,
            models,
            floor_control,
            config,
            ..
        } = self;
        let mut host = Host {
            map: map.as_mut(),
            models,
            floor_control: floor_control.as_mut(),
        };
        let engine = RealtySceneEngine::init(model, config.clone(), focus.as_ref(), &mut host)?;
        self.scene = Some(engine);
        Ok(())
    }

    /// Destroy the current scene, if any.
    pub fn remove_realty_scene(&mut self) {
        self.close_popup();
        self.with_scene(|engine, host| engine.destroy(host));
        if self.scene.take().is_some() {
            info!("Realty scene removed");
        }
    }

    pub fn show(&mut self) {
        self.with_scene(|engine, host| engine.show(host));
    }

    pub fn hide(&mut self) {
        self.close_popup();
        self.with_scene(|engine, host| engine.hide(host));
    }

    pub fn set_ground_covering_color(&mut self, color: &str) -> Result<()> {
        let color = validate_color(color)?;
        self.with_scene(|engine, host| engine.set_ground_covering_color(host, &color));
        self.config.ground_covering_color = color;
        Ok(())
    }

    /// Tear down the scene and the floor control widget.
    pub fn destroy(&mut self) {
        self.remove_realty_scene();
        self.events.clear();
        self.floor_control.destroy();
    }

    // -----------------------------------------------------------------------
    // Inbound notifications
    // -----------------------------------------------------------------------

    pub fn handle_model_loaded(&mut self, model_id: &str) {
        let settled = self.models.complete_load(model_id);
        self.deliver(settled);
    }

    pub fn handle_model_load_failed(&mut self, model_id: &str, reason: &str) {
        let settled = self.models.fail_load(model_id, reason);
        self.deliver(settled);
    }

    pub fn handle_floor_selected(&mut self, model_id: &str) {
        self.with_scene(|engine, host| engine.floor_control_event(host, model_id));
    }

    pub fn handle_pointer_event(&mut self, event: PointerEvent) {
        let Some(target) = self.resolve_target(&event.target) else {
            debug!("Pointer event on unknown target {:?}", event.target);
            return;
        };

        match (&event.kind, &target) {
            (EventKind::Click, EventTarget::Model { building_id, .. }) => {
                let building_id = building_id.clone();
                self.with_scene(|engine, host| engine.building_clicked(host, &building_id));
            }
            (EventKind::Click, EventTarget::Poi { user_data, .. }) => {
                if let Some(url) = user_data.get_str(LINK_FIELD) {
                    self.map.open_url(url);
                }
            }
            (
                EventKind::MouseOver,
                EventTarget::Model {
                    building_id,
                    floor_id: None,
                    ..
                },
            ) => self.open_popup(building_id),
            (EventKind::MouseOut, EventTarget::Model { .. }) => self.close_popup(),
            _ => {}
        }

        self.events.publish(&PluginEvent {
            kind: event.kind,
            target,
            lng_lat: event.lng_lat,
            point: event.point,
        });
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    pub fn on(&mut self, kind: EventKind, handler: EventHandler) -> SubscriptionId {
        self.events.subscribe(kind, handler)
    }

    pub fn off(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn models(&self) -> &ModelStore {
        &self.models
    }

    pub fn scene(&self) -> Option<&RealtySceneEngine> {
        self.scene.as_ref()
    }

    pub fn state(&self) -> Option<&SceneState> {
        self.scene.as_ref().map(|s| s.state())
    }

    pub fn stats(&self) -> Option<SceneStats> {
        self.scene.as_ref().map(|s| s.stats(&self.models))
    }

    pub fn popup_building(&self) -> Option<&str> {
        self.popup.as_deref()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn with_scene(&mut self, f: impl FnOnce(&mut RealtySceneEngine, &mut Host<'_>)) {
        let Self {
            map,
            models,
            floor_control,
            scene,
            ..
        } = self;
        let Some(engine) = scene.as_mut() else {
            debug!("No realty scene; call ignored");
            return;
        };
        let mut host = Host {
            map: map.as_mut(),
            models,
            floor_control: floor_control.as_mut(),
        };
        f(engine, &mut host);
    }

    fn deliver(&mut self, settled: Vec<SettledLoad>) {
        for s in settled {
            self.with_scene(|engine, host| engine.on_load_settled(host, s));
        }
    }

    fn resolve_target(&self, target: &PointerTarget) -> Option<EventTarget> {
        match target {
            PointerTarget::Model { model_id } => {
                let model = self.scene.as_ref()?.scene().model(model_id)?;
                Some(EventTarget::Model {
                    model_id: model_id.clone(),
                    building_id: model.building.id.clone(),
                    floor_id: model.floor.map(|f| f.id.clone()),
                    user_data: model.options().user_data.clone(),
                })
            }
            PointerTarget::Label {
                group_id,
                label_index,
            } => {
                let (group, owner) = self.models.label_group(group_id)?;
                let user_data = group
                    .labels
                    .get(*label_index)
                    .map(|l| l.user_data.clone())
                    .unwrap_or_default();
                Some(EventTarget::Poi {
                    group_id: group_id.clone(),
                    building_id: owner.building_id.clone(),
                    floor_id: owner.floor_id.clone(),
                    label_index: *label_index,
                    user_data,
                })
            }
        }
    }

    fn open_popup(&mut self, building_id: &str) {
        let Some(engine) = self.scene.as_ref() else {
            return;
        };
        if engine.status() != SceneStatus::Visible || self.popup.as_deref() == Some(building_id) {
            return;
        }
        let Some(popup) = engine
            .scene()
            .building(building_id)
            .and_then(|b| b.popup_options.as_ref())
        else {
            return;
        };
        if self.popup.is_some() {
            self.map.hide_popup();
        }
        self.map.show_popup(popup);
        self.popup = Some(building_id.to_string());
    }

    fn close_popup(&mut self) {
        if self.popup.take().is_some() {
            self.map.hide_popup();
        }
    }
}

impl Drop for RealtyPlugin {
    fn drop(&mut self) {
        if self.scene.as_ref().is_some_and(|s| !s.is_destroyed()) {
            warn!("RealtyPlugin dropped with a live scene; releasing it");
            self.remove_realty_scene();
        }
    }
}
