//! RealtySceneEngine – decides which model each Building shows.
//!
//! Every trigger (initial load, floor selection, building click, show/hide,
//! destroy, load completion) builds a *requested* [`SceneState`] and runs it
//! through [`RealtySceneEngine::set_state`]:
//!
//! ```text
//! requested ──► per-building diff against committed state
//!                 ├── new model loaded     → switch now
//!                 ├── new model not loaded → request load, keep old model
//!                 └── entry cleared        → hide, unless an unloaded
//!                                            underground floor is active
//!           ──► sync renderer visibility (hides before shows)
//!           ──► ground covering, label groups, camera, floor control
//! ```
//!
//! Loads carry a [`LoadTicket`] stamped with the engine generation, which
//! advances whenever the active model changes. A settled ticket re-runs the
//! latest requested state only while its generation is current.

use crate::config::PluginConfig;
use crate::error::Result;
use crate::floor_control::FloorControlState;
use crate::ground::GroundCovering;
use crate::host::{FloorControl, MapHost};
use crate::registry::{LoadTicket, ModelStore, SettledLoad};
use crate::scene::{SceneFocus, SceneModel};
use crate::types::{LabelGroupOwner, ModelStatus, SceneStats, SceneStatus};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

/// Building id → model currently shown for it (`None` = nothing).
pub type BuildingVisibility = HashMap<String, Option<String>>;

#[derive(Debug, Clone, PartialEq)]
pub struct SceneState {
    pub active_model_id: Option<String>,
    pub building_visibility: BuildingVisibility,
    pub status: SceneStatus,
}

impl SceneState {
    fn destroyed() -> Self {
        Self {
            active_model_id: None,
            building_visibility: HashMap::new(),
            status: SceneStatus::Destroyed,
        }
    }

    /// Model committed for `building_id`, if any.
    pub fn visible_model(&self, building_id: &str) -> Option<&str> {
        self.building_visibility
            .get(building_id)
            .and_then(|m| m.as_deref())
    }
}

/// Mutable borrows of the collaborators for the duration of one call.
pub struct Host<'a> {
    pub map: &'a mut dyn MapHost,
    pub models: &'a mut ModelStore,
    pub floor_control: &'a mut dyn FloorControl,
}

pub struct RealtySceneEngine {
    scene: SceneModel,
    config: PluginConfig,
    /// What is actually committed (deferred entries keep their old model).
    state: SceneState,
    /// The latest requested state; load completions re-run this.
    target: SceneState,
    generation: u64,
    ground: GroundCovering,
    active_labels: Vec<String>,
    /// Model whose label groups are in `active_labels`.
    labelled_floor: Option<String>,
    camera_applied: Option<String>,
    control: Option<FloorControlState>,
}

impl RealtySceneEngine {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Build the initial state and start loading every initially visible
    /// model in one batch.
    ///
    /// Every Building shows its own model unless `focus` names a Floor, which
    /// then replaces its Building's model; an underground focus clears all
    /// other Buildings.
    pub fn init(
        scene: SceneModel,
        config: PluginConfig,
        focus: Option<&SceneFocus>,
        host: &mut Host<'_>,
    ) -> Result<Self> {
        let active_model_id = focus.map(|f| scene.resolve_focus(f)).transpose()?;

        let mut building_visibility = BuildingVisibility::new();
        for b in scene.buildings() {
            building_visibility.insert(b.id.clone(), Some(b.id.clone()));
        }
        if let Some(active) = active_model_id.as_deref() {
            if let Some(owner) = scene.owner_building_id(active) {
                building_visibility.insert(owner.to_string(), Some(active.to_string()));
                if scene.is_underground_floor(active) {
                    for (building_id, entry) in building_visibility.iter_mut() {
                        if building_id != owner {
                            *entry = None;
                        }
                    }
                }
            }
        }

        let state = SceneState {
            active_model_id,
            building_visibility,
            status: SceneStatus::Visible,
        };

        let mut engine = Self {
            ground: GroundCovering::new(config.ground_covering_color.clone()),
            scene,
            config,
            target: state.clone(),
            state,
            generation: 1,
            active_labels: Vec::new(),
            labelled_floor: None,
            camera_applied: None,
            control: None,
        };
        engine.ground.attach(host.map);

        let to_show: Vec<String> = engine
            .scene
            .buildings()
            .iter()
            .filter_map(|b| engine.state.visible_model(&b.id).map(str::to_string))
            .collect();
        let to_load: Vec<_> = to_show
            .iter()
            .filter_map(|id| engine.scene.model(id).map(|m| m.options().clone()))
            .collect();

        info!(
            "Realty scene initialised: {} buildings, {} floors, focus {:?}",
            engine.scene.buildings().len(),
            engine.scene.floor_count(),
            engine.state.active_model_id
        );

        let ticket = engine.ticket();
        let settled = host.models.add_models(&to_load, &to_show, ticket);
        engine.sync_effects(host);
        if let Some(settled) = settled {
            engine.on_load_settled(host, settled);
        }

        Ok(engine)
    }

    // -----------------------------------------------------------------------
    // Triggers
    // -----------------------------------------------------------------------

    /// The floor control picked a Building (its own model id) or a Floor.
    pub fn floor_control_event(&mut self, host: &mut Host<'_>, model_id: &str) {
        if self.is_destroyed() {
            return;
        }
        if !self.scene.contains_model(model_id) {
            warn!("Floor control selected unknown model {}", model_id);
            return;
        }
        let requested = self.request_focus(model_id);
        self.set_state(host, requested, Cause::Trigger);
    }

    /// A Building's 3D model was clicked: focus its highest Floor, or the
    /// Building itself when it has none.
    pub fn building_clicked(&mut self, host: &mut Host<'_>, building_id: &str) {
        if self.is_destroyed() {
            return;
        }
        let Some(building) = self.scene.building(building_id) else {
            warn!("Click on unknown building {}", building_id);
            return;
        };

        let model_id = building
            .highest_floor()
            .map(|f| f.model_id.clone())
            .unwrap_or_else(|| building.id.clone());
        if self.target.active_model_id.as_deref() == Some(model_id.as_str()) {
            debug!("Building {} already focused on {}", building_id, model_id);
            return;
        }
        let requested = self.request_focus(&model_id);
        self.set_state(host, requested, Cause::Trigger);
    }

    pub fn show(&mut self, host: &mut Host<'_>) {
        self.request_status(host, SceneStatus::Visible);
    }

    pub fn hide(&mut self, host: &mut Host<'_>) {
        self.request_status(host, SceneStatus::Hidden);
    }

    /// Release every model, label group and overlay. Idempotent.
    pub fn destroy(&mut self, host: &mut Host<'_>) {
        self.request_status(host, SceneStatus::Destroyed);
    }

    /// A load requested by this engine settled.
    pub fn on_load_settled(&mut self, host: &mut Host<'_>, settled: SettledLoad) {
        if self.is_destroyed() {
            debug!("Dropping load completion: scene destroyed");
            return;
        }
        if settled.ticket.generation != self.generation {
            debug!(
                "Dropping stale load completion (generation {} != {})",
                settled.ticket.generation, self.generation
            );
            return;
        }
        if settled.failed {
            // No re-run: the deferred Buildings keep their last good model
            // until the next trigger asks again.
            warn!(
                "Load failed for focus {:?}; keeping current models",
                self.target.active_model_id
            );
            self.sync_effects(host);
            return;
        }

        let target = self.target.clone();
        self.set_state(host, target, Cause::LoadSettled);
    }

    pub fn set_ground_covering_color(&mut self, host: &mut Host<'_>, color: &str) {
        if self.is_destroyed() {
            return;
        }
        self.config.ground_covering_color = color.to_string();
        self.ground.set_color(host.map, color);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    /// The latest requested state, which [`Self::state`] converges to once
    /// pending loads finish.
    pub fn target(&self) -> &SceneState {
        &self.target
    }

    pub fn scene(&self) -> &SceneModel {
        &self.scene
    }

    pub fn status(&self) -> SceneStatus {
        self.state.status
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.status == SceneStatus::Destroyed
    }

    pub fn active_model_id(&self) -> Option<&str> {
        self.state.active_model_id.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn ground_covering_enabled(&self) -> bool {
        self.ground.is_enabled()
    }

    /// Buildings still showing an older model than requested.
    pub fn deferred_buildings(&self) -> Vec<&str> {
        self.scene
            .buildings()
            .iter()
            .filter(|b| self.state.visible_model(&b.id) != self.target.visible_model(&b.id))
            .map(|b| b.id.as_str())
            .collect()
    }

    pub fn stats(&self, models: &ModelStore) -> SceneStats {
        SceneStats {
            buildings: self.scene.buildings().len(),
            floors: self.scene.floor_count(),
            loaded_models: self
                .scene
                .model_ids()
                .filter(|id| models.is_loaded(id))
                .count(),
            visible_models: self
                .scene
                .model_ids()
                .filter(|id| models.is_visible(id))
                .count(),
            active_model_id: self.state.active_model_id.clone(),
            status: self.state.status,
        }
    }

    // -----------------------------------------------------------------------
    // Requested states
    // -----------------------------------------------------------------------

    fn ticket(&self) -> LoadTicket {
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Target state focusing `model_id`: its Building shows it, every other
    /// Building shows its own model, or nothing if the focus is underground.
    fn request_focus(&self, model_id: &str) -> SceneState {
        let owner = self.scene.owner_building_id(model_id);
        let underground = self.scene.is_underground_floor(model_id);

        let building_visibility = self
            .scene
            .buildings()
            .iter()
            .map(|b| {
                let entry = if Some(b.id.as_str()) == owner {
                    Some(model_id.to_string())
                } else if underground {
                    None
                } else {
                    Some(b.id.clone())
                };
                (b.id.clone(), entry)
            })
            .collect();

        SceneState {
            active_model_id: Some(model_id.to_string()),
            building_visibility,
            status: self.target.status,
        }
    }

    fn request_status(&mut self, host: &mut Host<'_>, status: SceneStatus) {
        let requested = SceneState {
            status,
            ..self.target.clone()
        };
        self.set_state(host, requested, Cause::Trigger);
    }

    // -----------------------------------------------------------------------
    // Transition
    // -----------------------------------------------------------------------

    fn set_state(&mut self, host: &mut Host<'_>, requested: SceneState, cause: Cause) {
        if self.is_destroyed() {
            debug!("Ignoring transition on destroyed scene");
            return;
        }

        if requested.status == SceneStatus::Destroyed {
            self.teardown(host);
            self.generation += 1;
            self.state = SceneState::destroyed();
            self.target = SceneState::destroyed();
            info!("Realty scene destroyed");
            return;
        }

        if requested.active_model_id != self.target.active_model_id {
            self.generation += 1;
        }
        let transition = Transition {
            scene: &self.scene,
            ticket: self.ticket(),
            prev_active: self.state.active_model_id.as_deref(),
            next_active: requested.active_model_id.as_deref(),
            retry_failed: cause == Cause::Trigger,
        };

        let mut committed = BuildingVisibility::with_capacity(requested.building_visibility.len());
        for building in self.scene.buildings() {
            let prev = self.state.visible_model(&building.id);
            let next = requested.visible_model(&building.id);
            let entry = transition.resolve(host.models, prev, next);
            if entry.as_deref() != next {
                debug!(
                    "Building {} keeps {:?} while {:?} is pending",
                    building.id, entry, next
                );
            }
            committed.insert(building.id.clone(), entry);
        }

        self.state = SceneState {
            active_model_id: requested.active_model_id.clone(),
            building_visibility: committed,
            status: requested.status,
        };
        self.target = requested;

        self.sync_visibility(host);
        self.sync_effects(host);
    }

    /// Make the renderer show exactly the committed models (none when
    /// hidden). Hides run first so two models of one Building never overlap.
    fn sync_visibility(&self, host: &mut Host<'_>) {
        let desired: HashSet<&str> = if self.state.status == SceneStatus::Visible {
            self.state
                .building_visibility
                .values()
                .filter_map(|m| m.as_deref())
                .collect()
        } else {
            HashSet::new()
        };

        for id in self.scene.model_ids() {
            if host.models.wants_visible(id) && !desired.contains(id) {
                host.models.hide_model(id);
            }
        }
        for id in self.scene.model_ids() {
            if desired.contains(id) && !host.models.wants_visible(id) {
                host.models.show_model(id);
            }
        }
    }

    /// Derive ground covering, label groups, camera and floor control from
    /// the committed state.
    fn sync_effects(&mut self, host: &mut Host<'_>) {
        let visible = self.state.status == SceneStatus::Visible;
        let active = self
            .state
            .active_model_id
            .as_deref()
            .and_then(|id| self.scene.model(id));

        // The active model is on screen.
        let active_shown = visible
            && active.is_some_and(|m| {
                self.state.visible_model(&m.building.id) == Some(m.model_id())
                    && host.models.is_loaded(m.model_id())
            });

        // Ground covering stays on while any displayed model is a loaded
        // underground floor, whichever Building owns it.
        let ground_on = visible
            && self
                .state
                .building_visibility
                .values()
                .flatten()
                .any(|shown| self.scene.is_underground_floor(shown) && host.models.is_loaded(shown));
        self.ground.set_enabled(host.map, ground_on);

        // Label groups belong to the active Floor once it is shown. Until
        // then the labelled Floor keeps them while it is still displayed.
        let label_floor = if active_shown {
            active.map(|m| m.model_id().to_string())
        } else if visible {
            self.labelled_floor.clone().filter(|id| {
                self.scene
                    .owner_building_id(id)
                    .is_some_and(|b| self.state.visible_model(b) == Some(id.as_str()))
            })
        } else {
            None
        };
        if label_floor != self.labelled_floor {
            for id in self.active_labels.drain(..) {
                host.models.remove_label_group(&id);
            }
            if let Some(m) = label_floor.as_deref().and_then(|id| self.scene.model(id)) {
                if let Some(floor) = m.floor {
                    for group in m.label_groups() {
                        host.models.add_label_group(
                            group,
                            LabelGroupOwner {
                                building_id: floor.building_id.clone(),
                                floor_id: floor.id.clone(),
                            },
                        );
                        self.active_labels.push(group.id.clone());
                    }
                }
            }
            self.labelled_floor = label_floor;
        }

        // Camera preset, once per newly shown focus.
        if let Some(m) = active.filter(|_| active_shown) {
            if self.camera_applied.as_deref() != Some(m.model_id()) {
                if let Some(preset) = m.map_options() {
                    let anim = &self.config.camera_animation;
                    if let Some(center) = preset.center {
                        host.map.set_center(center, anim);
                    }
                    if let Some(pitch) = preset.pitch {
                        host.map.set_pitch(pitch, anim);
                    }
                    if let Some(zoom) = preset.zoom {
                        host.map.set_zoom(zoom, anim);
                    }
                    if let Some(rotation) = preset.rotation {
                        host.map.set_rotation(rotation, anim);
                    }
                }
                self.camera_applied = Some(m.model_id().to_string());
            }
        }

        // Floor control tracks the focus regardless of load progress.
        let control = match active {
            Some(m) if visible => FloorControlState::for_active(
                &self.scene,
                m.model_id(),
                self.config.floor_control_position,
            ),
            _ => None,
        };
        if control != self.control {
            match &control {
                Some(c) => host.floor_control.show(c),
                None => host.floor_control.hide(),
            }
            self.control = control;
        }
    }

    fn teardown(&mut self, host: &mut Host<'_>) {
        for id in self.active_labels.drain(..) {
            host.models.remove_label_group(&id);
        }
        self.labelled_floor = None;
        let ids: Vec<&str> = self.scene.model_ids().collect();
        host.models.remove_models(&ids);
        self.ground.destroy(host.map);
        if self.control.take().is_some() {
            host.floor_control.hide();
        }
        self.camera_applied = None;
    }
}

/// What started a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cause {
    /// Floor control, a click, show or hide.
    Trigger,
    /// Re-run of the target after a load of the current generation settled.
    LoadSettled,
}

/// One pass of the per-Building diff.
struct Transition<'a> {
    scene: &'a SceneModel,
    ticket: LoadTicket,
    prev_active: Option<&'a str>,
    next_active: Option<&'a str>,
    /// Failed models are only requested again by a fresh trigger.
    retry_failed: bool,
}

impl Transition<'_> {
    /// Decide what one Building commits to, given what it showed before and
    /// what is requested now. Issues load requests for models not yet loaded.
    fn resolve(
        &self,
        models: &mut ModelStore,
        prev: Option<&str>,
        next: Option<&str>,
    ) -> Option<String> {
        if prev == next {
            // Committed but still streaming: wait on it under this ticket.
            if let Some(next) = next {
                self.request_load(models, next);
            }
            return next.map(str::to_string);
        }

        let Some(next) = next else {
            // Keep the surroundings until the underground floor can replace them.
            if let Some(active) = self.next_active.filter(|a| self.scene.is_underground_floor(a)) {
                if !models.is_loaded(active) {
                    return prev.map(str::to_string);
                }
            }
            return None;
        };

        if models.model_status(next) == ModelStatus::Loaded {
            return Some(next.to_string());
        }

        if self
            .prev_active
            .is_some_and(|a| self.scene.is_underground_floor(a))
        {
            debug!("Leaving underground floor; holding it until {} loads", next);
        }
        self.request_load(models, next);
        prev.map(str::to_string)
    }

    fn request_load(&self, models: &mut ModelStore, model_id: &str) {
        if models.is_loaded(model_id) {
            return;
        }
        if !self.retry_failed && models.has_failed(model_id) {
            debug!("Not retrying failed model {} until the next trigger", model_id);
            return;
        }
        if let Some(model) = self.scene.model(model_id) {
            models.add_model(model.options(), true, self.ticket);
        }
    }
}
