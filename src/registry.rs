//! Model registry: load status and visibility of every model handed to the
//! renderer, plus the POI label groups currently drawn.
//!
//! `ModelStore` is the only component that calls [`ModelRenderer`]
//! show/hide, so its view of what is visible is authoritative.

use crate::host::ModelRenderer;
use crate::types::{LabelGroup, LabelGroupOwner, ModelOptions, ModelStatus};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

/// Stamp attached to an asynchronous load request.
///
/// Handed back once the request settles; the engine compares `generation`
/// against its own to decide whether the result is still wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub generation: u64,
}

/// A ticket whose models have all finished loading (or failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettledLoad {
    pub ticket: LoadTicket,
    /// True if at least one model of the request failed.
    pub failed: bool,
}

#[derive(Debug)]
struct ModelRecord {
    options: ModelOptions,
    status: ModelStatus,
    visible: bool,
    show_on_load: bool,
}

#[derive(Debug)]
struct PendingLoad {
    ticket: LoadTicket,
    remaining: HashSet<String>,
    failed: bool,
}

pub struct ModelStore {
    renderer: Box<dyn ModelRenderer>,
    models: HashMap<String, ModelRecord>,
    pending: Vec<PendingLoad>,
    failed: HashSet<String>,
    label_groups: HashMap<String, (LabelGroup, LabelGroupOwner)>,
}

impl ModelStore {
    pub fn new(renderer: Box<dyn ModelRenderer>) -> Self {
        Self {
            renderer,
            models: HashMap::new(),
            pending: Vec::new(),
            failed: HashSet::new(),
            label_groups: HashMap::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Request a model, or join the load already in flight for it.
    ///
    /// `ticket` settles when the model finishes loading. Requesting a model
    /// that is already loaded is a no-op and its ticket never settles.
    pub fn add_model(&mut self, options: &ModelOptions, hide_on_load: bool, ticket: LoadTicket) {
        let id = &options.model_id;
        match self.model_status(id) {
            ModelStatus::Loaded => {
                debug!("Model {} already loaded", id);
                return;
            }
            ModelStatus::Loading => {
                if let Some(r) = self.models.get_mut(id) {
                    r.show_on_load |= !hide_on_load;
                }
            }
            ModelStatus::NoModel => {
                self.start_load(options, !hide_on_load);
            }
        }

        let already_waiting = self
            .pending
            .iter()
            .any(|p| p.ticket == ticket && p.remaining.len() == 1 && p.remaining.contains(id));
        if !already_waiting {
            self.pending.push(PendingLoad {
                ticket,
                remaining: HashSet::from([id.clone()]),
                failed: false,
            });
        }
    }

    /// Request a batch of models; the listed ids are shown as soon as each
    /// one is loaded.
    ///
    /// Returns the settled ticket right away if nothing needed loading.
    pub fn add_models(
        &mut self,
        models: &[ModelOptions],
        ids_to_show: &[String],
        ticket: LoadTicket,
    ) -> Option<SettledLoad> {
        let mut remaining = HashSet::new();

        for options in models {
            let id = &options.model_id;
            let show = ids_to_show.contains(id);
            match self.model_status(id) {
                ModelStatus::Loaded => {
                    if show {
                        self.show_model(id);
                    }
                }
                ModelStatus::Loading => {
                    if let Some(r) = self.models.get_mut(id) {
                        r.show_on_load |= show;
                    }
                    remaining.insert(id.clone());
                }
                ModelStatus::NoModel => {
                    self.start_load(options, show);
                    remaining.insert(id.clone());
                }
            }
        }

        if remaining.is_empty() {
            return Some(SettledLoad {
                ticket,
                failed: false,
            });
        }
        self.pending.push(PendingLoad {
            ticket,
            remaining,
            failed: false,
        });
        None
    }

    fn start_load(&mut self, options: &ModelOptions, show_on_load: bool) {
        debug!("Loading model {} from {}", options.model_id, options.model_url);
        self.failed.remove(&options.model_id);
        self.models.insert(
            options.model_id.clone(),
            ModelRecord {
                options: options.clone(),
                status: ModelStatus::Loading,
                visible: false,
                show_on_load,
            },
        );
        self.renderer.load_model(options);
    }

    /// Record a finished load. Returns every ticket that settled with it.
    pub fn complete_load(&mut self, model_id: &str) -> Vec<SettledLoad> {
        let Some(record) = self.models.get_mut(model_id) else {
            debug!("Ignoring load of unknown or removed model {}", model_id);
            return Vec::new();
        };
        if record.status != ModelStatus::Loading {
            debug!("Ignoring duplicate load completion for {}", model_id);
            return Vec::new();
        }

        record.status = ModelStatus::Loaded;
        if record.show_on_load {
            record.show_on_load = false;
            record.visible = true;
            self.renderer.show_model(model_id);
        }

        self.settle(model_id, false)
    }

    /// Record a failed load. The model reverts to [`ModelStatus::NoModel`].
    pub fn fail_load(&mut self, model_id: &str, reason: &str) -> Vec<SettledLoad> {
        match self.models.get(model_id) {
            Some(r) if r.status == ModelStatus::Loading => {}
            _ => {
                debug!("Ignoring load failure for {} (not loading)", model_id);
                return Vec::new();
            }
        }

        warn!("Model {} failed to load: {}", model_id, reason);
        self.models.remove(model_id);
        self.failed.insert(model_id.to_string());
        self.settle(model_id, true)
    }

    fn settle(&mut self, model_id: &str, failed: bool) -> Vec<SettledLoad> {
        let mut settled = Vec::new();
        self.pending.retain_mut(|p| {
            if p.remaining.remove(model_id) {
                p.failed |= failed;
                if p.remaining.is_empty() {
                    settled.push(SettledLoad {
                        ticket: p.ticket,
                        failed: p.failed,
                    });
                    return false;
                }
            }
            true
        });
        settled
    }

    // -----------------------------------------------------------------------
    // Visibility
    // -----------------------------------------------------------------------

    /// Show a loaded model, or mark a loading one to be shown on arrival.
    pub fn show_model(&mut self, model_id: &str) {
        let Some(record) = self.models.get_mut(model_id) else {
            warn!("show_model: unknown model {}", model_id);
            return;
        };
        match record.status {
            ModelStatus::Loaded if !record.visible => {
                record.visible = true;
                self.renderer.show_model(model_id);
            }
            ModelStatus::Loading => record.show_on_load = true,
            _ => {}
        }
    }

    /// Hide a model and cancel any pending show-on-load.
    pub fn hide_model(&mut self, model_id: &str) {
        let Some(record) = self.models.get_mut(model_id) else {
            return;
        };
        record.show_on_load = false;
        if record.visible {
            record.visible = false;
            self.renderer.hide_model(model_id);
        }
    }

    pub fn remove_model(&mut self, model_id: &str) {
        let Some(record) = self.models.remove(model_id) else {
            return;
        };
        if record.status != ModelStatus::NoModel {
            self.renderer.destroy_model(model_id);
        }
        // Tickets waiting on a removed model are dropped, not settled.
        self.pending.retain(|p| !p.remaining.contains(model_id));
    }

    pub fn remove_models<S: AsRef<str>>(&mut self, model_ids: &[S]) {
        for id in model_ids {
            self.remove_model(id.as_ref());
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn model_status(&self, model_id: &str) -> ModelStatus {
        self.models
            .get(model_id)
            .map(|r| r.status)
            .unwrap_or(ModelStatus::NoModel)
    }

    pub fn is_loaded(&self, model_id: &str) -> bool {
        self.model_status(model_id) == ModelStatus::Loaded
    }

    pub fn is_visible(&self, model_id: &str) -> bool {
        self.models.get(model_id).is_some_and(|r| r.visible)
    }

    /// Visible now, or will be as soon as its load finishes.
    pub fn wants_visible(&self, model_id: &str) -> bool {
        self.models
            .get(model_id)
            .is_some_and(|r| r.visible || r.show_on_load)
    }

    pub fn model_options(&self, model_id: &str) -> Option<&ModelOptions> {
        self.models.get(model_id).map(|r| &r.options)
    }

    pub fn visible_models(&self) -> impl Iterator<Item = &str> {
        self.models
            .iter()
            .filter(|(_, r)| r.visible)
            .map(|(id, _)| id.as_str())
    }

    pub fn loaded_count(&self) -> usize {
        self.models
            .values()
            .filter(|r| r.status == ModelStatus::Loaded)
            .count()
    }

    /// Models whose most recent load failed.
    pub fn failed_models(&self) -> impl Iterator<Item = &str> {
        self.failed.iter().map(String::as_str)
    }

    pub fn has_failed(&self, model_id: &str) -> bool {
        self.failed.contains(model_id)
    }

    // -----------------------------------------------------------------------
    // Label groups
    // -----------------------------------------------------------------------

    pub fn add_label_group(&mut self, group: &LabelGroup, owner: LabelGroupOwner) {
        if self.label_groups.contains_key(&group.id) {
            return;
        }
        self.renderer.add_label_group(group);
        self.label_groups
            .insert(group.id.clone(), (group.clone(), owner));
    }

    pub fn remove_label_group(&mut self, group_id: &str) {
        if self.label_groups.remove(group_id).is_some() {
            self.renderer.remove_label_group(group_id);
        }
    }

    pub fn label_group(&self, group_id: &str) -> Option<(&LabelGroup, &LabelGroupOwner)> {
        self.label_groups.get(group_id).map(|(g, o)| (g, o))
    }

    pub fn label_group_ids(&self) -> impl Iterator<Item = &str> {
        self.label_groups.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LngLat, UserData};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Calls(Arc<Mutex<Vec<String>>>);

    impl Calls {
        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.lock())
        }
    }

    impl ModelRenderer for Calls {
        fn load_model(&mut self, options: &ModelOptions) {
            self.0.lock().push(format!("load {}", options.model_id));
        }
        fn show_model(&mut self, id: &str) {
            self.0.lock().push(format!("show {id}"));
        }
        fn hide_model(&mut self, id: &str) {
            self.0.lock().push(format!("hide {id}"));
        }
        fn destroy_model(&mut self, id: &str) {
            self.0.lock().push(format!("destroy {id}"));
        }
        fn add_label_group(&mut self, group: &LabelGroup) {
            self.0.lock().push(format!("labels+ {}", group.id));
        }
        fn remove_label_group(&mut self, id: &str) {
            self.0.lock().push(format!("labels- {id}"));
        }
    }

    fn options(id: &str) -> ModelOptions {
        ModelOptions {
            model_id: id.into(),
            model_url: format!("{id}.glb"),
            coordinates: LngLat::new(0.0, 0.0),
            rotation: [0.0; 3],
            scale: 1.0,
            elevation: 0.0,
            interactive: true,
            user_data: UserData::default(),
        }
    }

    const T1: LoadTicket = LoadTicket { generation: 1 };
    const T2: LoadTicket = LoadTicket { generation: 2 };

    #[test]
    fn hidden_load_stays_hidden() {
        let calls = Calls::default();
        let mut store = ModelStore::new(Box::new(calls.clone()));

        store.add_model(&options("a"), true, T1);
        assert_eq!(store.model_status("a"), ModelStatus::Loading);

        let settled = store.complete_load("a");
        assert_eq!(settled, [SettledLoad { ticket: T1, failed: false }]);
        assert!(store.is_loaded("a"));
        assert!(!store.is_visible("a"));
        assert_eq!(calls.take(), ["load a"]);
    }

    #[test]
    fn joining_an_inflight_load_settles_both_tickets() {
        let calls = Calls::default();
        let mut store = ModelStore::new(Box::new(calls.clone()));

        store.add_model(&options("a"), true, T1);
        store.add_model(&options("a"), true, T2);
        store.add_model(&options("a"), true, T2);

        let settled = store.complete_load("a");
        assert_eq!(settled.len(), 2);
        assert_eq!(calls.take(), ["load a"]);
    }

    #[test]
    fn batch_settles_after_last_member() {
        let calls = Calls::default();
        let mut store = ModelStore::new(Box::new(calls.clone()));

        let batch = [options("a"), options("b")];
        let settled = store.add_models(&batch, &["a".to_string()], T1);
        assert!(settled.is_none());

        assert!(store.complete_load("a").is_empty());
        assert!(store.is_visible("a"));
        assert_eq!(store.complete_load("b").len(), 1);
        assert!(!store.is_visible("b"));
    }

    #[test]
    fn batch_of_loaded_models_settles_immediately() {
        let mut store = ModelStore::new(Box::new(Calls::default()));
        store.add_model(&options("a"), true, T1);
        store.complete_load("a");

        let settled = store.add_models(&[options("a")], &["a".to_string()], T2);
        assert_eq!(settled, Some(SettledLoad { ticket: T2, failed: false }));
        assert!(store.is_visible("a"));
    }

    #[test]
    fn hide_cancels_show_on_load() {
        let calls = Calls::default();
        let mut store = ModelStore::new(Box::new(calls.clone()));

        store.add_models(&[options("a")], &["a".to_string()], T1);
        assert!(store.wants_visible("a"));
        store.hide_model("a");
        assert!(!store.wants_visible("a"));

        store.complete_load("a");
        assert!(!store.is_visible("a"));
        assert_eq!(calls.take(), ["load a"]);
    }

    #[test]
    fn failed_load_reverts_to_no_model() {
        let mut store = ModelStore::new(Box::new(Calls::default()));
        store.add_model(&options("a"), true, T1);

        let settled = store.fail_load("a", "404");
        assert_eq!(settled, [SettledLoad { ticket: T1, failed: true }]);
        assert_eq!(store.model_status("a"), ModelStatus::NoModel);
        assert_eq!(store.failed_models().collect::<Vec<_>>(), ["a"]);
        assert!(store.has_failed("a"));

        store.add_model(&options("a"), true, T2);
        assert_eq!(store.failed_models().count(), 0);
        assert!(!store.has_failed("a"));
    }

    #[test]
    fn removing_a_loading_model_drops_its_tickets() {
        let calls = Calls::default();
        let mut store = ModelStore::new(Box::new(calls.clone()));
        store.add_model(&options("a"), true, T1);
        store.remove_model("a");

        assert!(store.complete_load("a").is_empty());
        assert_eq!(calls.take(), ["load a", "destroy a"]);
    }

    #[test]
    fn label_groups_are_added_once() {
        let calls = Calls::default();
        let mut store = ModelStore::new(Box::new(calls.clone()));
        let group = LabelGroup {
            id: "b_f_g".into(),
            group_id: "g".into(),
            labels: vec![],
            font_size: 13.0,
            font_color: "#000000".into(),
            image: None,
            min_zoom: 0.0,
            max_zoom: 24.0,
            elevation: 0.0,
        };
        let owner = LabelGroupOwner {
            building_id: "b".into(),
            floor_id: "f".into(),
        };

        store.add_label_group(&group, owner.clone());
        store.add_label_group(&group, owner.clone());
        assert_eq!(store.label_group("b_f_g").map(|(_, o)| o), Some(&owner));

        store.remove_label_group("b_f_g");
        store.remove_label_group("b_f_g");
        assert_eq!(calls.take(), ["labels+ b_f_g", "labels- b_f_g"]);
    }
}
