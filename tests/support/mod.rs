//! Recording collaborators and a reference scene shared by the
//! integration tests.

#![allow(dead_code)]

use parking_lot::Mutex;
use realty_scene::{
    config::PluginConfig,
    floor_control::FloorControlState,
    host::{FloorControl, MapHost, ModelRenderer, PolygonLayer},
    scene::{BuildingFloorOptions, BuildingOptions, LabelGroupOptions},
    types::{
        AnimationOptions, CameraPreset, LabelGroup, LabelOptions, LngLat, ModelOptions,
        PopupOptions, UserData,
    },
    EventKind, PointerEvent, PointerTarget, RealtyPlugin,
};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Call log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load(String),
    Show(String),
    Hide(String),
    Destroy(String),
    LabelsAdd(String),
    LabelsRemove(String),
    Center(LngLat),
    Pitch(f64),
    Zoom(f64),
    Rotation(f64),
    AddLayer(String),
    RemoveLayer(String),
    LayerColor(Option<String>),
    Popup(String),
    PopupClosed,
    OpenUrl(String),
    ControlShow {
        building_id: String,
        active_model_id: String,
        levels: Vec<String>,
    },
    ControlHide,
    ControlDestroy,
}

impl Call {
    pub fn is_visibility(&self) -> bool {
        matches!(self, Call::Show(_) | Call::Hide(_))
    }
}

/// One shared log behind every collaborator, so tests see the global order.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Call>>>);

impl Recorder {
    pub fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.0.lock())
    }

    fn push(&self, call: Call) {
        self.0.lock().push(call);
    }
}

impl MapHost for Recorder {
    fn set_center(&mut self, center: LngLat, _: &AnimationOptions) {
        self.push(Call::Center(center));
    }
    fn set_pitch(&mut self, pitch: f64, _: &AnimationOptions) {
        self.push(Call::Pitch(pitch));
    }
    fn set_zoom(&mut self, zoom: f64, _: &AnimationOptions) {
        self.push(Call::Zoom(zoom));
    }
    fn set_rotation(&mut self, rotation: f64, _: &AnimationOptions) {
        self.push(Call::Rotation(rotation));
    }
    fn add_layer(&mut self, layer: &PolygonLayer) {
        self.push(Call::AddLayer(layer.id.clone()));
    }
    fn remove_layer(&mut self, layer_id: &str) {
        self.push(Call::RemoveLayer(layer_id.into()));
    }
    fn set_layer_color(&mut self, _: &str, color: Option<&str>) {
        self.push(Call::LayerColor(color.map(str::to_string)));
    }
    fn show_popup(&mut self, popup: &PopupOptions) {
        self.push(Call::Popup(popup.title.clone()));
    }
    fn hide_popup(&mut self) {
        self.push(Call::PopupClosed);
    }
    fn open_url(&mut self, url: &str) {
        self.push(Call::OpenUrl(url.into()));
    }
}

impl ModelRenderer for Recorder {
    fn load_model(&mut self, options: &ModelOptions) {
        self.push(Call::Load(options.model_id.clone()));
    }
    fn show_model(&mut self, model_id: &str) {
        self.push(Call::Show(model_id.into()));
    }
    fn hide_model(&mut self, model_id: &str) {
        self.push(Call::Hide(model_id.into()));
    }
    fn destroy_model(&mut self, model_id: &str) {
        self.push(Call::Destroy(model_id.into()));
    }
    fn add_label_group(&mut self, group: &LabelGroup) {
        self.push(Call::LabelsAdd(group.id.clone()));
    }
    fn remove_label_group(&mut self, group_id: &str) {
        self.push(Call::LabelsRemove(group_id.into()));
    }
}

impl FloorControl for Recorder {
    fn show(&mut self, state: &FloorControlState) {
        self.push(Call::ControlShow {
            building_id: state.building_id.clone(),
            active_model_id: state.active_model_id.clone(),
            levels: state
                .floor_levels
                .iter()
                .map(|l| l.model_id.clone())
                .collect(),
        });
    }
    fn hide(&mut self) {
        self.push(Call::ControlHide);
    }
    fn destroy(&mut self) {
        self.push(Call::ControlDestroy);
    }
}

pub fn control_show(building_id: &str, active: &str, levels: &[&str]) -> Call {
    Call::ControlShow {
        building_id: building_id.into(),
        active_model_id: active.into(),
        levels: levels.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn plugin(rec: &Recorder) -> RealtyPlugin {
    RealtyPlugin::new(
        PluginConfig::default(),
        Box::new(rec.clone()),
        Box::new(rec.clone()),
        Box::new(rec.clone()),
    )
}

// ---------------------------------------------------------------------------
// Reference scene
// ---------------------------------------------------------------------------
//
// B1: no floors, has a popup
// B2: F1 (above ground), F2 (underground, label group "shops", camera preset)
// B3: U (underground), only in `scene_with_second_basement`

pub const COVER_COLOR: &str = "#F8F8EBCC";
pub const SHOPS: &str = "B2_F2_shops";
pub const SHOP_URL: &str = "https://example.com/shop/1";

pub fn building(id: &str, floors: Vec<BuildingFloorOptions>) -> BuildingOptions {
    BuildingOptions {
        model_id: id.into(),
        coordinates: LngLat::new(55.27, 25.19),
        model_url: format!("https://cdn.test/{id}.glb"),
        rotation: [0.0; 3],
        scale: None,
        elevation: 0.0,
        interactive: None,
        map_options: None,
        popup_options: None,
        user_data: UserData::default(),
        floors,
    }
}

pub fn floor(id: &str, underground: bool) -> BuildingFloorOptions {
    BuildingFloorOptions {
        id: id.into(),
        text: id.into(),
        model_url: format!("https://cdn.test/{id}.glb"),
        is_underground: underground,
        map_options: None,
        label_groups: vec![],
        user_data: UserData::default(),
    }
}

pub fn demo_scene() -> Vec<BuildingOptions> {
    let mut b1 = building("B1", vec![]);
    b1.popup_options = Some(PopupOptions {
        coordinates: LngLat::new(55.27, 25.19),
        title: "Tower B1".into(),
        description: None,
    });

    let mut f2 = floor("F2", true);
    f2.map_options = Some(CameraPreset {
        center: None,
        pitch: Some(45.0),
        zoom: Some(19.0),
        rotation: None,
    });
    let link: UserData = serde_json::from_value(serde_json::json!({ "url": SHOP_URL })).unwrap();
    let not_a_link: UserData = serde_json::from_value(serde_json::json!({ "url": 42 })).unwrap();
    f2.label_groups = vec![LabelGroupOptions {
        id: "shops".into(),
        labels: vec![
            LabelOptions {
                coordinates: LngLat::new(55.2701, 25.1901),
                text: "Shop 1".into(),
                user_data: link,
            },
            LabelOptions {
                coordinates: LngLat::new(55.2702, 25.1902),
                text: "Shop 2".into(),
                user_data: not_a_link,
            },
        ],
        font_size: None,
        font_color: None,
        image: Some("shop-icon".into()),
        min_zoom: Some(17.0),
        max_zoom: None,
        elevation: None,
    }];

    vec![b1, building("B2", vec![floor("F1", false), f2])]
}

/// Reference scene plus B3, whose only floor U is underground.
pub fn scene_with_second_basement() -> Vec<BuildingOptions> {
    let mut scene = demo_scene();
    scene.push(building("B3", vec![floor("U", true)]));
    scene
}

/// Plugin with the reference scene fully loaded and the log cleared.
pub fn loaded_plugin(rec: &Recorder) -> RealtyPlugin {
    let mut p = plugin(rec);
    p.add_realty_scene(demo_scene(), None).unwrap();
    p.handle_model_loaded("B1");
    p.handle_model_loaded("B2");
    rec.take();
    p
}

pub fn pointer(p: &mut RealtyPlugin, kind: EventKind, model_id: &str) {
    p.handle_pointer_event(PointerEvent {
        kind,
        target: PointerTarget::Model {
            model_id: model_id.into(),
        },
        lng_lat: LngLat::new(55.27, 25.19),
        point: Default::default(),
    });
}

pub fn click(p: &mut RealtyPlugin, model_id: &str) {
    pointer(p, EventKind::Click, model_id);
}

/// At most one model visible per Building.
pub fn assert_mutual_exclusion(p: &RealtyPlugin) {
    let Some(engine) = p.scene() else { return };
    for b in engine.scene().buildings() {
        let visible = std::iter::once(b.id.as_str())
            .chain(b.floors.iter().map(|f| f.model_id.as_str()))
            .filter(|id| p.models().is_visible(id))
            .count();
        assert!(visible <= 1, "building {} shows {} models", b.id, visible);
    }
}
