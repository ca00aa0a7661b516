//! # Application State Management
//!
//! `AppState` owns the loaded scene, the overlay renderer and all viewer
//! state, and implements `eframe::App`. Panels never mutate the registry or
//! endpoint store directly: they return `PanelAction`s which `apply` turns
//! into registry operations and their membership cascade, so both halves
//! always complete before the next frame resolves link colours.

use eframe::egui;
use egui::Color32;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use constellation_overlay::common::{LoadedScene, OverlaySettings, load_scene};
use constellation_overlay::constellation::{
    CascadeReport, EndpointId, EndpointSort, EndpointStore, Frequency, MembershipCascade, RefreshNotice, frequency_label,
};
use constellation_overlay::overlay::{DisplayMode, OverlayStyle, SignalOverlayRenderer};

/// User intent collected while panels are drawn, applied afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    Focus(EndpointId),
    CreateConstellation,
    StartEdit(Frequency),
    CommitEdit,
    CancelEdit,
    Recolor(Frequency, Color32),
    RequestDelete(Frequency),
    ConfirmDelete,
    CancelDelete,
    ResetPublic,
    AddFrequency(EndpointId, Frequency),
    RemoveFrequency(EndpointId, Frequency),
    SetCommPower(EndpointId, Frequency, f64),
}

/// Constellation row being edited.
#[derive(Debug, Clone)]
pub struct ChannelEdit {
    pub frequency: Frequency,
    pub name: String,
    pub new_frequency: Frequency,
}

/// Cached member counts and membership labels, refreshed from cascade notices.
#[derive(Debug, Default)]
pub struct RowCache {
    member_counts: BTreeMap<Frequency, usize>,
    endpoint_labels: HashMap<EndpointId, String>,
}

impl RowCache {
    pub fn rebuild(&mut self, frequencies: impl Iterator<Item = Frequency>, endpoints: &EndpointStore) {
        self.member_counts = frequencies.map(|f| (f, endpoints.count_members(f))).collect();
        self.endpoint_labels = endpoints
            .iter()
            .map(|e| (e.id, frequency_label(e.frequencies.iter().copied())))
            .collect();
    }

    pub fn apply(&mut self, notices: &[RefreshNotice], endpoints: &EndpointStore) {
        for notice in notices {
            match notice {
                RefreshNotice::Constellation(f) => {
                    self.member_counts.insert(*f, endpoints.count_members(*f));
                }
                RefreshNotice::ConstellationRemoved(f) => {
                    self.member_counts.remove(f);
                }
                RefreshNotice::Endpoint(id) => match endpoints.get(*id) {
                    Some(e) => {
                        self.endpoint_labels.insert(*id, frequency_label(e.frequencies.iter().copied()));
                    }
                    None => {
                        self.endpoint_labels.remove(id);
                    }
                },
            }
        }
    }

    pub fn member_count(&self, frequency: Frequency) -> usize {
        self.member_counts.get(&frequency).copied().unwrap_or(0)
    }

    pub fn label(&self, id: EndpointId) -> &str {
        self.endpoint_labels.get(&id).map(String::as_str).unwrap_or("")
    }
}

pub struct AppState {
    /// Optional alert message to display in a modal dialog.
    pub alert: Option<String>,
    pub settings: OverlaySettings,
    pub scene: Option<LoadedScene>,
    pub scene_path: Option<String>,
    pub renderer: SignalOverlayRenderer,
    pub mode: DisplayMode,
    /// Endpoint the overlay is centred on.
    pub focus: Option<EndpointId>,
    pub rows: RowCache,
    pub endpoint_sort: EndpointSort,
    pub show_names: bool,
    /// Links drawn in the last frame.
    pub drawn_links: usize,

    pub new_constellation_name: String,
    pub new_constellation_color: Color32,
    pub editing: Option<ChannelEdit>,
    pub pending_delete: Option<Frequency>,
    pub frequency_to_add: Option<Frequency>,

    /// Last directory used for the scene file picker.
    pub last_open_dir: Option<String>,
    pub right_panel_width: f32,
}

/// Settings persisted across application sessions.
#[derive(Default, Serialize, Deserialize)]
struct PersistedSettings {
    last_open_dir: Option<String>,
    right_panel_width: Option<f32>,
    display_mode: Option<DisplayMode>,
    show_names: Option<bool>,
}

impl AppState {
    /// Create a new AppState, loading persisted settings if available.
    pub fn new(settings: OverlaySettings, storage: Option<&dyn eframe::Storage>) -> Self {
        let persisted: PersistedSettings = storage.and_then(|s| eframe::get_value(s, "app_settings")).unwrap_or_default();

        Self {
            alert: None,
            renderer: SignalOverlayRenderer::new(OverlayStyle::from(&settings)),
            settings,
            scene: None,
            scene_path: None,
            mode: persisted.display_mode.unwrap_or_default(),
            focus: None,
            rows: RowCache::default(),
            endpoint_sort: EndpointSort::default(),
            show_names: persisted.show_names.unwrap_or(true),
            drawn_links: 0,
            new_constellation_name: String::new(),
            new_constellation_color: random_color(),
            editing: None,
            pending_delete: None,
            frequency_to_add: None,
            last_open_dir: persisted.last_open_dir,
            right_panel_width: persisted.right_panel_width.unwrap_or(420.0),
        }
    }

    /// Open a native file picker and load the chosen scene.
    pub fn open_scene_dialog(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("Scene files", &["json"]);
        if let Some(dir) = &self.last_open_dir {
            dialog = dialog.set_directory(dir);
        }
        if let Some(file) = dialog.pick_file() {
            if let Some(parent) = file.parent() {
                self.last_open_dir = Some(parent.to_string_lossy().to_string());
            }
            let path = file.to_string_lossy().to_string();
            self.load_scene_from(&path);
        }
    }

    /// Load a scene and the `settings.toml` next to it, if any.
    pub fn load_scene_from(&mut self, path: &str) {
        let settings_path = OverlaySettings::settings_path_from_scene(path);
        match OverlaySettings::load_or_default(&settings_path) {
            Ok(settings) => self.settings = settings,
            Err(e) => {
                log::error!("{}", e);
                self.alert = Some(format!("{}\nUsing previous settings.", e));
            }
        }

        let loaded = load_scene(path).and_then(|scene| scene.into_loaded(&self.settings));
        match loaded {
            Ok(scene) => {
                log::info!("Opened scene {}", path);
                self.rows.rebuild(scene.registry.iter().map(|c| c.frequency), &scene.endpoints);
                self.scene = Some(scene);
                self.scene_path = Some(path.to_string());
                self.focus = None;
                self.editing = None;
                self.pending_delete = None;
                self.sync_style();
            }
            Err(e) => {
                log::error!("Failed to load scene {}: {}", path, e);
                self.alert = Some(format!("Failed to load scene:\n{}", e));
            }
        }
    }

    /// Push changed gradient settings into the renderer.
    pub fn sync_style(&mut self) {
        self.renderer.set_style(OverlayStyle::from(&self.settings));
    }

    pub fn apply_all(&mut self, actions: Vec<PanelAction>) {
        for action in actions {
            self.apply(action);
        }
    }

    /// Execute one panel action. Failures become an alert, never a panic.
    pub fn apply(&mut self, action: PanelAction) {
        if let PanelAction::Focus(id) = action {
            self.focus = Some(id);
            self.frequency_to_add = None;
            return;
        }
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        let registry = &mut scene.registry;
        let endpoints = &mut scene.endpoints;

        let result: Result<CascadeReport, String> = match action {
            PanelAction::Focus(_) => Ok(CascadeReport::default()),
            PanelAction::CreateConstellation => registry
                .create(&self.new_constellation_name, self.new_constellation_color)
                .map(|f| {
                    self.new_constellation_name.clear();
                    self.new_constellation_color = random_color();
                    CascadeReport {
                        reassigned: Vec::new(),
                        notices: vec![RefreshNotice::Constellation(f)],
                    }
                })
                .map_err(|e| e.to_string()),
            PanelAction::StartEdit(frequency) => {
                self.editing = registry.get(frequency).map(|c| ChannelEdit {
                    frequency,
                    name: c.name.clone(),
                    new_frequency: frequency,
                });
                Ok(CascadeReport::default())
            }
            PanelAction::CancelEdit => {
                self.editing = None;
                Ok(CascadeReport::default())
            }
            PanelAction::CommitEdit => match self.editing.take() {
                Some(edit) => MembershipCascade::apply_edit(edit.frequency, &edit.name, edit.new_frequency, registry, endpoints)
                    .map_err(|e| e.to_string()),
                None => Ok(CascadeReport::default()),
            },
            PanelAction::Recolor(frequency, color) => {
                MembershipCascade::apply_recolor(frequency, color, registry, endpoints).map_err(|e| e.to_string())
            }
            PanelAction::RequestDelete(frequency) => {
                self.pending_delete = Some(frequency);
                Ok(CascadeReport::default())
            }
            PanelAction::CancelDelete => {
                self.pending_delete = None;
                Ok(CascadeReport::default())
            }
            PanelAction::ConfirmDelete => match self.pending_delete.take() {
                Some(frequency) => MembershipCascade::apply_delete(frequency, registry, endpoints).map_err(|e| e.to_string()),
                None => Ok(CascadeReport::default()),
            },
            PanelAction::ResetPublic => Ok(MembershipCascade::apply_reset_public(registry, endpoints)),
            PanelAction::AddFrequency(id, frequency) => endpoints
                .add_frequency(id, frequency, registry)
                .map(|_| membership_notices(id, frequency))
                .map_err(|e| e.to_string()),
            PanelAction::RemoveFrequency(id, frequency) => endpoints
                .remove_frequency(id, frequency)
                .map(|_| membership_notices(id, frequency))
                .map_err(|e| e.to_string()),
            PanelAction::SetCommPower(id, frequency, power) => endpoints
                .set_comm_power(id, frequency, power)
                .map(|_| CascadeReport::default())
                .map_err(|e| e.to_string()),
        };

        match result {
            Ok(report) => {
                if !report.reassigned.is_empty() {
                    log::info!("{} endpoints moved to another frequency", report.reassigned.len());
                }
                self.rows.apply(&report.notices, endpoints);
            }
            Err(message) => {
                log::warn!("{}", message);
                self.alert = Some(message);
            }
        }
    }
}

fn membership_notices(id: EndpointId, frequency: Frequency) -> CascadeReport {
    CascadeReport {
        reassigned: Vec::new(),
        notices: vec![RefreshNotice::Endpoint(id), RefreshNotice::Constellation(frequency)],
    }
}

/// Saturated colour with a random hue, suggested for new constellations.
fn random_color() -> Color32 {
    let hue: f32 = rand::thread_rng().gen_range(0.0..1.0);
    egui::ecolor::Hsva::new(hue, 0.85, 0.95, 1.0).into()
}

impl eframe::App for AppState {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedSettings {
            last_open_dir: self.last_open_dir.clone(),
            right_panel_width: Some(self.right_panel_width),
            display_mode: Some(self.mode),
            show_names: Some(self.show_names),
        };
        eframe::set_value(storage, "app_settings", &settings);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(alert) = self.alert.clone() {
            egui::Window::new("Alert")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(20.0);
                        ui.label(alert);
                        ui.add_space(20.0);

                        if ui.button("OK").clicked() {
                            self.alert = None;
                        }
                        ui.add_space(10.0);
                    });
                });
        }

        if let Some(frequency) = self.pending_delete {
            let name = self
                .scene
                .as_ref()
                .map(|s| s.registry.name_of(frequency).to_string())
                .unwrap_or_default();
            let mut action = None;
            egui::Window::new("Delete constellation")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.label(format!(
                        "Delete '{}' on frequency {}? Its members move to the public constellation.",
                        name, frequency
                    ));
                    ui.horizontal(|ui| {
                        if ui.button("Delete").clicked() {
                            action = Some(PanelAction::ConfirmDelete);
                        }
                        if ui.button("Cancel").clicked() {
                            action = Some(PanelAction::CancelDelete);
                        }
                    });
                });
            if let Some(action) = action {
                self.apply(action);
            }
        }

        // Panels layout: top (fixed), right (resizable), map fills the rest
        super::top_panel::render(ctx, self);
        super::right_panel::render(ctx, self);
        super::map::render(ctx, self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use constellation_overlay::common::parse_scene;
    use constellation_overlay::constellation::{ConstellationRegistry, Endpoint};

    const SCENE: &str = r##"{
        "world_top_left": {"x": 0, "y": 0},
        "world_bottom_right": {"x": 100, "y": 100},
        "width": 100,
        "height": 100,
        "constellations": [
            {"frequency": 50, "name": "Blue", "color": "#0000ff"},
            {"frequency": 99, "name": "Red", "color": "#ff0000"}
        ],
        "endpoints": [
            {"id": 1, "name": "A", "frequencies": [99], "comm_power": {"99": 50.0}, "position": {"x": 10, "y": 10}}
        ]
    }"##;

    fn settings() -> OverlaySettings {
        OverlaySettings {
            public_frequency: 1,
            ..OverlaySettings::default()
        }
    }

    fn store() -> (ConstellationRegistry, EndpointStore) {
        let mut registry = ConstellationRegistry::new(&settings());
        registry.create_with_frequency(99, "Red", Color32::RED).unwrap();
        let mut endpoints = EndpointStore::new();
        let mut a = Endpoint::new(1, "A");
        a.frequencies.insert(99);
        endpoints.insert(a);
        (registry, endpoints)
    }

    fn app_with_scene() -> AppState {
        let mut app = AppState::new(settings(), None);
        let scene = parse_scene(SCENE).unwrap().into_loaded(&app.settings).unwrap();
        app.rows.rebuild(scene.registry.iter().map(|c| c.frequency), &scene.endpoints);
        app.scene = Some(scene);
        app
    }

    fn edit(app: &mut AppState, frequency: Frequency, name: &str, new_frequency: Frequency) {
        app.apply(PanelAction::StartEdit(frequency));
        if let Some(edit) = app.editing.as_mut() {
            edit.name = name.to_string();
            edit.new_frequency = new_frequency;
        }
        app.apply(PanelAction::CommitEdit);
    }

    #[test]
    fn row_cache_follows_delete_cascade() {
        let (mut registry, mut endpoints) = store();
        let mut rows = RowCache::default();
        rows.rebuild(registry.iter().map(|c| c.frequency), &endpoints);
        assert_eq!(rows.member_count(99), 1);
        assert_eq!(rows.label(1), "Frequencies: 99");

        let report = MembershipCascade::apply_delete(99, &mut registry, &mut endpoints).unwrap();
        rows.apply(&report.notices, &endpoints);
        assert_eq!(rows.member_count(99), 0);
        assert_eq!(rows.member_count(1), 1);
        assert_eq!(rows.label(1), "Frequencies: 1");
    }

    #[test]
    fn rejected_edit_keeps_old_name() {
        let mut app = app_with_scene();
        edit(&mut app, 99, "Crimson", 50);
        assert!(app.alert.as_deref().is_some_and(|a| a.contains("frequency 50")));
        let registry = &app.scene.as_ref().unwrap().registry;
        assert_eq!(registry.name_of(99), "Red");
        assert_eq!(registry.name_of(50), "Blue");
        assert!(app.editing.is_none());
    }

    #[test]
    fn edit_retunes_and_refreshes_rows() {
        let mut app = app_with_scene();
        edit(&mut app, 99, "Crimson", 42);
        assert!(app.alert.is_none());
        let scene = app.scene.as_ref().unwrap();
        assert_eq!(scene.registry.name_of(42), "Crimson");
        assert_eq!(app.rows.member_count(99), 0);
        assert_eq!(app.rows.member_count(42), 1);
        assert_eq!(app.rows.label(1), "Frequencies: 42");
    }
}
