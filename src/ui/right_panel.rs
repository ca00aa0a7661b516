//! # Right Panel - Constellations and Memberships
//!
//! Three sections:
//! - the constellation table with create, edit, recolour, delete and the
//!   public channel reset
//! - the focus endpoint with its frequencies and per-frequency power
//! - a sortable endpoint listing; clicking a row focuses that endpoint
//!
//! Widgets only record `PanelAction`s; they are applied once the panel is
//! drawn.

use eframe::egui;
use egui::Color32;
use egui_extras::{Column, TableBuilder};

use crate::ui::{AppState, PanelAction};
use constellation_overlay::common::LoadedScene;
use constellation_overlay::constellation::{Endpoint, EndpointId, EndpointKind, EndpointSort};
use constellation_overlay::signal::LinkColorResolver;

pub fn render(ctx: &egui::Context, state: &mut AppState) {
    let mut actions = Vec::new();
    let response = egui::SidePanel::right("inspector")
        .resizable(true)
        .default_width(state.right_panel_width)
        .min_width(300.0)
        .show(ctx, |ui| {
            if state.scene.is_none() {
                ui.heading("No scene loaded");
                ui.label("Open a scene file to manage constellations.");
                return;
            }
            egui::ScrollArea::vertical().show(ui, |ui| {
                render_constellations(ui, state, &mut actions);
                ui.separator();
                render_focus_endpoint(ui, state, &mut actions);
                ui.separator();
                render_endpoint_list(ui, state, &mut actions);
            });
        });
    state.right_panel_width = response.response.rect.width();
    state.apply_all(actions);
}

fn render_constellations(ui: &mut egui::Ui, state: &mut AppState, actions: &mut Vec<PanelAction>) {
    let Some(scene) = &state.scene else {
        return;
    };
    ui.heading("Constellations");

    let row_height = ui.text_style_height(&egui::TextStyle::Body) * 1.6;
    let public = scene.registry.public_frequency();
    let editing = &mut state.editing;
    let rows = &state.rows;
    TableBuilder::new(ui)
        .id_salt("constellation_table")
        .striped(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::exact(30.0)) // Colour
        .column(Column::initial(60.0).at_least(50.0)) // Frequency
        .column(Column::remainder().at_least(100.0)) // Name
        .column(Column::initial(60.0).at_least(40.0)) // Members
        .column(Column::initial(110.0).at_least(100.0)) // Actions
        .header(row_height, |mut header| {
            header.col(|_| {});
            header.col(|ui| {
                ui.strong("Freq");
            });
            header.col(|ui| {
                ui.strong("Name");
            });
            header.col(|ui| {
                ui.strong("Members");
            });
            header.col(|_| {});
        })
        .body(|mut body| {
            for constellation in scene.registry.iter() {
                let frequency = constellation.frequency;
                let is_edited = editing.as_ref().is_some_and(|e| e.frequency == frequency);
                body.row(row_height, |mut row| {
                    row.col(|ui| {
                        let mut color = constellation.color;
                        if ui.color_edit_button_srgba(&mut color).changed() {
                            actions.push(PanelAction::Recolor(frequency, color));
                        }
                    });
                    row.col(|ui| match editing.as_mut().filter(|_| is_edited) {
                        // the public frequency is fixed
                        Some(edit) if frequency != public => {
                            ui.add(egui::DragValue::new(&mut edit.new_frequency).range(1..=state.settings.max_frequency));
                        }
                        _ => {
                            ui.label(frequency.to_string());
                        }
                    });
                    row.col(|ui| match editing.as_mut().filter(|_| is_edited) {
                        Some(edit) => {
                            let response = ui.text_edit_singleline(&mut edit.name);
                            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                                actions.push(PanelAction::CommitEdit);
                            }
                        }
                        None => {
                            let text = egui::RichText::new(&constellation.name);
                            ui.label(if frequency == public { text.strong() } else { text });
                        }
                    });
                    row.col(|ui| {
                        ui.label(rows.member_count(frequency).to_string());
                    });
                    row.col(|ui| {
                        if is_edited {
                            if ui.small_button("Save").clicked() {
                                actions.push(PanelAction::CommitEdit);
                            }
                            if ui.small_button("Cancel").clicked() {
                                actions.push(PanelAction::CancelEdit);
                            }
                            return;
                        }
                        if ui.small_button("Edit").clicked() {
                            actions.push(PanelAction::StartEdit(frequency));
                        }
                        if frequency == public {
                            if ui.small_button("Reset").on_hover_text("Restore default name and colour").clicked() {
                                actions.push(PanelAction::ResetPublic);
                            }
                        } else if ui.small_button("Delete").clicked() {
                            actions.push(PanelAction::RequestDelete(frequency));
                        }
                    });
                });
            }
        });

    ui.horizontal(|ui| {
        ui.color_edit_button_srgba(&mut state.new_constellation_color);
        ui.add(egui::TextEdit::singleline(&mut state.new_constellation_name).hint_text("New constellation").desired_width(160.0));
        let can_create = !state.new_constellation_name.trim().is_empty();
        if ui.add_enabled(can_create, egui::Button::new("Create")).clicked() {
            actions.push(PanelAction::CreateConstellation);
        }
    });
}

fn render_focus_endpoint(ui: &mut egui::Ui, state: &mut AppState, actions: &mut Vec<PanelAction>) {
    let Some(scene) = &state.scene else {
        return;
    };
    let Some(endpoint) = state.focus.and_then(|id| scene.endpoints.get(id)) else {
        ui.heading("Endpoint");
        ui.label("Click an endpoint on the map or in the list below.");
        return;
    };
    let id = endpoint.id;

    ui.horizontal(|ui| {
        let resolver = LinkColorResolver::new(&scene.registry, &scene.endpoints, &scene.range_model);
        let (swatch, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
        ui.painter().circle_filled(swatch.center(), 6.0, resolver.endpoint_color(id));
        ui.heading(&endpoint.name);
    });
    ui.label(format!("{} at {}", kind_label(endpoint.kind), if endpoint.body.is_empty() { "?" } else { endpoint.body.as_str() }));

    if endpoint.is_blind() {
        ui.colored_label(Color32::from_rgb(255, 120, 0), "No active frequency to broadcast!");
    }

    egui::Grid::new("focus_frequencies").striped(true).num_columns(4).show(ui, |ui| {
        for frequency in endpoint.frequencies.iter().copied() {
            ui.label(frequency.to_string());
            ui.label(scene.registry.name_of(frequency));
            let mut power = endpoint.comm_power(frequency);
            if ui.add(egui::DragValue::new(&mut power).range(0.0..=f64::MAX).speed(1.0).prefix("power ")).changed() {
                actions.push(PanelAction::SetCommPower(id, frequency, power));
            }
            if ui.small_button("Remove").clicked() {
                actions.push(PanelAction::RemoveFrequency(id, frequency));
            }
            ui.end_row();
        }
    });

    let candidates: Vec<_> = scene.registry.iter().filter(|c| !endpoint.frequencies.contains(&c.frequency)).collect();
    if candidates.is_empty() {
        return;
    }
    ui.horizontal(|ui| {
        let selected_text = state
            .frequency_to_add
            .filter(|f| candidates.iter().any(|c| c.frequency == *f))
            .map(|f| format!("{} {}", f, scene.registry.name_of(f)))
            .unwrap_or_else(|| "Choose…".to_string());
        egui::ComboBox::from_id_salt("frequency_to_add").selected_text(selected_text).show_ui(ui, |ui| {
            for c in &candidates {
                ui.selectable_value(&mut state.frequency_to_add, Some(c.frequency), format!("{} {}", c.frequency, c.name));
            }
        });
        if let Some(frequency) = state.frequency_to_add.filter(|f| candidates.iter().any(|c| c.frequency == *f)) {
            if ui.button("Add").clicked() {
                actions.push(PanelAction::AddFrequency(id, frequency));
            }
        }
    });
}

fn render_endpoint_list(ui: &mut egui::Ui, state: &mut AppState, actions: &mut Vec<PanelAction>) {
    ui.horizontal(|ui| {
        ui.heading("Endpoints");
        egui::ComboBox::from_id_salt("endpoint_sort")
            .selected_text(sort_label(state.endpoint_sort))
            .show_ui(ui, |ui| {
                for sort in [EndpointSort::LaunchTime, EndpointSort::StrongestFrequency, EndpointSort::Name, EndpointSort::Body] {
                    ui.selectable_value(&mut state.endpoint_sort, sort, sort_label(sort));
                }
            });
    });

    let Some(scene) = &state.scene else {
        return;
    };
    let row_height = ui.text_style_height(&egui::TextStyle::Body) * 1.3;
    let sorted = scene.endpoints.sorted(state.endpoint_sort);
    TableBuilder::new(ui)
        .id_salt("endpoint_table")
        .striped(true)
        .sense(egui::Sense::click())
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::exact(16.0)) // Icon
        .column(Column::initial(120.0).at_least(80.0)) // Name
        .column(Column::initial(70.0).at_least(50.0)) // Body
        .column(Column::remainder()) // Frequencies
        .header(row_height, |mut header| {
            header.col(|_| {});
            header.col(|ui| {
                ui.strong("Name");
            });
            header.col(|ui| {
                ui.strong("Body");
            });
            header.col(|ui| {
                ui.strong("Membership");
            });
        })
        .body(|body| {
            let icons = icon_colors(scene, &sorted);
            body.rows(row_height, sorted.len(), |mut row| {
                let index = row.index();
                let endpoint = sorted[index];
                row.set_selected(state.focus == Some(endpoint.id));
                row.col(|ui| {
                    let (rect, _) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
                    let color = icons[index].1;
                    if endpoint.kind == EndpointKind::GroundStation {
                        ui.painter().rect_filled(rect, 0.0, color);
                    } else {
                        ui.painter().circle_filled(rect.center(), 5.0, color);
                    }
                });
                row.col(|ui| {
                    ui.label(&endpoint.name);
                });
                row.col(|ui| {
                    ui.label(&endpoint.body);
                });
                row.col(|ui| {
                    ui.label(state.rows.label(endpoint.id));
                });
                if row.response().clicked() {
                    actions.push(PanelAction::Focus(endpoint.id));
                }
            });
        });
}

fn icon_colors(scene: &LoadedScene, sorted: &[&Endpoint]) -> Vec<(EndpointId, Color32)> {
    let resolver = LinkColorResolver::new(&scene.registry, &scene.endpoints, &scene.range_model);
    let ids: Vec<_> = sorted.iter().map(|e| e.id).collect();
    resolver.icon_colors(&ids)
}

fn kind_label(kind: EndpointKind) -> &'static str {
    match kind {
        EndpointKind::Vessel => "Vessel",
        EndpointKind::GroundStation => "Ground station",
    }
}

fn sort_label(sort: EndpointSort) -> &'static str {
    match sort {
        EndpointSort::LaunchTime => "Launch time",
        EndpointSort::StrongestFrequency => "Strongest frequency",
        EndpointSort::Name => "Name",
        EndpointSort::Body => "Body",
    }
}
