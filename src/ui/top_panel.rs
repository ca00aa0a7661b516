//! # Top Panel - Scene and Overlay Controls
//!
//! Three columns:
//! - Column 1: scene file, endpoint and link counts
//! - Column 2: overlay mode selection and the focus endpoint
//! - Column 3: gradient controls (swap, lerp power) and a gradient preview

use eframe::egui;
use egui::Color32;

use crate::ui::AppState;
use constellation_overlay::overlay::{DisplayMode, Topology};

/// Render the top panel.
pub fn render(ctx: &egui::Context, state: &mut AppState) {
    egui::TopBottomPanel::top("top_controls").exact_height(120.0).show(ctx, |ui| {
        ui.columns(3, |cols| {
            cols[0].vertical(|ui| {
                ui.heading("Scene");
                ui.separator();
                if ui.button("Open scene…").clicked() {
                    state.open_scene_dialog();
                }
                let file = state.scene_path.as_deref().unwrap_or("(none)");
                ui.label(egui::RichText::new(file).monospace());
                if let Some(scene) = &state.scene {
                    ui.label(format!(
                        "{} endpoints, {} links, {} constellations",
                        scene.endpoints.len(),
                        scene.topology.links().len(),
                        scene.registry.len()
                    ));
                }
            });

            cols[1].vertical(|ui| {
                ui.heading("Overlay");
                ui.separator();
                ui.horizontal(|ui| {
                    ui.label("Mode:");
                    egui::ComboBox::from_id_salt("display_mode_selector")
                        .selected_text(state.mode.label())
                        .show_ui(ui, |ui| {
                            for mode in DisplayMode::ALL {
                                ui.selectable_value(&mut state.mode, mode, mode.label());
                            }
                        });
                    if ui.button("Next").clicked() {
                        state.mode = state.mode.next();
                    }
                });
                let focus = match (state.focus, &state.scene) {
                    (Some(id), Some(scene)) => scene
                        .endpoints
                        .get(id)
                        .map(|e| e.name.clone())
                        .unwrap_or_else(|| format!("#{}", id)),
                    _ => "none (click an endpoint)".to_string(),
                };
                ui.label(format!("Focus: {}", focus));
                ui.label(format!("Links drawn: {}", state.drawn_links));
            });

            cols[2].vertical(|ui| {
                ui.heading("Gradient");
                ui.separator();
                ui.horizontal(|ui| {
                    let mut swap = state.settings.swap_high_low;
                    if ui.checkbox(&mut swap, "Swap high/low").changed() {
                        state.settings.swap_high_low = swap;
                        state.sync_style();
                    }
                    let mut show_names = state.show_names;
                    if ui.checkbox(&mut show_names, "Show names").changed() {
                        state.show_names = show_names;
                    }
                });
                ui.horizontal(|ui| {
                    ui.label("Lerp power:");
                    let mut power = state.settings.lerp_power;
                    if ui.add(egui::Slider::new(&mut power, 0.1..=5.0)).changed() {
                        state.settings.lerp_power = power;
                        state.sync_style();
                    }
                });
                draw_gradient_preview(ui, state);
            });
        });
    });
}

/// Strip showing weak to strong signal for the configured high colour.
fn draw_gradient_preview(ui: &mut egui::Ui, state: &AppState) {
    const STEPS: usize = 32;
    let (rect, _) = ui.allocate_exact_size(egui::vec2(ui.available_width().min(240.0), 12.0), egui::Sense::hover());
    let painter = ui.painter_at(rect);
    let style = state.renderer.style();
    let step_width = rect.width() / STEPS as f32;
    for i in 0..STEPS {
        let strength = i as f64 / (STEPS - 1) as f64;
        let color: Color32 = style.link_color(strength, state.settings.color_high);
        let x = rect.left() + i as f32 * step_width;
        let cell = egui::Rect::from_min_size(egui::pos2(x, rect.top()), egui::vec2(step_width + 0.5, rect.height()));
        painter.rect_filled(cell, 0.0, color);
    }
}
