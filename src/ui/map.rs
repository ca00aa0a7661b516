//! # Central Map Visualization
//!
//! Draws, back to front:
//! - every physical link as a faint line
//! - the signal overlay for the current display mode
//! - endpoints as icons in their strongest constellation's colour (ground
//!   stations square, vessels round), with optional names
//!
//! World coordinates between the scene's top-left and bottom-right corners
//! are linearly mapped into a rectangle that keeps the world aspect ratio.
//! Clicking selects the nearest endpoint as the overlay focus.

use eframe::egui;
use egui::Color32;

use crate::ui::AppState;
use constellation_overlay::common::LoadedScene;
use constellation_overlay::constellation::{EndpointId, EndpointKind};
use constellation_overlay::overlay::{Point, Topology};
use constellation_overlay::signal::LinkColorResolver;

const PHYSICAL_LINK_COLOR: Color32 = Color32::from_rgb(55, 55, 70);
const FOCUS_RING_COLOR: Color32 = Color32::WHITE;

/// Render the central map panel.
pub fn render(ctx: &egui::Context, state: &mut AppState) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.heading("Map");
        ui.separator();

        let Some(scene) = state.scene.as_ref() else {
            state.drawn_links = 0;
            return;
        };

        let aspect_ratio = if scene.height > 0.0 { (scene.width / scene.height) as f32 } else { 1.0 };

        // Reserve a drawing area with proper aspect ratio, centered in available space
        let avail_rect = ui.available_rect_before_wrap();
        let (map_width, map_height) = if avail_rect.width() / avail_rect.height() > aspect_ratio {
            (avail_rect.height() * aspect_ratio, avail_rect.height())
        } else {
            (avail_rect.width(), avail_rect.width() / aspect_ratio)
        };
        let x = avail_rect.center().x - map_width / 2.0;
        let y = avail_rect.center().y - map_height / 2.0;
        let rect = egui::Rect::from_min_size(egui::pos2(x, y), egui::vec2(map_width, map_height));
        let response = ui.interact(rect, egui::Id::new("map_canvas"), egui::Sense::click());
        let painter = ui.painter_at(rect);

        painter.rect_filled(rect, 4.0, ui.visuals().extreme_bg_color);

        for link in scene.topology.links() {
            if let (Some(a), Some(b)) = (scene.topology.position(link.a), scene.topology.position(link.b)) {
                painter.line_segment([to_screen(rect, scene, a), to_screen(rect, scene, b)], egui::Stroke::new(1.0, PHYSICAL_LINK_COLOR));
            }
        }

        let resolver = LinkColorResolver::new(&scene.registry, &scene.endpoints, &scene.range_model);
        let frame = state.renderer.render_frame(state.mode, state.focus, &scene.topology, &resolver);
        state.drawn_links = frame.num_links();
        let line = state.renderer.line();
        if line.is_active() {
            for (from, to, color) in line.segments() {
                painter.line_segment([to_screen(rect, scene, from), to_screen(rect, scene, to)], egui::Stroke::new(2.5, color));
            }
        }

        draw_endpoints(&painter, rect, scene, &resolver, state.focus, state.show_names);

        if let Some(clicked) = nearest_endpoint(&response, rect, scene) {
            state.focus = Some(clicked);
        }
    });
}

fn to_screen(rect: egui::Rect, scene: &LoadedScene, p: Point) -> egui::Pos2 {
    let world_width = scene.world_bottom_right.x - scene.world_top_left.x;
    let world_height = scene.world_bottom_right.y - scene.world_top_left.y;
    egui::pos2(
        egui::lerp(rect.left()..=rect.right(), ((p.x - scene.world_top_left.x) / world_width) as f32),
        egui::lerp(rect.top()..=rect.bottom(), ((p.y - scene.world_top_left.y) / world_height) as f32),
    )
}

fn draw_endpoints(painter: &egui::Painter, rect: egui::Rect, scene: &LoadedScene, resolver: &LinkColorResolver, focus: Option<EndpointId>, show_names: bool) {
    let radius = 5.0;
    // only endpoints on the map get an icon colour
    let visible: Vec<EndpointId> = scene.endpoints.iter().map(|e| e.id).filter(|id| scene.topology.position(*id).is_some()).collect();

    for (id, color) in resolver.icon_colors(&visible) {
        let (Some(endpoint), Some(position)) = (scene.endpoints.get(id), scene.topology.position(id)) else {
            continue;
        };
        let pos = to_screen(rect, scene, position);
        match endpoint.kind {
            EndpointKind::GroundStation => {
                painter.rect_filled(egui::Rect::from_center_size(pos, egui::vec2(radius * 2.0, radius * 2.0)), 0.0, color);
            }
            EndpointKind::Vessel => {
                painter.circle_filled(pos, radius, color);
            }
        }
        if focus == Some(id) {
            painter.circle_stroke(pos, radius + 4.0, egui::Stroke::new(1.5, FOCUS_RING_COLOR));
        }
        if show_names {
            painter.text(
                egui::pos2(pos.x + 8.0, pos.y - 8.0),
                egui::Align2::LEFT_BOTTOM,
                &endpoint.name,
                egui::FontId::monospace(12.0),
                color,
            );
        }
    }
}

/// Endpoint nearest to a click inside the map, by squared screen distance.
fn nearest_endpoint(response: &egui::Response, rect: egui::Rect, scene: &LoadedScene) -> Option<EndpointId> {
    if !response.clicked() {
        return None;
    }
    let click = response.interact_pointer_pos()?;
    scene
        .endpoints
        .iter()
        .filter_map(|e| scene.topology.position(e.id).map(|p| (e.id, to_screen(rect, scene, p))))
        .map(|(id, pos)| (id, (pos - click).length_sq()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}
