use eframe::egui;
use env_logger::Builder;
use log::{LevelFilter, error, info};
use std::path::Path;

use constellation_overlay::common::OverlaySettings;

mod ui;

use ui::AppState;

fn main() {
    // Logging setup
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some("constellation_overlay"), LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Starting up");

    // Optional scene path as the first argument
    let initial_scene = std::env::args().nth(1);

    let settings = match OverlaySettings::load_or_default(Path::new("settings.toml")) {
        Ok(settings) => settings,
        Err(e) => {
            error!("{}, using defaults", e);
            OverlaySettings::default()
        }
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1400.0, 900.0]),
        ..Default::default()
    };
    let result = eframe::run_native(
        "Constellation Overlay",
        native_options,
        Box::new(move |cc| {
            let mut app = AppState::new(settings, cc.storage);
            if let Some(path) = initial_scene {
                app.load_scene_from(&path);
            }
            Ok(Box::new(app))
        }),
    );
    if let Err(e) = result {
        error!("Viewer terminated with error: {}", e);
    }
}
