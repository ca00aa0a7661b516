//! Shared building blocks: colours, settings and scene files.

pub mod color;
pub mod scene;
pub mod settings;

pub use scene::{LoadedScene, Scene, SceneLoadError, load_scene, parse_scene};
pub use settings::OverlaySettings;
