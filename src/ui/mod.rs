// Viewer UI for the constellation overlay
//
// This module organizes the UI into separate components:
// - `top_panel`: Scene, overlay mode and gradient controls
// - `right_panel`: Constellation table and endpoint memberships
// - `map`: Central map with links, overlay and endpoint icons
// - `app_state`: Application state, panel actions and the main update loop

pub mod app_state;
pub mod map;
pub mod right_panel;
pub mod top_panel;

pub use app_state::{AppState, PanelAction};
