//! Signal overlay: which links are visible and in what colour.
//!
//! ## Module Organization
//!
//! - `topology`: read-only topology interface and an in-memory snapshot
//! - `renderer`: display modes, link selection and strength colouring
//! - `line`: retained line geometry consumed by the host

pub mod line;
pub mod renderer;
pub mod topology;

pub use line::LineBuffer;
pub use renderer::{ColoredLink, DisplayMode, Frame, OverlayStyle, SelectedLink, SignalOverlayRenderer, select_links};
pub use topology::{ControlPath, ControlState, Link, LinkId, PathHop, Point, StaticTopology, Topology, TopologyError};
