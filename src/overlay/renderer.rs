//! Per-frame link selection and strength colouring.
//!
//! The renderer has no memory of previous modes. Each frame is a pure
//! function of the display mode, the focus endpoint and the topology
//! snapshot. The only retained state is the line geometry, which is rebuilt
//! or deactivated on every call.

use egui::Color32;
use serde::{Deserialize, Serialize};

use super::line::LineBuffer;
use super::topology::{LinkId, PathHop, Topology};
use crate::common::color::lerp_color;
use crate::common::settings::OverlaySettings;
use crate::constellation::EndpointId;
use crate::signal::LinkColorResolver;

/// Which links the overlay shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayMode {
    #[default]
    None,
    /// First link of the focus endpoint's control path.
    FirstHop,
    /// Whole control path of the focus endpoint.
    Path,
    /// Every link touching the focus endpoint.
    VesselLinks,
    /// Every link in the graph.
    Network,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 5] = [
        DisplayMode::None,
        DisplayMode::FirstHop,
        DisplayMode::Path,
        DisplayMode::VesselLinks,
        DisplayMode::Network,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::None => "None",
            DisplayMode::FirstHop => "First hop",
            DisplayMode::Path => "Control path",
            DisplayMode::VesselLinks => "Vessel links",
            DisplayMode::Network => "Network",
        }
    }

    /// Next mode in cycling order, wrapping around.
    pub fn next(self) -> DisplayMode {
        let index = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

/// A selected link and the strength it is drawn with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedLink {
    pub link: LinkId,
    pub strength: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColoredLink {
    pub link: LinkId,
    pub color: Color32,
}

/// Links to draw this frame, in draw order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub links: Vec<ColoredLink>,
}

impl Frame {
    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    pub fn nothing_to_draw(&self) -> bool {
        self.links.is_empty()
    }
}

/// Strength to colour mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub color_low: Color32,
    pub lerp_power: f32,
    pub swap_high_low: bool,
}

impl From<&OverlaySettings> for OverlayStyle {
    fn from(settings: &OverlaySettings) -> Self {
        Self {
            color_low: settings.color_low,
            lerp_power: settings.lerp_power,
            swap_high_low: settings.swap_high_low,
        }
    }
}

impl OverlayStyle {
    /// `level = strength ^ lerp_power`, then interpolate between the low
    /// colour and the channel colour.
    pub fn link_color(&self, strength: f64, high: Color32) -> Color32 {
        let strength = if strength.is_nan() { 0.0 } else { strength.clamp(0.0, 1.0) };
        let level = (strength as f32).powf(self.lerp_power);
        if self.swap_high_low {
            lerp_color(high, self.color_low, level)
        } else {
            lerp_color(self.color_low, high, level)
        }
    }
}

/// Links visible for `mode`, in draw order.
///
/// Missing focus, missing or empty control paths and empty graphs all yield
/// an empty selection.
pub fn select_links(mode: DisplayMode, focus: Option<EndpointId>, topology: &dyn Topology) -> Vec<SelectedLink> {
    match mode {
        DisplayMode::None => Vec::new(),
        DisplayMode::FirstHop | DisplayMode::Path => {
            let Some(focus) = focus.filter(|f| topology.is_connected(*f)) else {
                return Vec::new();
            };
            if !topology.control_state(focus).shows_control_path() {
                return Vec::new();
            }
            let Some(path) = topology.control_path(focus).filter(|p| !p.is_empty()) else {
                return Vec::new();
            };
            let select_hop = |hop: &PathHop| -> Option<SelectedLink> {
                let link = topology.link(hop.link)?;
                Some(SelectedLink {
                    link: hop.link,
                    strength: link.strength_from(hop.from),
                })
            };
            if mode == DisplayMode::FirstHop {
                return path.first().and_then(select_hop).into_iter().collect();
            }
            // root to focus: the path is stored focus first
            path.hops().iter().rev().filter_map(select_hop).collect()
        }
        DisplayMode::VesselLinks => {
            let Some(focus) = focus.filter(|f| topology.is_connected(*f)) else {
                return Vec::new();
            };
            topology
                .incident_links(focus)
                .into_iter()
                .map(|link| SelectedLink {
                    link: link.id,
                    strength: link.strength_from(focus),
                })
                .collect()
        }
        DisplayMode::Network => topology
            .links()
            .iter()
            .map(|link| SelectedLink {
                link: link.id,
                strength: link.best_strength(),
            })
            .collect(),
    }
}

pub struct SignalOverlayRenderer {
    style: OverlayStyle,
    line: LineBuffer,
}

impl SignalOverlayRenderer {
    pub fn new(style: OverlayStyle) -> Self {
        Self {
            style,
            line: LineBuffer::new(),
        }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: OverlayStyle) {
        self.style = style;
    }

    pub fn line(&self) -> &LineBuffer {
        &self.line
    }

    /// Select, colour and retain the links of one frame.
    pub fn render_frame(&mut self, mode: DisplayMode, focus: Option<EndpointId>, topology: &dyn Topology, resolver: &LinkColorResolver) -> Frame {
        let selected = select_links(mode, focus, topology);
        if selected.is_empty() {
            if self.line.is_active() {
                log::debug!("Overlay cleared ({:?})", mode);
            }
            self.line.deactivate();
            return Frame::default();
        }

        let links: Vec<ColoredLink> = selected
            .iter()
            .filter_map(|s| {
                let link = topology.link(s.link)?;
                let high = resolver.resolve(link.a, link.b);
                Some(ColoredLink {
                    link: s.link,
                    color: self.style.link_color(s.strength, high),
                })
            })
            .collect();

        self.line.rebuild(&links, topology);
        Frame { links }
    }
}
