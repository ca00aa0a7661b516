//! Retained line geometry of the overlay.
//!
//! The host draws whatever is in the buffer while it is active. A frame that
//! selects nothing must deactivate it, otherwise the previous frame's lines
//! would stay on screen.

use egui::Color32;

use super::renderer::ColoredLink;
use super::topology::{Point, Topology};

#[derive(Debug, Default, Clone)]
pub struct LineBuffer {
    active: bool,
    /// Two points per segment.
    points: Vec<Point>,
    /// One colour per segment.
    colors: Vec<Color32>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the geometry with the given links and mark it active.
    ///
    /// Links whose endpoints have no known position are left out of the
    /// geometry.
    pub fn rebuild(&mut self, links: &[ColoredLink], topology: &dyn Topology) {
        self.points.clear();
        self.colors.clear();
        for colored in links {
            let Some(link) = topology.link(colored.link) else {
                continue;
            };
            match (topology.position(link.a), topology.position(link.b)) {
                (Some(a), Some(b)) => {
                    self.points.push(a);
                    self.points.push(b);
                    self.colors.push(colored.color);
                }
                _ => log::debug!("Link {} has an endpoint without position, not drawn", link.id),
            }
        }
        self.active = true;
    }

    /// Hide the geometry and drop pending points.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.points.clear();
        self.colors.clear();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn segment_count(&self) -> usize {
        self.colors.len()
    }

    /// Segments as `(from, to, colour)`.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point, Color32)> + '_ {
        self.points.chunks_exact(2).zip(self.colors.iter()).map(|(pair, color)| (pair[0], pair[1], *color))
    }
}
