//! Read-only view of the external network topology.
//!
//! Connectivity is decided elsewhere. The overlay only enumerates links,
//! follows control paths and reads signal strengths through `Topology`.
//! `StaticTopology` is a plain in-memory snapshot of that information, filled
//! by the viewer from a scene file and by the tests.

use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::constellation::EndpointId;

/// Index of a link inside its topology snapshot.
pub type LinkId = usize;

/// Simple 2D point in world units.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Command capability of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlState {
    /// Commandable through the network (crewed, or a probe core with control).
    #[default]
    Controlled,
    /// Probe core present but without command authority.
    Unpiloted,
    /// Nothing on board can take commands.
    Uncontrollable,
}

impl ControlState {
    /// Only controlled endpoints have a meaningful control path to display.
    pub fn shows_control_path(self) -> bool {
        matches!(self, ControlState::Controlled)
    }
}

/// Physical connection between two endpoints.
///
/// Signal strength is direction-aware and always within `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: LinkId,
    pub a: EndpointId,
    pub b: EndpointId,
    /// Strength when traversed from `a` to `b`.
    pub strength_ab: f64,
    /// Strength when traversed from `b` to `a`.
    pub strength_ba: f64,
}

impl Link {
    /// Whether `node` is one of the two ends.
    pub fn touches(&self, node: EndpointId) -> bool {
        self.a == node || self.b == node
    }

    /// The opposite end from `node`, `None` when `node` is not an end.
    pub fn other(&self, node: EndpointId) -> Option<EndpointId> {
        if self.a == node {
            Some(self.b)
        } else if self.b == node {
            Some(self.a)
        } else {
            None
        }
    }

    /// Strength of the traversal leaving `node`. Falls back to the best
    /// direction when `node` is not an end of this link.
    pub fn strength_from(&self, node: EndpointId) -> f64 {
        if self.a == node {
            self.strength_ab
        } else if self.b == node {
            self.strength_ba
        } else {
            self.best_strength()
        }
    }

    pub fn best_strength(&self) -> f64 {
        self.strength_ab.max(self.strength_ba)
    }
}

/// One step of a control path, leaving `from` over `link`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathHop {
    pub link: LinkId,
    pub from: EndpointId,
}

/// Ordered links between an endpoint and its control root.
///
/// Index 0 is the hop leaving the endpoint, the last index reaches the root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlPath {
    hops: Vec<PathHop>,
}

impl ControlPath {
    pub fn new(hops: Vec<PathHop>) -> Self {
        Self { hops }
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Hop leaving the endpoint itself.
    pub fn first(&self) -> Option<&PathHop> {
        self.hops.first()
    }

    pub fn get(&self, index: usize) -> Option<&PathHop> {
        self.hops.get(index)
    }

    /// All hops, focus first.
    pub fn hops(&self) -> &[PathHop] {
        &self.hops
    }
}

/// What the overlay needs from the topology engine.
pub trait Topology {
    /// Every link currently known, in index order.
    fn links(&self) -> &[Link];

    fn link(&self, id: LinkId) -> Option<&Link> {
        self.links().get(id)
    }

    /// Whether the endpoint takes part in the network at all.
    fn is_connected(&self, node: EndpointId) -> bool;

    /// Links incident to `node`, in enumeration order.
    fn incident_links(&self, node: EndpointId) -> Vec<&Link> {
        self.links().iter().filter(|l| l.touches(node)).collect()
    }

    /// Control path of `node`, focus first. `None` when it has no route to a
    /// control root.
    fn control_path(&self, node: EndpointId) -> Option<&ControlPath>;

    /// Command capability of `node`. Unknown nodes are `Uncontrollable`.
    fn control_state(&self, node: EndpointId) -> ControlState;

    /// World position used for drawing, `None` when the node is unknown.
    fn position(&self, node: EndpointId) -> Option<Point>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("unknown node {0}")]
    UnknownNode(EndpointId),
    #[error("unknown link {0}")]
    UnknownLink(LinkId),
    #[error("link {link} does not continue the path at node {node}")]
    BrokenPath { link: LinkId, node: EndpointId },
}

#[derive(Debug, Clone)]
struct NodeEntry {
    position: Point,
    control_state: ControlState,
}

/// In-memory topology snapshot.
///
/// Links are never removed, so a `LinkId` stays valid for the lifetime of the
/// snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticTopology {
    nodes: HashMap<EndpointId, NodeEntry>,
    links: Vec<Link>,
    paths: HashMap<EndpointId, ControlPath>,
}

impl StaticTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a node. Nodes must exist before links can reach them.
    pub fn add_node(&mut self, id: EndpointId, position: Point, control_state: ControlState) {
        self.nodes.insert(id, NodeEntry { position, control_state });
    }

    /// Change the command capability of a known node.
    pub fn set_control_state(&mut self, id: EndpointId, control_state: ControlState) -> Result<(), TopologyError> {
        let node = self.nodes.get_mut(&id).ok_or(TopologyError::UnknownNode(id))?;
        node.control_state = control_state;
        Ok(())
    }

    /// Add a link between two known nodes.
    ///
    /// Strengths are clamped into `[0, 1]`, NaN becomes 0.
    ///
    /// # Parameters
    ///
    /// * `a`, `b` - Ends of the link
    /// * `strength_ab` - Strength when traversed from `a` to `b`
    /// * `strength_ba` - Strength when traversed from `b` to `a`
    ///
    /// # Returns
    ///
    /// The id of the new link, which is its index in `links()`.
    pub fn add_link(&mut self, a: EndpointId, b: EndpointId, strength_ab: f64, strength_ba: f64) -> Result<LinkId, TopologyError> {
        for node in [a, b] {
            if !self.nodes.contains_key(&node) {
                return Err(TopologyError::UnknownNode(node));
            }
        }
        let id = self.links.len();
        self.links.push(Link {
            id,
            a,
            b,
            strength_ab: clamp_strength(strength_ab),
            strength_ba: clamp_strength(strength_ba),
        });
        Ok(id)
    }

    /// Set the control path of `node` from link ids ordered node-to-root.
    ///
    /// Each link must continue from where the previous one ended.
    pub fn set_control_path(&mut self, node: EndpointId, links: &[LinkId]) -> Result<(), TopologyError> {
        if !self.nodes.contains_key(&node) {
            return Err(TopologyError::UnknownNode(node));
        }
        let mut hops = Vec::with_capacity(links.len());
        let mut current = node;
        for &id in links {
            let link = self.links.get(id).ok_or(TopologyError::UnknownLink(id))?;
            let next = link.other(current).ok_or(TopologyError::BrokenPath { link: id, node: current })?;
            hops.push(PathHop { link: id, from: current });
            current = next;
        }
        self.paths.insert(node, ControlPath::new(hops));
        Ok(())
    }

    /// Drop the control path, as when `node` loses its route to a root.
    pub fn clear_control_path(&mut self, node: EndpointId) {
        self.paths.remove(&node);
    }
}

impl Topology for StaticTopology {
    fn links(&self) -> &[Link] {
        &self.links
    }

    fn is_connected(&self, node: EndpointId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn control_path(&self, node: EndpointId) -> Option<&ControlPath> {
        self.paths.get(&node)
    }

    fn control_state(&self, node: EndpointId) -> ControlState {
        self.nodes.get(&node).map(|n| n.control_state).unwrap_or(ControlState::Uncontrollable)
    }

    fn position(&self, node: EndpointId) -> Option<Point> {
        self.nodes.get(&node).map(|n| n.position)
    }
}

fn clamp_strength(strength: f64) -> f64 {
    if strength.is_nan() { 0.0 } else { strength.clamp(0.0, 1.0) }
}
