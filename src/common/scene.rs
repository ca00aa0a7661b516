//! Scene loading, parsing, and validation logic.
//!
//! A scene file is a JSON snapshot of everything the overlay reads from its
//! collaborators: persisted constellations, endpoints with their memberships
//! and positions, links with direction-aware strengths, control paths and the
//! range model in use.

use anyhow::Context;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;

use super::settings::OverlaySettings;
use crate::constellation::{Constellation, ConstellationRegistry, Endpoint, EndpointId, EndpointKind, EndpointStore, Frequency, MembershipCascade};
use crate::overlay::topology::{ControlState, LinkId, Point, StaticTopology};
use crate::signal::ConfiguredRangeModel;

/// Error type for scene loading failures.
#[derive(Debug)]
pub enum SceneLoadError {
    FileReadError(String),
    ParseError(String),
    ValidationError(String),
}

impl std::fmt::Display for SceneLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneLoadError::FileReadError(msg) => write!(f, "Failed to read file: {}", msg),
            SceneLoadError::ParseError(msg) => write!(f, "Failed to parse JSON: {}", msg),
            SceneLoadError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for SceneLoadError {}

/// Endpoint record with its map position and control state.
#[derive(Deserialize, Clone)]
pub struct SceneEndpoint {
    pub id: EndpointId,
    pub name: String,
    #[serde(default)]
    pub kind: EndpointKind,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub launch_time: f64,
    #[serde(default)]
    pub frequencies: BTreeSet<Frequency>,
    /// Transmit power per frequency.
    #[serde(default)]
    pub comm_power: BTreeMap<Frequency, f64>,
    pub position: Point,
    #[serde(default)]
    pub control_state: ControlState,
}

impl SceneEndpoint {
    fn to_endpoint(&self) -> Endpoint {
        Endpoint {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            body: self.body.clone(),
            launch_time: self.launch_time,
            frequencies: self.frequencies.clone(),
            comm_power: self.comm_power.clone(),
        }
    }
}

/// Physical link between two endpoints.
#[derive(Deserialize, Clone)]
pub struct SceneLink {
    pub a: EndpointId,
    pub b: EndpointId,
    /// Strength from `a` to `b`.
    pub strength_ab: f64,
    /// Strength from `b` to `a`, same as `strength_ab` when omitted.
    #[serde(default)]
    pub strength_ba: Option<f64>,
}

/// Control path of `node`, as link indices ordered node-to-root.
#[derive(Deserialize, Clone)]
pub struct SceneControlPath {
    pub node: EndpointId,
    pub links: Vec<LinkId>,
}

/// Root structure representing the entire scene.
#[derive(Deserialize)]
pub struct Scene {
    /// Top-left corner of the world coordinate system.
    pub world_top_left: Point,
    /// Bottom-right corner of the world coordinate system.
    pub world_bottom_right: Point,
    /// Width of the world in meters.
    pub width: f64,
    /// Height of the world in meters.
    pub height: f64,
    #[serde(default)]
    pub range_model: ConfiguredRangeModel,
    /// Persisted channels. The public channel is always present, a record on
    /// its frequency only overrides name and colour.
    #[serde(default)]
    pub constellations: Vec<Constellation>,
    pub endpoints: Vec<SceneEndpoint>,
    #[serde(default)]
    pub links: Vec<SceneLink>,
    #[serde(default)]
    pub control_paths: Vec<SceneControlPath>,
}

/// Everything the viewer needs after a scene was loaded.
pub struct LoadedScene {
    pub registry: ConstellationRegistry,
    pub endpoints: EndpointStore,
    pub topology: StaticTopology,
    pub range_model: ConfiguredRangeModel,
    pub world_top_left: Point,
    pub world_bottom_right: Point,
    pub width: f64,
    pub height: f64,
}

/// Load, parse and validate a scene from a file.
pub fn load_scene(path: &str) -> Result<Scene, SceneLoadError> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path))
        .map_err(|e| SceneLoadError::FileReadError(e.to_string()))?;
    parse_scene(&data)
}

pub fn parse_scene(data: &str) -> Result<Scene, SceneLoadError> {
    let scene: Scene = serde_json::from_str(data)
        .context("Invalid JSON format")
        .map_err(|e| SceneLoadError::ParseError(e.to_string()))?;
    validate_scene(&scene).map_err(SceneLoadError::ValidationError)?;
    Ok(scene)
}

/// Validate scene contents.
///
/// # Returns
///
/// `Ok(())` if validation passes, `Err(String)` with error description otherwise.
pub fn validate_scene(scene: &Scene) -> Result<(), String> {
    const MAX_ENDPOINTS: usize = 10000;

    if scene.width <= 0.0 || scene.height <= 0.0 {
        return Err(format!("World size {}x{} must be positive", scene.width, scene.height));
    }
    if scene.world_top_left.x == scene.world_bottom_right.x || scene.world_top_left.y == scene.world_bottom_right.y {
        return Err("World corners must span a non-empty area".to_string());
    }

    if scene.endpoints.is_empty() {
        return Err("Scene must contain at least one endpoint".to_string());
    }
    if scene.endpoints.len() > MAX_ENDPOINTS {
        return Err(format!("Endpoint count {} exceeds maximum of {}", scene.endpoints.len(), MAX_ENDPOINTS));
    }

    let mut endpoint_ids = HashSet::new();
    for endpoint in &scene.endpoints {
        if !endpoint_ids.insert(endpoint.id) {
            return Err(format!("Duplicate endpoint id found: {}", endpoint.id));
        }
        for (frequency, power) in &endpoint.comm_power {
            if !power.is_finite() || *power < 0.0 {
                return Err(format!(
                    "Endpoint {} has invalid power {} on frequency {}",
                    endpoint.id, power, frequency
                ));
            }
        }
    }

    let mut frequencies = HashSet::new();
    for constellation in &scene.constellations {
        if !frequencies.insert(constellation.frequency) {
            return Err(format!("Duplicate constellation frequency found: {}", constellation.frequency));
        }
    }

    for (idx, link) in scene.links.iter().enumerate() {
        for node in [link.a, link.b] {
            if !endpoint_ids.contains(&node) {
                return Err(format!("Link {} references unknown endpoint {}", idx, node));
            }
        }
        if link.a == link.b {
            return Err(format!("Link {} connects endpoint {} to itself", idx, link.a));
        }
        for strength in [Some(link.strength_ab), link.strength_ba].into_iter().flatten() {
            if !(0.0..=1.0).contains(&strength) {
                return Err(format!("Link {} strength {} outside 0-1", idx, strength));
            }
        }
    }

    let mut path_nodes = HashSet::new();
    for path in &scene.control_paths {
        if !path_nodes.insert(path.node) {
            return Err(format!("Duplicate control path for endpoint {}", path.node));
        }
    }

    Ok(())
}

impl Scene {
    /// Build the registry, endpoint store and topology described by the scene.
    ///
    /// Memberships that still point at channels missing from the scene are
    /// moved to the public channel.
    pub fn into_loaded(self, settings: &OverlaySettings) -> Result<LoadedScene, SceneLoadError> {
        let registry = ConstellationRegistry::from_records(settings, &self.constellations)
            .map_err(|e| SceneLoadError::ValidationError(format!("Constellations: {}", e)))?;

        let mut endpoints = EndpointStore::new();
        let mut topology = StaticTopology::new();
        for endpoint in &self.endpoints {
            endpoints.insert(endpoint.to_endpoint());
            topology.add_node(endpoint.id, endpoint.position, endpoint.control_state);
        }

        let report = MembershipCascade::reconcile(&registry, &mut endpoints);
        if !report.reassigned.is_empty() {
            log::warn!("{} endpoints referenced missing constellations", report.reassigned.len());
        }

        for link in &self.links {
            topology
                .add_link(link.a, link.b, link.strength_ab, link.strength_ba.unwrap_or(link.strength_ab))
                .map_err(|e| SceneLoadError::ValidationError(e.to_string()))?;
        }
        for path in &self.control_paths {
            topology
                .set_control_path(path.node, &path.links)
                .map_err(|e| SceneLoadError::ValidationError(format!("Control path of {}: {}", path.node, e)))?;
        }

        log::info!(
            "Scene loaded: {} constellations, {} endpoints, {} links",
            registry.len(),
            endpoints.len(),
            self.links.len()
        );

        Ok(LoadedScene {
            registry,
            endpoints,
            topology,
            range_model: self.range_model,
            world_top_left: self.world_top_left,
            world_bottom_right: self.world_bottom_right,
            width: self.width,
            height: self.height,
        })
    }
}
