//! Endpoints addressable by id, with their memberships stored alongside.
//!
//! The store is the only place endpoint frequency sets are mutated. Adding a
//! frequency checks it against the registry so that no set references a
//! channel that does not exist.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;

use super::registry::ConstellationRegistry;
use super::types::{Endpoint, EndpointId, Frequency};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("no endpoint with id {0}")]
    NotFound(EndpointId),
    #[error("frequency {0} has no constellation")]
    UnknownFrequency(Frequency),
}

/// Sort orders for endpoint listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndpointSort {
    #[default]
    LaunchTime,
    StrongestFrequency,
    Name,
    Body,
}

/// Every endpoint of the scene, keyed and iterated by id.
#[derive(Debug, Clone, Default)]
pub struct EndpointStore {
    endpoints: BTreeMap<EndpointId, Endpoint>,
}

impl EndpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an endpoint, replacing any endpoint with the same id.
    pub fn insert(&mut self, endpoint: Endpoint) {
        self.endpoints.insert(endpoint.id, endpoint);
    }

    pub fn get(&self, id: EndpointId) -> Option<&Endpoint> {
        self.endpoints.get(&id)
    }

    pub fn get_mut(&mut self, id: EndpointId) -> Option<&mut Endpoint> {
        self.endpoints.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Endpoints in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Endpoint> {
        self.endpoints.values_mut()
    }

    /// Make an endpoint a member of a channel.
    ///
    /// # Parameters
    ///
    /// * `id` - Endpoint joining the channel
    /// * `frequency` - Channel to join, must exist in `registry`
    /// * `registry` - Registry the frequency is checked against
    ///
    /// # Returns
    ///
    /// `Ok(false)` when the endpoint already was a member. `UnknownFrequency`
    /// when the registry has no such channel, `NotFound` for an unknown
    /// endpoint. Nothing changes on error.
    pub fn add_frequency(&mut self, id: EndpointId, frequency: Frequency, registry: &ConstellationRegistry) -> Result<bool, EndpointError> {
        if !registry.contains(frequency) {
            return Err(EndpointError::UnknownFrequency(frequency));
        }
        let endpoint = self.endpoints.get_mut(&id).ok_or(EndpointError::NotFound(id))?;
        Ok(endpoint.frequencies.insert(frequency))
    }

    /// Leave `frequency`. Returns `false` when the endpoint was not a member,
    /// `NotFound` for an unknown endpoint.
    ///
    /// The comm power stays recorded so that rejoining restores it.
    pub fn remove_frequency(&mut self, id: EndpointId, frequency: Frequency) -> Result<bool, EndpointError> {
        let endpoint = self.endpoints.get_mut(&id).ok_or(EndpointError::NotFound(id))?;
        Ok(endpoint.frequencies.remove(&frequency))
    }

    /// Record the externally computed transmit power on a frequency.
    ///
    /// Negative powers are stored as zero. Fails with `NotFound` for an
    /// unknown endpoint.
    pub fn set_comm_power(&mut self, id: EndpointId, frequency: Frequency, power: f64) -> Result<(), EndpointError> {
        let endpoint = self.endpoints.get_mut(&id).ok_or(EndpointError::NotFound(id))?;
        endpoint.comm_power.insert(frequency, power.max(0.0));
        Ok(())
    }

    /// Ids of every endpoint that is a member of `frequency`.
    pub fn members_of(&self, frequency: Frequency) -> Vec<EndpointId> {
        self.endpoints
            .values()
            .filter(|e| e.frequencies.contains(&frequency))
            .map(|e| e.id)
            .collect()
    }

    /// Number of endpoints on `frequency`, shown in the constellation table.
    pub fn count_members(&self, frequency: Frequency) -> usize {
        self.endpoints.values().filter(|e| e.frequencies.contains(&frequency)).count()
    }

    /// Endpoints in the requested listing order. Ties keep id order.
    pub fn sorted(&self, sort: EndpointSort) -> Vec<&Endpoint> {
        let mut list: Vec<&Endpoint> = self.endpoints.values().collect();
        match sort {
            EndpointSort::LaunchTime => list.sort_by(|a, b| a.launch_time.partial_cmp(&b.launch_time).unwrap_or(Ordering::Equal)),
            // blind endpoints go first
            EndpointSort::StrongestFrequency => list.sort_by_key(|e| e.strongest_frequency()),
            EndpointSort::Name => list.sort_by(|a, b| a.name.cmp(&b.name)),
            EndpointSort::Body => list.sort_by(|a, b| a.body.cmp(&b.body)),
        }
        list
    }
}

/// Human readable membership summary used by listings.
pub fn frequency_label(frequencies: impl IntoIterator<Item = Frequency>) -> String {
    let list: Vec<String> = frequencies.into_iter().map(|f| f.to_string()).collect();
    if list.is_empty() {
        return "No frequency assigned".to_string();
    }
    format!("Frequencies: {}", list.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::settings::OverlaySettings;
    use egui::Color32;

    fn setup() -> (ConstellationRegistry, EndpointStore) {
        let mut registry = ConstellationRegistry::new(&OverlaySettings::default());
        registry.create_with_frequency(99, "Red", Color32::RED).unwrap();
        let mut store = EndpointStore::new();
        let mut a = Endpoint::new(1, "Alpha");
        a.launch_time = 20.0;
        a.body = "Mun".into();
        let mut b = Endpoint::new(2, "Bravo");
        b.launch_time = 10.0;
        b.body = "Kerbin".into();
        store.insert(a);
        store.insert(b);
        (registry, store)
    }

    #[test]
    fn add_frequency_requires_existing_channel() {
        let (registry, mut store) = setup();
        assert_eq!(store.add_frequency(1, 5, &registry), Err(EndpointError::UnknownFrequency(5)));
        assert_eq!(store.add_frequency(1, 99, &registry), Ok(true));
        assert_eq!(store.add_frequency(1, 99, &registry), Ok(false));
        assert_eq!(store.add_frequency(7, 99, &registry), Err(EndpointError::NotFound(7)));
    }

    #[test]
    fn member_counting() {
        let (registry, mut store) = setup();
        store.add_frequency(1, 99, &registry).unwrap();
        store.add_frequency(2, 99, &registry).unwrap();
        store.remove_frequency(2, 99).unwrap();
        assert_eq!(store.count_members(99), 1);
        assert_eq!(store.members_of(99), vec![1]);
    }

    #[test]
    fn sorting_orders() {
        let (registry, mut store) = setup();
        store.add_frequency(1, 0, &registry).unwrap();
        let ids = |list: Vec<&Endpoint>| list.iter().map(|e| e.id).collect::<Vec<_>>();
        assert_eq!(ids(store.sorted(EndpointSort::LaunchTime)), vec![2, 1]);
        assert_eq!(ids(store.sorted(EndpointSort::Name)), vec![1, 2]);
        assert_eq!(ids(store.sorted(EndpointSort::Body)), vec![2, 1]);
        assert_eq!(ids(store.sorted(EndpointSort::StrongestFrequency)), vec![2, 1]);
    }

    #[test]
    fn labels() {
        assert_eq!(frequency_label(Vec::<Frequency>::new()), "No frequency assigned");
        assert_eq!(frequency_label([1, 99]), "Frequencies: 1, 99");
    }
}
