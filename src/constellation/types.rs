//! Core data types for channels and the endpoints that join them.

use egui::Color32;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::common::color::hex_color;

/// Channel identifier. Unique key of a constellation.
pub type Frequency = u16;

/// Endpoint identifier assigned by the external simulation.
pub type EndpointId = u32;

/// A named, coloured logical network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constellation {
    pub frequency: Frequency,
    pub name: String,
    #[serde(with = "hex_color")]
    pub color: Color32,
}

/// Vessel or ground station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    #[default]
    Vessel,
    GroundStation,
}

/// A participant of the topology together with its channel memberships.
///
/// `frequencies` is a set: order is irrelevant and duplicates cannot occur.
/// `comm_power` holds the externally supplied transmit power per frequency;
/// a frequency without an entry transmits with zero power.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: EndpointId,
    pub name: String,
    #[serde(default)]
    pub kind: EndpointKind,
    /// Celestial body the endpoint orbits or sits on.
    #[serde(default)]
    pub body: String,
    /// Launch order, lower launched earlier.
    #[serde(default)]
    pub launch_time: f64,
    #[serde(default)]
    pub frequencies: BTreeSet<Frequency>,
    #[serde(default)]
    pub comm_power: BTreeMap<Frequency, f64>,
}

impl Endpoint {
    pub fn new(id: EndpointId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: EndpointKind::Vessel,
            body: String::new(),
            launch_time: 0.0,
            frequencies: BTreeSet::new(),
            comm_power: BTreeMap::new(),
        }
    }

    /// Transmit power on `frequency`, zero when none is recorded.
    pub fn comm_power(&self, frequency: Frequency) -> f64 {
        self.comm_power.get(&frequency).copied().unwrap_or(0.0)
    }

    /// An endpoint with no frequency cannot talk to anyone.
    pub fn is_blind(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Frequency with the greatest comm power, ties going to the lowest frequency.
    pub fn strongest_frequency(&self) -> Option<Frequency> {
        let mut best: Option<(Frequency, f64)> = None;
        for &frequency in &self.frequencies {
            let power = self.comm_power(frequency);
            if best.map_or(true, |(_, best_power)| power > best_power) {
                best = Some((frequency, power));
            }
        }
        best.map(|(frequency, _)| frequency)
    }

    /// Replace every occurrence of `from` by `to`. Returns `true` if the set changed.
    ///
    /// The comm power recorded for `from` carries over to `to` unless `to`
    /// already had a value of its own.
    pub fn replace_frequency(&mut self, from: Frequency, to: Frequency) -> bool {
        if from == to || !self.frequencies.remove(&from) {
            return false;
        }
        self.frequencies.insert(to);
        if let Some(power) = self.comm_power.remove(&from) {
            self.comm_power.entry(to).or_insert(power);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(freqs: &[(Frequency, f64)]) -> Endpoint {
        let mut e = Endpoint::new(1, "probe");
        for &(f, p) in freqs {
            e.frequencies.insert(f);
            e.comm_power.insert(f, p);
        }
        e
    }

    #[test]
    fn strongest_frequency_picks_highest_power() {
        let e = endpoint(&[(1, 10.0), (5, 40.0), (9, 20.0)]);
        assert_eq!(e.strongest_frequency(), Some(5));
    }

    #[test]
    fn strongest_frequency_ties_go_to_lowest_frequency() {
        let e = endpoint(&[(7, 30.0), (3, 30.0)]);
        assert_eq!(e.strongest_frequency(), Some(3));
    }

    #[test]
    fn blind_endpoint_has_no_strongest_frequency() {
        let e = endpoint(&[]);
        assert!(e.is_blind());
        assert_eq!(e.strongest_frequency(), None);
    }

    #[test]
    fn replace_frequency_merges_into_existing_member() {
        let mut e = endpoint(&[(0, 5.0), (99, 30.0)]);
        assert!(e.replace_frequency(99, 0));
        assert_eq!(e.frequencies.iter().copied().collect::<Vec<_>>(), vec![0]);
        assert_eq!(e.comm_power(0), 5.0);
        assert!(!e.replace_frequency(99, 0));
    }
}
