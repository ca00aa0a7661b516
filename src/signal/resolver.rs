//! Governing channel of a physical link.
//!
//! Two endpoints may share several channels over the same link. The channel
//! that reaches furthest under the active range model governs how the link
//! is drawn:
//!
//! 1. `common = A.frequencies ∩ B.frequencies`, ignoring frequencies that
//!    have no registry entry
//! 2. empty `common` means "no channel" (neutral colour)
//! 3. every candidate is scored with `maximum_range(A.power(f), B.power(f))`
//! 4. the strictly greatest range wins; on ties the lowest frequency keeps it
//!
//! Candidates are visited in ascending frequency order and the endpoint with
//! the lower id is always passed to the range model first, so
//! `resolve(A, B) == resolve(B, A)` holds for any range model.

use egui::Color32;

use super::range_model::RangeModel;
use crate::constellation::{ConstellationRegistry, EndpointId, EndpointStore, Frequency};

pub struct LinkColorResolver<'a> {
    registry: &'a ConstellationRegistry,
    endpoints: &'a EndpointStore,
    range_model: &'a dyn RangeModel,
}

impl<'a> LinkColorResolver<'a> {
    pub fn new(registry: &'a ConstellationRegistry, endpoints: &'a EndpointStore, range_model: &'a dyn RangeModel) -> Self {
        Self {
            registry,
            endpoints,
            range_model,
        }
    }

    /// Governing frequency between `a` and `b`, `None` when they share none.
    ///
    /// Unknown endpoints are treated as blind.
    pub fn resolve_frequency(&self, a: EndpointId, b: EndpointId) -> Option<Frequency> {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        let first = self.endpoints.get(first)?;
        let second = self.endpoints.get(second)?;

        let mut strongest: Option<(Frequency, f64)> = None;
        for &frequency in first.frequencies.intersection(&second.frequencies) {
            if !self.registry.contains(frequency) {
                continue;
            }
            let range = self
                .range_model
                .maximum_range(first.comm_power(frequency), second.comm_power(frequency));
            let range = if range.is_nan() { f64::NEG_INFINITY } else { range };
            if strongest.map_or(true, |(_, longest)| range > longest) {
                strongest = Some((frequency, range));
            }
        }
        strongest.map(|(frequency, _)| frequency)
    }

    /// Base colour of the link between `a` and `b`.
    pub fn resolve(&self, a: EndpointId, b: EndpointId) -> Color32 {
        self.registry.resolve_color(self.resolve_frequency(a, b))
    }

    /// Icon colour of an endpoint: its strongest frequency's colour, or the
    /// no-channel colour when it is blind.
    pub fn endpoint_color(&self, id: EndpointId) -> Color32 {
        let strongest = self.endpoints.get(id).and_then(|e| {
            e.frequencies
                .iter()
                .copied()
                .filter(|f| self.registry.contains(*f))
                .fold(None, |best: Option<(Frequency, f64)>, f| {
                    let power = e.comm_power(f);
                    match best {
                        Some((_, best_power)) if power <= best_power => best,
                        _ => Some((f, power)),
                    }
                })
                .map(|(f, _)| f)
        });
        self.registry.resolve_color(strongest)
    }

    /// Icon colours for the endpoints visible this frame.
    pub fn icon_colors(&self, visible: &[EndpointId]) -> Vec<(EndpointId, Color32)> {
        visible.iter().map(|id| (*id, self.endpoint_color(*id))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::settings::OverlaySettings;
    use crate::constellation::{Endpoint, MembershipCascade};
    use crate::signal::range_model::{ScaledMinRangeModel, StandardRangeModel};

    const RED: Color32 = Color32::from_rgb(255, 0, 0);
    const GREEN: Color32 = Color32::from_rgb(0, 255, 0);
    const BLUE: Color32 = Color32::from_rgb(0, 0, 255);

    fn settings() -> OverlaySettings {
        OverlaySettings {
            public_frequency: 1,
            ..OverlaySettings::default()
        }
    }

    fn endpoint(id: EndpointId, freqs: &[(Frequency, f64)]) -> Endpoint {
        let mut e = Endpoint::new(id, format!("E{id}"));
        for &(f, p) in freqs {
            e.frequencies.insert(f);
            e.comm_power.insert(f, p);
        }
        e
    }

    /// Channels 99 "Red", plus the public channel 1.
    fn scenario() -> (ConstellationRegistry, EndpointStore) {
        let mut registry = ConstellationRegistry::new(&settings());
        registry.create_with_frequency(99, "Red", RED).unwrap();
        let mut store = EndpointStore::new();
        store.insert(endpoint(1, &[(99, 50.0)]));
        store.insert(endpoint(2, &[(1, 10.0), (99, 30.0)]));
        (registry, store)
    }

    #[test]
    fn only_common_channel_governs_regardless_of_range() {
        let (registry, store) = scenario();
        let model = ScaledMinRangeModel { factor: 3.0 };
        let resolver = LinkColorResolver::new(&registry, &store, &model);
        assert_eq!(resolver.resolve_frequency(1, 2), Some(99));
        assert_eq!(resolver.resolve(1, 2), RED);

        let tiny = ScaledMinRangeModel { factor: 0.0 };
        let resolver = LinkColorResolver::new(&registry, &store, &tiny);
        assert_eq!(resolver.resolve(1, 2), RED);
    }

    #[test]
    fn no_common_channel_yields_neutral_color() {
        let (registry, mut store) = scenario();
        store.insert(endpoint(3, &[(1, 10.0)]));
        store.insert(endpoint(4, &[]));
        let resolver = LinkColorResolver::new(&registry, &store, &StandardRangeModel);
        let grey = registry.no_channel_color();
        assert_eq!(resolver.resolve(1, 3), grey);
        assert_eq!(resolver.resolve(4, 2), grey);
        assert_eq!(resolver.resolve(4, 4), grey);
        assert_eq!(resolver.resolve(1, 777), grey);
    }

    #[test]
    fn strongest_range_wins_in_any_position() {
        // ranges 10, 25, 18 rotated over three frequencies
        let arrangements = [[10.0, 25.0, 18.0], [25.0, 18.0, 10.0], [18.0, 10.0, 25.0]];
        for powers in arrangements {
            let mut registry = ConstellationRegistry::new(&settings());
            registry.create_with_frequency(5, "Five", RED).unwrap();
            registry.create_with_frequency(6, "Six", GREEN).unwrap();
            registry.create_with_frequency(7, "Seven", BLUE).unwrap();
            let freqs = [5, 6, 7];
            let mut store = EndpointStore::new();
            let pairs: Vec<(Frequency, f64)> = freqs.iter().copied().zip(powers).collect();
            store.insert(endpoint(1, &pairs));
            store.insert(endpoint(2, &[(5, 100.0), (6, 100.0), (7, 100.0)]));
            let model = ScaledMinRangeModel { factor: 1.0 };
            let resolver = LinkColorResolver::new(&registry, &store, &model);
            let expected = freqs[powers.iter().position(|p| *p == 25.0).unwrap()];
            assert_eq!(resolver.resolve_frequency(1, 2), Some(expected));
        }
    }

    #[test]
    fn equal_ranges_keep_lowest_frequency() {
        let mut registry = ConstellationRegistry::new(&settings());
        registry.create_with_frequency(40, "Forty", GREEN).unwrap();
        registry.create_with_frequency(20, "Twenty", BLUE).unwrap();
        let mut store = EndpointStore::new();
        store.insert(endpoint(1, &[(40, 9.0), (20, 9.0)]));
        store.insert(endpoint(2, &[(20, 9.0), (40, 9.0)]));
        let resolver = LinkColorResolver::new(&registry, &store, &StandardRangeModel);
        assert_eq!(resolver.resolve_frequency(1, 2), Some(20));
        assert_eq!(resolver.resolve_frequency(2, 1), Some(20));
    }

    struct Lopsided;

    impl RangeModel for Lopsided {
        fn maximum_range(&self, power_a: f64, power_b: f64) -> f64 {
            power_a * 10.0 + power_b
        }
    }

    #[test]
    fn resolution_is_commutative_even_for_asymmetric_models() {
        let mut registry = ConstellationRegistry::new(&settings());
        registry.create_with_frequency(5, "Five", RED).unwrap();
        registry.create_with_frequency(6, "Six", GREEN).unwrap();
        let mut store = EndpointStore::new();
        store.insert(endpoint(1, &[(5, 1.0), (6, 2.0)]));
        store.insert(endpoint(2, &[(5, 30.0), (6, 1.0)]));
        store.insert(endpoint(3, &[(5, 3.0)]));
        let resolver = LinkColorResolver::new(&registry, &store, &Lopsided);
        for a in 1..=3 {
            for b in 1..=3 {
                assert_eq!(resolver.resolve(a, b), resolver.resolve(b, a));
            }
        }
    }

    #[test]
    fn dangling_frequency_is_ignored() {
        let (mut registry, store) = scenario();
        // deleted without running the cascade
        registry.delete(99).unwrap();
        let resolver = LinkColorResolver::new(&registry, &store, &StandardRangeModel);
        assert_eq!(resolver.resolve_frequency(1, 2), None);
        assert_eq!(resolver.endpoint_color(1), registry.no_channel_color());
    }

    #[test]
    fn after_delete_cascade_both_share_public() {
        let (mut registry, mut store) = scenario();
        MembershipCascade::apply_delete(99, &mut registry, &mut store).unwrap();
        let resolver = LinkColorResolver::new(&registry, &store, &StandardRangeModel);
        assert_eq!(resolver.resolve_frequency(1, 2), Some(1));
        assert_eq!(resolver.resolve(1, 2), registry.resolve_color(Some(1)));
    }

    #[test]
    fn icon_colors_follow_strongest_frequency() {
        let (registry, mut store) = scenario();
        store.insert(endpoint(3, &[]));
        let resolver = LinkColorResolver::new(&registry, &store, &StandardRangeModel);
        let colors = resolver.icon_colors(&[1, 2, 3]);
        assert_eq!(colors[0], (1, RED));
        assert_eq!(colors[1], (2, RED));
        assert_eq!(colors[2], (3, registry.no_channel_color()));
    }
}
