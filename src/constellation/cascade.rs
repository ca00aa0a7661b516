//! Keeps endpoint memberships consistent with the registry.
//!
//! Every registry operation that may leave an endpoint pointing at a missing
//! channel has a counterpart here. The registry operation and its cascade must
//! both complete before the next frame resolves link colours; the `apply_*`
//! helpers perform the pair in one call for callers that do not need to
//! interleave anything.
//!
//! Instead of a subscriber list, every operation returns the `RefreshNotice`s
//! a presentation layer needs to redraw its rows.

use egui::Color32;

use super::endpoints::EndpointStore;
use super::registry::{ConstellationRegistry, RegistryError};
use super::types::{EndpointId, Frequency};

/// What a listing must refresh after a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshNotice {
    /// The row of this constellation changed (name, colour, member count).
    Constellation(Frequency),
    /// This constellation's row must be removed.
    ConstellationRemoved(Frequency),
    /// The membership label of this endpoint changed.
    Endpoint(EndpointId),
}

/// Outcome of a cascade pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// Endpoints whose frequency set was rewritten.
    pub reassigned: Vec<EndpointId>,
    pub notices: Vec<RefreshNotice>,
}

pub struct MembershipCascade;

impl MembershipCascade {
    /// Replace `frequency` with the public frequency in every listed endpoint.
    ///
    /// Idempotent: an endpoint that no longer holds `frequency` is left alone,
    /// and the public frequency is never duplicated.
    pub fn on_channel_deleted(frequency: Frequency, affected: &[EndpointId], public: Frequency, endpoints: &mut EndpointStore) -> CascadeReport {
        let mut report = Self::replace_in(frequency, public, affected, endpoints);
        report.notices.push(RefreshNotice::ConstellationRemoved(frequency));
        if !report.reassigned.is_empty() {
            report.notices.push(RefreshNotice::Constellation(public));
        }
        report
    }

    /// Move members of `old` onto `new` after a retune.
    pub fn on_channel_retuned(old: Frequency, new: Frequency, affected: &[EndpointId], endpoints: &mut EndpointStore) -> CascadeReport {
        let mut report = Self::replace_in(old, new, affected, endpoints);
        report.notices.push(RefreshNotice::ConstellationRemoved(old));
        report.notices.push(RefreshNotice::Constellation(new));
        report
    }

    /// Metadata only change (rename, recolour, reset): memberships stay, but
    /// the channel row and the labels of its members need a redraw.
    pub fn on_channel_metadata_changed(frequency: Frequency, endpoints: &EndpointStore) -> CascadeReport {
        let mut notices = vec![RefreshNotice::Constellation(frequency)];
        notices.extend(endpoints.members_of(frequency).into_iter().map(RefreshNotice::Endpoint));
        CascadeReport {
            reassigned: Vec::new(),
            notices,
        }
    }

    /// Replace every frequency without a registry entry by the public one.
    ///
    /// Used after loading persisted endpoints, whose sets may still name a
    /// channel deleted in the meantime.
    pub fn reconcile(registry: &ConstellationRegistry, endpoints: &mut EndpointStore) -> CascadeReport {
        let public = registry.public_frequency();
        let mut report = CascadeReport::default();
        for endpoint in endpoints.iter_mut() {
            let dangling: Vec<Frequency> = endpoint.frequencies.iter().copied().filter(|f| !registry.contains(*f)).collect();
            if dangling.is_empty() {
                continue;
            }
            for frequency in dangling {
                log::warn!(
                    "Endpoint {} referenced missing frequency {}, moved to public frequency {}",
                    endpoint.id,
                    frequency,
                    public
                );
                endpoint.replace_frequency(frequency, public);
            }
            report.reassigned.push(endpoint.id);
            report.notices.push(RefreshNotice::Endpoint(endpoint.id));
        }
        if !report.reassigned.is_empty() {
            report.notices.push(RefreshNotice::Constellation(public));
        }
        report
    }

    /// Delete a channel and migrate its members in one step.
    pub fn apply_delete(frequency: Frequency, registry: &mut ConstellationRegistry, endpoints: &mut EndpointStore) -> Result<CascadeReport, RegistryError> {
        registry.delete(frequency)?;
        let affected = endpoints.members_of(frequency);
        Ok(Self::on_channel_deleted(frequency, &affected, registry.public_frequency(), endpoints))
    }

    /// Retune a channel and move its members in one step.
    pub fn apply_retune(
        frequency: Frequency,
        new_frequency: Frequency,
        registry: &mut ConstellationRegistry,
        endpoints: &mut EndpointStore,
    ) -> Result<CascadeReport, RegistryError> {
        registry.retune(frequency, new_frequency)?;
        if frequency == new_frequency {
            return Ok(CascadeReport::default());
        }
        let affected = endpoints.members_of(frequency);
        Ok(Self::on_channel_retuned(frequency, new_frequency, &affected, endpoints))
    }

    /// Rename and retune a channel in one step, then move its members.
    ///
    /// A rejected name or target frequency leaves registry and endpoints
    /// unchanged.
    pub fn apply_edit(
        frequency: Frequency,
        name: &str,
        new_frequency: Frequency,
        registry: &mut ConstellationRegistry,
        endpoints: &mut EndpointStore,
    ) -> Result<CascadeReport, RegistryError> {
        registry.edit(frequency, name, new_frequency)?;
        if frequency == new_frequency {
            return Ok(Self::on_channel_metadata_changed(frequency, endpoints));
        }
        let affected = endpoints.members_of(frequency);
        Ok(Self::on_channel_retuned(frequency, new_frequency, &affected, endpoints))
    }

    pub fn apply_recolor(frequency: Frequency, color: Color32, registry: &mut ConstellationRegistry, endpoints: &EndpointStore) -> Result<CascadeReport, RegistryError> {
        registry.recolor(frequency, color)?;
        Ok(Self::on_channel_metadata_changed(frequency, endpoints))
    }

    pub fn apply_reset_public(registry: &mut ConstellationRegistry, endpoints: &EndpointStore) -> CascadeReport {
        registry.reset_public();
        Self::on_channel_metadata_changed(registry.public_frequency(), endpoints)
    }

    fn replace_in(from: Frequency, to: Frequency, affected: &[EndpointId], endpoints: &mut EndpointStore) -> CascadeReport {
        let mut report = CascadeReport::default();
        for id in affected {
            let Some(endpoint) = endpoints.get_mut(*id) else {
                log::debug!("Endpoint {} vanished before cascade, skipped", id);
                continue;
            };
            if endpoint.replace_frequency(from, to) {
                log::debug!("Endpoint {} moved from frequency {} to {}", id, from, to);
                report.reassigned.push(*id);
                report.notices.push(RefreshNotice::Endpoint(*id));
            }
        }
        report
    }
}
