//! Registry of named, coloured channels.
//!
//! Name uniqueness policy: names are trimmed of surrounding whitespace before
//! they are stored, and two names collide when they are equal ignoring case
//! ("Red", " red " and "RED" are the same name). Empty names are rejected.
//!
//! The registry never touches endpoints. Operations that invalidate endpoint
//! memberships (`delete`, `retune`) report the affected frequency so the
//! caller can run the membership cascade before the next frame.

use egui::Color32;
use std::collections::BTreeMap;
use thiserror::Error;

use super::types::{Constellation, Frequency};
use crate::common::settings::OverlaySettings;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no constellation on frequency {0}")]
    NotFound(Frequency),
    #[error("the public constellation on frequency {0} cannot be deleted or retuned")]
    ProtectedChannel(Frequency),
    #[error("a constellation named '{0}' already exists")]
    DuplicateName(String),
    #[error("constellation name must not be empty")]
    InvalidName,
    #[error("frequency {0} is already used by another constellation")]
    FrequencyInUse(Frequency),
    #[error("frequency {0} is outside the allowed range")]
    FrequencyOutOfRange(Frequency),
    #[error("no free frequency left")]
    FrequenciesExhausted,
}

/// Owns the set of channels, keyed and iterated by frequency.
#[derive(Debug, Clone)]
pub struct ConstellationRegistry {
    constellations: BTreeMap<Frequency, Constellation>,
    public_frequency: Frequency,
    default_public_name: String,
    default_public_color: Color32,
    no_channel_color: Color32,
    max_frequency: Frequency,
}

impl ConstellationRegistry {
    /// Create a registry holding only the public channel.
    pub fn new(settings: &OverlaySettings) -> Self {
        let mut constellations = BTreeMap::new();
        constellations.insert(
            settings.public_frequency,
            Constellation {
                frequency: settings.public_frequency,
                name: settings.default_public_name.trim().to_string(),
                color: settings.default_public_color,
            },
        );
        Self {
            constellations,
            public_frequency: settings.public_frequency,
            default_public_name: settings.default_public_name.trim().to_string(),
            default_public_color: settings.default_public_color,
            no_channel_color: settings.no_channel_color,
            max_frequency: settings.max_frequency,
        }
    }

    /// Build a registry from persisted records.
    ///
    /// A record on the public frequency overrides the public channel's name and
    /// colour. Any other record that conflicts is rejected with the same errors
    /// as `create_with_frequency`.
    pub fn from_records(settings: &OverlaySettings, records: &[Constellation]) -> Result<Self, RegistryError> {
        let mut registry = Self::new(settings);
        for record in records {
            if record.frequency == registry.public_frequency {
                registry.rename(record.frequency, &record.name)?;
                registry.recolor(record.frequency, record.color)?;
            } else {
                registry.create_with_frequency(record.frequency, &record.name, record.color)?;
            }
        }
        Ok(registry)
    }

    /// Reserved frequency every endpoint falls back to.
    pub fn public_frequency(&self) -> Frequency {
        self.public_frequency
    }

    /// Neutral colour for links without a shared channel.
    pub fn no_channel_color(&self) -> Color32 {
        self.no_channel_color
    }

    pub fn len(&self) -> usize {
        self.constellations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constellations.is_empty()
    }

    pub fn contains(&self, frequency: Frequency) -> bool {
        self.constellations.contains_key(&frequency)
    }

    pub fn get(&self, frequency: Frequency) -> Option<&Constellation> {
        self.constellations.get(&frequency)
    }

    /// All channels in ascending frequency order.
    pub fn iter(&self) -> impl Iterator<Item = &Constellation> {
        self.constellations.values()
    }

    /// Allocate the lowest unused frequency and register a new channel on it.
    pub fn create(&mut self, name: &str, color: Color32) -> Result<Frequency, RegistryError> {
        let name = self.check_name(name, None)?;
        let frequency = self.next_free_frequency().ok_or(RegistryError::FrequenciesExhausted)?;
        self.insert(frequency, name, color);
        Ok(frequency)
    }

    /// Register a new channel on a caller-chosen frequency.
    pub fn create_with_frequency(&mut self, frequency: Frequency, name: &str, color: Color32) -> Result<Frequency, RegistryError> {
        if frequency > self.max_frequency {
            return Err(RegistryError::FrequencyOutOfRange(frequency));
        }
        if self.constellations.contains_key(&frequency) {
            return Err(RegistryError::FrequencyInUse(frequency));
        }
        let name = self.check_name(name, None)?;
        self.insert(frequency, name, color);
        Ok(frequency)
    }

    /// Give a channel a new name.
    ///
    /// # Parameters
    ///
    /// * `frequency` - Channel to rename, the public one included
    /// * `new_name` - Name to store after trimming
    ///
    /// # Returns
    ///
    /// `NotFound` for an unknown frequency, `InvalidName` for a blank name and
    /// `DuplicateName` when another channel already uses the name. The
    /// registry is unchanged on error.
    pub fn rename(&mut self, frequency: Frequency, new_name: &str) -> Result<(), RegistryError> {
        if !self.constellations.contains_key(&frequency) {
            return Err(RegistryError::NotFound(frequency));
        }
        let name = self.check_name(new_name, Some(frequency))?;
        if let Some(constellation) = self.constellations.get_mut(&frequency) {
            log::info!("Renamed constellation {} from '{}' to '{}'", frequency, constellation.name, name);
            constellation.name = name;
        }
        Ok(())
    }

    /// Change a channel's colour. Fails with `NotFound` for an unknown frequency.
    pub fn recolor(&mut self, frequency: Frequency, new_color: Color32) -> Result<(), RegistryError> {
        let constellation = self.constellations.get_mut(&frequency).ok_or(RegistryError::NotFound(frequency))?;
        constellation.color = new_color;
        log::info!("Recolored constellation {} to {}", frequency, new_color.to_hex());
        Ok(())
    }

    /// Restore the public channel's default name and colour.
    ///
    /// When another channel was renamed to the default name in the meantime,
    /// the public channel keeps its current name and only the colour is reset.
    pub fn reset_public(&mut self) {
        let public = self.public_frequency;
        let name = self.default_public_name.clone();
        // the default name may collide with a user channel renamed to it
        let duplicate = self
            .constellations
            .values()
            .any(|c| c.frequency != public && names_equal(&c.name, &name));
        if let Some(constellation) = self.constellations.get_mut(&public) {
            if duplicate {
                log::warn!("Default public name '{}' is taken, keeping '{}'", name, constellation.name);
            } else {
                constellation.name = name;
            }
            constellation.color = self.default_public_color;
        }
        log::info!("Reset public constellation on frequency {}", public);
    }

    /// Remove a channel. The caller must run the membership cascade for the
    /// returned constellation's frequency before resolving links again.
    pub fn delete(&mut self, frequency: Frequency) -> Result<Constellation, RegistryError> {
        if frequency == self.public_frequency {
            return Err(RegistryError::ProtectedChannel(frequency));
        }
        let removed = self.constellations.remove(&frequency).ok_or(RegistryError::NotFound(frequency))?;
        log::info!("Deleted constellation '{}' on frequency {}", removed.name, frequency);
        Ok(removed)
    }

    /// Move a non-public channel to a different frequency.
    ///
    /// Retuning onto the current frequency is a no-op.
    ///
    /// # Returns
    ///
    /// `ProtectedChannel` for the public channel, `NotFound` for an unknown
    /// frequency, `FrequencyOutOfRange` or `FrequencyInUse` for a bad target.
    pub fn retune(&mut self, frequency: Frequency, new_frequency: Frequency) -> Result<(), RegistryError> {
        self.check_retune(frequency, new_frequency)?;
        self.move_channel(frequency, new_frequency);
        Ok(())
    }

    /// Rename and retune a channel as one operation.
    ///
    /// Both the name and the target frequency are validated before anything
    /// changes, so a rejected edit leaves the registry untouched. Keeping the
    /// frequency is allowed for every channel, the public one included.
    ///
    /// # Parameters
    ///
    /// * `frequency` - Channel being edited
    /// * `new_name` - Name after the edit, trimmed like any other name
    /// * `new_frequency` - Frequency after the edit
    pub fn edit(&mut self, frequency: Frequency, new_name: &str, new_frequency: Frequency) -> Result<(), RegistryError> {
        if !self.constellations.contains_key(&frequency) {
            return Err(RegistryError::NotFound(frequency));
        }
        let name = self.check_name(new_name, Some(frequency))?;
        self.check_retune(frequency, new_frequency)?;
        if let Some(constellation) = self.constellations.get_mut(&frequency) {
            if constellation.name != name {
                log::info!("Renamed constellation {} from '{}' to '{}'", frequency, constellation.name, name);
                constellation.name = name;
            }
        }
        self.move_channel(frequency, new_frequency);
        Ok(())
    }

    /// Colour of a channel, or the no-channel colour for `None` and for
    /// frequencies without a registry entry.
    pub fn resolve_color(&self, frequency: Option<Frequency>) -> Color32 {
        frequency
            .and_then(|f| self.constellations.get(&f))
            .map(|c| c.color)
            .unwrap_or(self.no_channel_color)
    }

    /// Display name of a channel, `"?"` when unknown.
    pub fn name_of(&self, frequency: Frequency) -> &str {
        self.constellations.get(&frequency).map(|c| c.name.as_str()).unwrap_or("?")
    }

    fn insert(&mut self, frequency: Frequency, name: String, color: Color32) {
        log::info!("Created constellation '{}' on frequency {}", name, frequency);
        self.constellations.insert(frequency, Constellation { frequency, name, color });
    }

    fn check_retune(&self, frequency: Frequency, new_frequency: Frequency) -> Result<(), RegistryError> {
        if !self.constellations.contains_key(&frequency) {
            return Err(RegistryError::NotFound(frequency));
        }
        if frequency == new_frequency {
            return Ok(());
        }
        if frequency == self.public_frequency {
            return Err(RegistryError::ProtectedChannel(frequency));
        }
        if new_frequency > self.max_frequency {
            return Err(RegistryError::FrequencyOutOfRange(new_frequency));
        }
        if self.constellations.contains_key(&new_frequency) {
            return Err(RegistryError::FrequencyInUse(new_frequency));
        }
        Ok(())
    }

    fn move_channel(&mut self, frequency: Frequency, new_frequency: Frequency) {
        if frequency == new_frequency {
            return;
        }
        if let Some(mut constellation) = self.constellations.remove(&frequency) {
            constellation.frequency = new_frequency;
            self.constellations.insert(new_frequency, constellation);
            log::info!("Retuned constellation from frequency {} to {}", frequency, new_frequency);
        }
    }

    fn next_free_frequency(&self) -> Option<Frequency> {
        (1..=self.max_frequency).find(|f| *f != self.public_frequency && !self.constellations.contains_key(f))
    }

    fn check_name(&self, name: &str, except: Option<Frequency>) -> Result<String, RegistryError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RegistryError::InvalidName);
        }
        let taken = self
            .constellations
            .values()
            .any(|c| Some(c.frequency) != except && names_equal(&c.name, trimmed));
        if taken {
            return Err(RegistryError::DuplicateName(trimmed.to_string()));
        }
        Ok(trimmed.to_string())
    }
}

fn names_equal(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color32 = Color32::from_rgb(255, 0, 0);
    const BLUE: Color32 = Color32::from_rgb(0, 0, 255);

    fn registry() -> ConstellationRegistry {
        ConstellationRegistry::new(&OverlaySettings::default())
    }

    #[test]
    fn starts_with_public_channel_only() {
        let r = registry();
        assert_eq!(r.len(), 1);
        assert_eq!(r.get(0).unwrap().name, "Public");
    }

    #[test]
    fn create_allocates_lowest_free_frequency() {
        let mut r = registry();
        assert_eq!(r.create("Red", RED).unwrap(), 1);
        r.create_with_frequency(2, "Blue", BLUE).unwrap();
        assert_eq!(r.create("Green", Color32::GREEN).unwrap(), 3);
        r.delete(1).unwrap();
        assert_eq!(r.create("Yellow", Color32::YELLOW).unwrap(), 1);
    }

    #[test]
    fn create_skips_public_frequency() {
        let settings = OverlaySettings {
            public_frequency: 1,
            ..OverlaySettings::default()
        };
        let mut r = ConstellationRegistry::new(&settings);
        assert_eq!(r.create("Red", RED).unwrap(), 2);
    }

    #[test]
    fn duplicate_names_ignore_case_and_whitespace() {
        let mut r = registry();
        r.create("Red", RED).unwrap();
        assert_eq!(r.create("  red ", BLUE), Err(RegistryError::DuplicateName("red".into())));
        assert_eq!(r.create("PUBLIC", BLUE), Err(RegistryError::DuplicateName("PUBLIC".into())));
        assert_eq!(r.create("   ", BLUE), Err(RegistryError::InvalidName));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn rename_to_own_name_in_other_case_is_allowed() {
        let mut r = registry();
        let f = r.create("Red", RED).unwrap();
        r.rename(f, "RED").unwrap();
        assert_eq!(r.name_of(f), "RED");
        assert_eq!(r.rename(f, "public"), Err(RegistryError::DuplicateName("public".into())));
        assert_eq!(r.rename(42, "x"), Err(RegistryError::NotFound(42)));
    }

    #[test]
    fn recolor_unknown_frequency_fails() {
        let mut r = registry();
        assert_eq!(r.recolor(7, RED), Err(RegistryError::NotFound(7)));
        r.recolor(0, RED).unwrap();
        assert_eq!(r.resolve_color(Some(0)), RED);
    }

    #[test]
    fn public_channel_cannot_be_deleted_or_retuned() {
        let mut r = registry();
        assert_eq!(r.delete(0), Err(RegistryError::ProtectedChannel(0)));
        assert_eq!(r.retune(0, 5), Err(RegistryError::ProtectedChannel(0)));
        assert!(r.contains(0));
    }

    #[test]
    fn reset_public_restores_defaults() {
        let mut r = registry();
        r.rename(0, "Open").unwrap();
        r.recolor(0, BLUE).unwrap();
        r.reset_public();
        let public = r.get(0).unwrap();
        assert_eq!(public.name, "Public");
        assert_eq!(public.color, OverlaySettings::default().default_public_color);
    }

    #[test]
    fn reset_public_keeps_name_taken_by_another_channel() {
        let mut r = registry();
        r.rename(0, "Open").unwrap();
        r.recolor(0, BLUE).unwrap();
        r.create("Public", RED).unwrap();
        r.reset_public();
        let public = r.get(0).unwrap();
        assert_eq!(public.name, "Open");
        assert_eq!(public.color, OverlaySettings::default().default_public_color);
    }

    #[test]
    fn edit_is_validated_before_anything_changes() {
        let mut r = registry();
        let red = r.create("Red", RED).unwrap();
        let blue = r.create("Blue", BLUE).unwrap();
        assert_eq!(r.edit(red, "Crimson", blue), Err(RegistryError::FrequencyInUse(blue)));
        assert_eq!(r.edit(red, "blue", 40), Err(RegistryError::DuplicateName("blue".into())));
        assert_eq!(r.edit(0, "Open", 40), Err(RegistryError::ProtectedChannel(0)));
        assert_eq!(r.name_of(red), "Red");
        assert_eq!(r.name_of(0), "Public");
        assert!(!r.contains(40));

        r.edit(red, "Crimson", 40).unwrap();
        assert_eq!(r.name_of(40), "Crimson");
        assert!(!r.contains(red));
        r.edit(0, "Open", 0).unwrap();
        assert_eq!(r.name_of(0), "Open");
    }

    #[test]
    fn resolve_color_falls_back_to_no_channel_color() {
        let r = registry();
        let grey = OverlaySettings::default().no_channel_color;
        assert_eq!(r.resolve_color(None), grey);
        assert_eq!(r.resolve_color(Some(1234)), grey);
    }

    #[test]
    fn retune_moves_channel() {
        let mut r = registry();
        let f = r.create("Red", RED).unwrap();
        let g = r.create("Blue", BLUE).unwrap();
        assert_eq!(r.retune(f, g), Err(RegistryError::FrequencyInUse(g)));
        r.retune(f, 40).unwrap();
        assert!(!r.contains(f));
        assert_eq!(r.get(40).unwrap().name, "Red");
    }

    #[test]
    fn from_records_overrides_public_and_adds_others() {
        let settings = OverlaySettings::default();
        let records = vec![
            Constellation { frequency: 0, name: "Open".into(), color: BLUE },
            Constellation { frequency: 99, name: "Red".into(), color: RED },
        ];
        let r = ConstellationRegistry::from_records(&settings, &records).unwrap();
        assert_eq!(r.name_of(0), "Open");
        assert_eq!(r.resolve_color(Some(99)), RED);
    }

    #[test]
    fn out_of_range_frequency_is_rejected() {
        let settings = OverlaySettings {
            max_frequency: 10,
            ..OverlaySettings::default()
        };
        let mut r = ConstellationRegistry::new(&settings);
        assert_eq!(r.create_with_frequency(11, "Far", RED), Err(RegistryError::FrequencyOutOfRange(11)));
        for i in 0..10 {
            r.create(&format!("c{i}"), RED).unwrap();
        }
        assert_eq!(r.create("one too many", RED), Err(RegistryError::FrequenciesExhausted));
    }
}
