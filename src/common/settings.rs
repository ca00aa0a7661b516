//! Process-wide overlay configuration.
//!
//! Loaded once at startup from an optional `settings.toml` and read every
//! frame afterwards. Missing keys fall back to the defaults below.

use egui::Color32;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::color::hex_color;
use crate::constellation::Frequency;

/// Strength-to-colour mapping and public channel defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OverlaySettings {
    /// Frequency of the reserved public channel.
    pub public_frequency: Frequency,
    /// Name restored by a public channel reset.
    pub default_public_name: String,
    /// Colour restored by a public channel reset.
    #[serde(with = "hex_color")]
    pub default_public_color: Color32,
    /// Gradient end used for zero signal strength.
    #[serde(with = "hex_color")]
    pub color_low: Color32,
    /// Gradient end shown in legends when no channel colour applies.
    #[serde(with = "hex_color")]
    pub color_high: Color32,
    /// Colour of a link whose endpoints share no channel.
    #[serde(with = "hex_color")]
    pub no_channel_color: Color32,
    /// Exponent applied to signal strength before interpolation.
    pub lerp_power: f32,
    /// Swap which gradient end is "low" and which is "high".
    pub swap_high_low: bool,
    /// Largest frequency id the registry may allocate.
    pub max_frequency: Frequency,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            public_frequency: 0,
            default_public_name: "Public".to_string(),
            default_public_color: Color32::from_rgb(166, 255, 4),
            color_low: Color32::from_rgb(179, 26, 26),
            color_high: Color32::from_rgb(110, 207, 246),
            no_channel_color: Color32::from_rgb(128, 128, 128),
            lerp_power: 1.0,
            swap_high_low: false,
            max_frequency: 32767,
        }
    }
}

impl OverlaySettings {
    /// Load settings from a TOML file.
    ///
    /// # Returns
    /// * `Ok(OverlaySettings)` if the file was read, parsed and validated
    /// * `Err(String)` with a descriptive message otherwise
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path).map_err(|e| format!("Failed to read settings file: {}", e))?;
        Self::from_toml(&content)
    }

    /// Load settings if the file exists, otherwise use the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, String> {
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("No settings file at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        let settings: Self = toml::from_str(content).map_err(|e| format!("Failed to parse settings file: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.lerp_power > 0.0) || !self.lerp_power.is_finite() {
            return Err(format!("Invalid lerp-power {}, must be a positive number", self.lerp_power));
        }
        if self.public_frequency > self.max_frequency {
            return Err(format!(
                "public-frequency {} exceeds max-frequency {}",
                self.public_frequency, self.max_frequency
            ));
        }
        if self.default_public_name.trim().is_empty() {
            return Err("default-public-name must not be empty".to_string());
        }
        Ok(())
    }

    /// Derive the settings path from a scene file path.
    ///
    /// Replaces the scene filename with "settings.toml" in the same directory.
    pub fn settings_path_from_scene(scene_path: &str) -> std::path::PathBuf {
        let scene = Path::new(scene_path);
        scene.parent().unwrap_or(Path::new(".")).join("settings.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let settings = OverlaySettings::from_toml("").unwrap();
        assert_eq!(settings, OverlaySettings::default());
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let settings = OverlaySettings::from_toml(
            r##"
            public-frequency = 1
            lerp-power = 2.5
            swap-high-low = true
            color-low = "#000000"
            "##,
        )
        .unwrap();
        assert_eq!(settings.public_frequency, 1);
        assert_eq!(settings.lerp_power, 2.5);
        assert!(settings.swap_high_low);
        assert_eq!(settings.color_low, Color32::from_rgb(0, 0, 0));
        assert_eq!(settings.default_public_name, "Public");
    }

    #[test]
    fn rejects_non_positive_lerp_power() {
        assert!(OverlaySettings::from_toml("lerp-power = 0.0").is_err());
        assert!(OverlaySettings::from_toml("lerp-power = -1.0").is_err());
    }

    #[test]
    fn rejects_public_frequency_above_maximum() {
        let err = OverlaySettings::from_toml("public-frequency = 500\nmax-frequency = 100").unwrap_err();
        assert!(err.contains("exceeds"));
    }
}
