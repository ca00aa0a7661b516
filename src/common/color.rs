//! Colour helpers shared by the overlay and the viewer.
//!
//! All colours are `egui::Color32`. Interpolation happens on the unmultiplied
//! sRGBA bytes, channel by channel, which matches how the gradient endpoints
//! are authored in settings and scene files.

use egui::Color32;
use serde::{Deserialize, Deserializer, Serializer};

/// Linear interpolation between two colours at fraction `t`.
///
/// `t` is clamped to `[0, 1]`, so `t = 0` yields `a` and `t = 1` yields `b`.
pub fn lerp_color(a: Color32, b: Color32, t: f32) -> Color32 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let a = a.to_srgba_unmultiplied();
    let b = b.to_srgba_unmultiplied();
    let mix = |i: usize| -> u8 { (a[i] as f32 + (b[i] as f32 - a[i] as f32) * t).round() as u8 };
    Color32::from_rgba_unmultiplied(mix(0), mix(1), mix(2), mix(3))
}

/// Parse `#RRGGBB` or `#RRGGBBAA`.
pub fn parse_hex(text: &str) -> Result<Color32, String> {
    Color32::from_hex(text.trim()).map_err(|e| format!("invalid colour '{}': {:?}", text, e))
}

/// Format as `#rrggbbaa`.
pub fn to_hex(color: Color32) -> String {
    color.to_hex()
}

/// Serde adapter storing a `Color32` as a hex string.
pub mod hex_color {
    use super::*;

    pub fn serialize<S: Serializer>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_hex(*color))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color32, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_hex(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_hits_both_ends_and_midpoint() {
        let black = Color32::from_rgb(0, 0, 0);
        let white = Color32::from_rgb(255, 255, 255);
        assert_eq!(lerp_color(black, white, 0.0), black);
        assert_eq!(lerp_color(black, white, 1.0), white);
        assert_eq!(lerp_color(black, white, 0.5), Color32::from_rgb(128, 128, 128));
    }

    #[test]
    fn lerp_clamps_out_of_range_fractions() {
        let red = Color32::from_rgb(255, 0, 0);
        let blue = Color32::from_rgb(0, 0, 255);
        assert_eq!(lerp_color(red, blue, -3.0), red);
        assert_eq!(lerp_color(red, blue, 7.0), blue);
        assert_eq!(lerp_color(red, blue, f32::NAN), red);
    }

    #[test]
    fn hex_parsing_accepts_both_lengths() {
        assert_eq!(parse_hex("#ff0000").unwrap(), Color32::from_rgb(255, 0, 0));
        assert_eq!(parse_hex(" #00ff00ff ").unwrap(), Color32::from_rgb(0, 255, 0));
        assert!(parse_hex("green").is_err());
    }
}
