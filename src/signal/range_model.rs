//! Pluggable range models.
//!
//! A range model maps the transmit powers of both ends of a link on one
//! channel to the maximum distance they can bridge. Models are pure: calling
//! them never changes state, so the resolver may query one per candidate
//! channel without ordering concerns.
//!
//! Units:
//! - `StandardRangeModel`, `AdditiveRangeModel`, `ScaledMinRangeModel`: power
//!   is expressed directly in range units (metres)
//! - `PathLossRangeModel`: power is expressed in dBm, range in metres

use serde::Deserialize;

/// Maximum achievable range for a pair of transmit powers.
pub trait RangeModel {
    fn maximum_range(&self, power_a: f64, power_b: f64) -> f64;
}

/// Geometric mean of both powers.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRangeModel;

impl RangeModel for StandardRangeModel {
    fn maximum_range(&self, power_a: f64, power_b: f64) -> f64 {
        (power_a.max(0.0) * power_b.max(0.0)).sqrt()
    }
}

/// Weaker power plus the geometric mean. A silent end yields zero range.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdditiveRangeModel;

impl RangeModel for AdditiveRangeModel {
    fn maximum_range(&self, power_a: f64, power_b: f64) -> f64 {
        let weaker = power_a.min(power_b);
        if weaker <= 0.0 {
            return 0.0;
        }
        weaker + (power_a * power_b).sqrt()
    }
}

/// `min(power_a, power_b) * factor`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScaledMinRangeModel {
    pub factor: f64,
}

impl RangeModel for ScaledMinRangeModel {
    fn maximum_range(&self, power_a: f64, power_b: f64) -> f64 {
        (power_a.min(power_b) * self.factor).max(0.0)
    }
}

/// Parameters of the log-distance path loss model.
#[derive(Debug, Deserialize, Clone)]
pub struct PathLossParameters {
    /// Path loss exponent (n). 2.0 for free space, 2.7-3.5 for urban.
    pub path_loss_exponent: f64,
    /// Path loss at the reference distance d₀ (1 metre) in dB.
    pub path_loss_at_reference_distance: f64,
    /// The thermal noise floor of the receiver in dBm.
    pub noise_floor: f64,
    /// Minimum SNR (dB) the receiver can still decode.
    pub snr_limit: f64,
}

/// Link budget of the weaker transmitter under a log-distance path loss.
///
/// The link closes where the weaker end's received power drops to the
/// receiving limit (noise floor plus SNR limit):
///
/// ```text
/// P_tx - (PL(d0) + 10 n log10 d) = RL
/// d = 10^((P_tx - RL - PL(d0)) / (10 n))
/// ```
///
/// Shadowing is not sampled, so the estimate is stable across frames.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "PathLossParameters")]
pub struct PathLossRangeModel {
    pub parameters: PathLossParameters,
}

impl From<PathLossParameters> for PathLossRangeModel {
    fn from(parameters: PathLossParameters) -> Self {
        Self { parameters }
    }
}

impl PathLossRangeModel {
    pub fn new(parameters: PathLossParameters) -> Self {
        Self { parameters }
    }

    /// Range of a single transmitter with `tx_power_dbm`.
    pub fn effective_distance(&self, tx_power_dbm: f64) -> f64 {
        let p = &self.parameters;
        let receiving_limit = p.noise_floor + p.snr_limit;
        let numerator = tx_power_dbm - receiving_limit - p.path_loss_at_reference_distance;
        if numerator <= 0.0 {
            return 0.0;
        }
        10.0_f64.powf(numerator / (10.0 * p.path_loss_exponent))
    }
}

impl RangeModel for PathLossRangeModel {
    fn maximum_range(&self, power_a: f64, power_b: f64) -> f64 {
        self.effective_distance(power_a.min(power_b))
    }
}

/// Range model chosen in a scene file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfiguredRangeModel {
    #[default]
    Standard,
    Additive,
    ScaledMin(ScaledMinRangeModel),
    PathLoss(PathLossRangeModel),
}

impl RangeModel for ConfiguredRangeModel {
    fn maximum_range(&self, power_a: f64, power_b: f64) -> f64 {
        match self {
            ConfiguredRangeModel::Standard => StandardRangeModel.maximum_range(power_a, power_b),
            ConfiguredRangeModel::Additive => AdditiveRangeModel.maximum_range(power_a, power_b),
            ConfiguredRangeModel::ScaledMin(model) => model.maximum_range(power_a, power_b),
            ConfiguredRangeModel::PathLoss(model) => model.maximum_range(power_a, power_b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_pathloss() -> PathLossParameters {
        PathLossParameters {
            path_loss_exponent: 2.0,
            path_loss_at_reference_distance: 40.0,
            noise_floor: -120.0,
            snr_limit: -7.5,
        }
    }

    #[test]
    fn standard_is_symmetric_geometric_mean() {
        let m = StandardRangeModel;
        assert_eq!(m.maximum_range(4.0, 9.0), 6.0);
        assert_eq!(m.maximum_range(9.0, 4.0), 6.0);
        assert_eq!(m.maximum_range(-4.0, 9.0), 0.0);
    }

    #[test]
    fn additive_needs_both_ends() {
        let m = AdditiveRangeModel;
        assert_eq!(m.maximum_range(0.0, 100.0), 0.0);
        assert_eq!(m.maximum_range(4.0, 9.0), 10.0);
    }

    #[test]
    fn scaled_min_uses_weaker_end() {
        let m = ScaledMinRangeModel { factor: 2.0 };
        assert_eq!(m.maximum_range(50.0, 30.0), 60.0);
    }

    #[test]
    fn path_loss_range_monotonic_with_tx_power() {
        let m = PathLossRangeModel::new(default_pathloss());
        let d_low = m.maximum_range(0.0, 30.0);
        let d_mid = m.maximum_range(10.0, 30.0);
        let d_high = m.maximum_range(20.0, 30.0);
        assert!(d_low < d_mid && d_mid < d_high);
    }

    #[test]
    fn path_loss_below_budget_is_zero() {
        let m = PathLossRangeModel::new(default_pathloss());
        assert_eq!(m.effective_distance(-200.0), 0.0);
    }

    #[test]
    fn configured_model_deserializes_from_tagged_json() {
        let m: ConfiguredRangeModel = serde_json::from_str(r#"{"type":"scaled_min","factor":3.0}"#).unwrap();
        assert_eq!(m.maximum_range(5.0, 7.0), 15.0);
        let m: ConfiguredRangeModel = serde_json::from_str(
            r#"{"type":"path_loss","path_loss_exponent":2.0,"path_loss_at_reference_distance":40.0,"noise_floor":-120.0,"snr_limit":-7.5}"#,
        )
        .unwrap();
        assert!(m.maximum_range(10.0, 10.0) > 0.0);
    }
}
