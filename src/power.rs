//! Power estimation.
//!
//! LGAP does not report electrical power. The estimate scales a per-mode
//! ceiling by the zone's load byte:
//!
//! ```text
//! kW = ceiling(mode) × load_byte / 255 × multiplier
//!
//! ceiling: Cool, Dry  → cooling_max
//!          Heat       → heating_max
//!          HeatCool   → max(cooling_max, heating_max)
//!          FanOnly    → 0
//!          Off        → 0
//! ```
//!
//! It is a heuristic, not a measurement.

use crate::climate::ClimateMode;
use crate::config::PowerConfig;
use crate::protocol::zone_frame::ZoneFrame;

/// Full-scale value of the load byte.
pub const LOAD_FULL_SCALE: f32 = 255.0;

/// Ceiling for `mode` (kW).
pub fn ceiling_kw(mode: ClimateMode, config: &PowerConfig) -> f32 {
    match mode {
        ClimateMode::Cool | ClimateMode::Dry => config.cooling_max_kw,
        ClimateMode::Heat => config.heating_max_kw,
        ClimateMode::HeatCool => config.cooling_max_kw.max(config.heating_max_kw),
        ClimateMode::FanOnly | ClimateMode::Off => 0.0,
    }
}

/// Estimate from a raw load byte.
pub fn estimate_from_load(load_byte: u8, mode: ClimateMode, config: &PowerConfig) -> f32 {
    let kw = ceiling_kw(mode, config) * (f32::from(load_byte) / LOAD_FULL_SCALE) * config.multiplier;
    kw.max(0.0)
}

/// Estimate the instantaneous draw of the zone described by `frame` (kW).
///
/// # Examples
///
/// ```
/// use lgap_bus::climate::ClimateMode;
/// use lgap_bus::config::PowerConfig;
/// use lgap_bus::power::estimate;
/// use lgap_bus::protocol::zone_frame::ZoneFrame;
/// use lgap_bus::zone;
///
/// let mut frame = ZoneFrame::response(zone!(0));
/// frame.zone_active_load = 255;
///
/// let kw = estimate(&frame, ClimateMode::Cool, &PowerConfig::default());
/// assert!((kw - 5.86).abs() < 1e-4);
/// assert_eq!(estimate(&frame, ClimateMode::FanOnly, &PowerConfig::default()), 0.0);
/// ```
pub fn estimate(frame: &ZoneFrame, mode: ClimateMode, config: &PowerConfig) -> f32 {
    estimate_from_load(frame.load_byte(), mode, config)
}

/// Sum of per-zone estimates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TotalPower {
    kw: f32,
    zones: usize,
}

impl TotalPower {
    pub const fn new() -> Self {
        Self { kw: 0.0, zones: 0 }
    }

    /// Add one zone's estimate.
    pub fn add(&mut self, kw: f32) {
        self.kw += kw;
        self.zones += 1;
    }

    /// Total (kW).
    pub const fn kw(&self) -> f32 {
        self.kw
    }

    /// Number of zones summed.
    pub const fn zones(&self) -> usize {
        self.zones
    }
}

impl FromIterator<f32> for TotalPower {
    fn from_iter<I: IntoIterator<Item = f32>>(iter: I) -> Self {
        let mut total = Self::new();
        for kw in iter {
            total.add(kw);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MODES: [ClimateMode; 6] = [
        ClimateMode::Off,
        ClimateMode::Cool,
        ClimateMode::Dry,
        ClimateMode::FanOnly,
        ClimateMode::HeatCool,
        ClimateMode::Heat,
    ];

    #[test]
    fn test_ceilings() {
        let config = PowerConfig::default();
        assert!((ceiling_kw(ClimateMode::Dry, &config) - 5.86).abs() < 1e-6);
        assert!((ceiling_kw(ClimateMode::Heat, &config) - 6.19).abs() < 1e-6);
        assert!((ceiling_kw(ClimateMode::HeatCool, &config) - 6.19).abs() < 1e-6);
        assert_eq!(ceiling_kw(ClimateMode::Off, &config), 0.0);
    }

    #[test]
    fn test_zero_load_is_zero() {
        let config = PowerConfig::default();
        for mode in MODES {
            assert_eq!(estimate_from_load(0, mode, &config), 0.0);
        }
    }

    #[test]
    fn test_half_load_with_multiplier() {
        let config = PowerConfig {
            cooling_max_kw: 10.0,
            heating_max_kw: 8.0,
            multiplier: 2.0,
        };
        let kw = estimate_from_load(51, ClimateMode::Cool, &config);
        // 10 × 51/255 × 2 = 4.0
        assert!((kw - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_total_power() {
        let total: TotalPower = [1.2, 0.0, 3.4].into_iter().collect();
        assert!((total.kw() - 4.6).abs() < 1e-5);
        assert_eq!(total.zones(), 3);
    }

    fn config_strategy() -> impl Strategy<Value = PowerConfig> {
        (0.1f32..=20.0, 0.1f32..=20.0, 0.1f32..=5.0).prop_map(|(c, h, m)| PowerConfig {
            cooling_max_kw: c,
            heating_max_kw: h,
            multiplier: m,
        })
    }

    proptest! {
        #[test]
        fn prop_estimate_non_negative_and_monotonic(
            config in config_strategy(),
            mode_idx in 0usize..6,
            a in any::<u8>(),
            b in any::<u8>(),
        ) {
            let mode = MODES[mode_idx];
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let kw_lo = estimate_from_load(lo, mode, &config);
            let kw_hi = estimate_from_load(hi, mode, &config);
            prop_assert!(kw_lo >= 0.0);
            prop_assert!(kw_lo <= kw_hi);
        }

        #[test]
        fn prop_full_load_hits_ceiling(config in config_strategy(), mode_idx in 0usize..6) {
            let mode = MODES[mode_idx];
            let expected = ceiling_kw(mode, &config) * config.multiplier;
            let kw = estimate_from_load(255, mode, &config);
            prop_assert!((kw - expected).abs() <= expected.abs() * 1e-5 + 1e-6);
        }
    }
}
