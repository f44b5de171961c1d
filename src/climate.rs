//! Climate control vocabulary shared by the decoder, handlers and host.
//!
//! LGAP keeps power and mode as separate fields; the host side sees a single
//! mode where `Off` means "powered down". Conversion between the two lives
//! here.
//!
//! ## Operation byte (offset 6)
//!
//! ```text
//!   7   6   5   4   3   2   1   0
//! ┌───┬───────────┬───┬───────────┐
//! │ - │  fan (3)  │ sw│  mode (3) │
//! └───┴───────────┴───┴───────────┘
//!
//! mode: 0 Cool, 1 Dry, 2 Fan, 3 Auto, 4 Heat
//! fan:  0 no change, 1 Low, 2 Medium, 3 High, 4 Auto, 5 Slow, 6 Power, 7 Slow+Power
//! ```

use crate::protocol::constants::TARGET_TEMP_OFFSET;

/// Lowest setpoint accepted while heating (°C).
pub const MIN_TARGET_HEAT: u8 = 16;
/// Lowest setpoint accepted in every other mode (°C).
pub const MIN_TARGET_OTHER: u8 = 18;
/// Highest setpoint accepted in every mode (°C).
pub const MAX_TARGET: u8 = 30;
/// Setpoint assumed before the first status frame arrives (°C).
pub const DEFAULT_TARGET: u8 = 24;

/// Host-facing operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClimateMode {
    /// Unit powered down
    #[default]
    Off,
    Cool,
    Dry,
    FanOnly,
    /// LGAP "Auto": the unit picks heating or cooling
    HeatCool,
    Heat,
}

impl ClimateMode {
    /// Map the 3-bit LGAP mode code. Unknown codes yield `None`.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Cool),
            1 => Some(Self::Dry),
            2 => Some(Self::FanOnly),
            3 => Some(Self::HeatCool),
            4 => Some(Self::Heat),
            _ => None,
        }
    }

    /// 3-bit LGAP mode code. `Off` has none; it is expressed by the power flag.
    pub const fn code(self) -> Option<u8> {
        match self {
            Self::Off => None,
            Self::Cool => Some(0),
            Self::Dry => Some(1),
            Self::FanOnly => Some(2),
            Self::HeatCool => Some(3),
            Self::Heat => Some(4),
        }
    }

    /// Lowest setpoint allowed in this mode.
    pub const fn min_target(self) -> u8 {
        match self {
            Self::Heat => MIN_TARGET_HEAT,
            _ => MIN_TARGET_OTHER,
        }
    }

    /// Short lowercase name, for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Cool => "cool",
            Self::Dry => "dry",
            Self::FanOnly => "fan_only",
            Self::HeatCool => "heat_cool",
            Self::Heat => "heat",
        }
    }
}

/// Host-facing fan speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FanMode {
    Low,
    Medium,
    High,
    #[default]
    Auto,
    /// LGAP "Slow"
    Quiet,
    /// LGAP "Power" / turbo
    Focus,
}

impl FanMode {
    /// Map the 3-bit LGAP fan code.
    ///
    /// `0` means "no change" and yields `None`. `7` (slow + power) has no
    /// host equivalent and is reported as [`FanMode::Focus`].
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            4 => Some(Self::Auto),
            5 => Some(Self::Quiet),
            6 | 7 => Some(Self::Focus),
            _ => None,
        }
    }

    /// 3-bit LGAP fan code.
    pub const fn code(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Auto => 4,
            Self::Quiet => 5,
            Self::Focus => 6,
        }
    }
}

/// Host-facing louver swing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SwingMode {
    #[default]
    Off,
    Vertical,
}

impl SwingMode {
    /// Map the swing bit.
    pub const fn from_bit(on: bool) -> Self {
        if on {
            Self::Vertical
        } else {
            Self::Off
        }
    }

    /// Swing bit value.
    pub const fn bit(self) -> bool {
        matches!(self, Self::Vertical)
    }
}

/// Climate state of one zone as last reported by the unit or commanded by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClimateState {
    pub mode: ClimateMode,
    pub fan: FanMode,
    pub swing: SwingMode,
    /// Setpoint (°C)
    pub target: u8,
    /// Room temperature (°C), `None` until the first status frame
    pub current: Option<i16>,
}

impl Default for ClimateState {
    fn default() -> Self {
        Self {
            mode: ClimateMode::Off,
            fan: FanMode::Auto,
            swing: SwingMode::Off,
            target: DEFAULT_TARGET,
            current: None,
        }
    }
}

impl ClimateState {
    /// Power flag as sent on the wire.
    pub const fn power_on(&self) -> bool {
        !matches!(self.mode, ClimateMode::Off)
    }

    /// Low nibble written to the target byte.
    pub const fn target_code(&self) -> u8 {
        self.target.saturating_sub(TARGET_TEMP_OFFSET) & 0x0F
    }
}

/// Partial update requested by the host.
///
/// # Examples
///
/// ```
/// use lgap_bus::climate::{ClimateCall, ClimateMode, FanMode};
///
/// let call = ClimateCall::new()
///     .with_mode(ClimateMode::Cool)
///     .with_fan(FanMode::High)
///     .with_target(22.0);
/// assert_eq!(call.mode, Some(ClimateMode::Cool));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClimateCall {
    pub mode: Option<ClimateMode>,
    pub fan: Option<FanMode>,
    pub swing: Option<SwingMode>,
    /// Requested setpoint (°C), clamped per mode when applied
    pub target: Option<f32>,
}

impl ClimateCall {
    /// An empty call that changes nothing.
    pub const fn new() -> Self {
        Self {
            mode: None,
            fan: None,
            swing: None,
            target: None,
        }
    }

    #[must_use]
    pub const fn with_mode(mut self, mode: ClimateMode) -> Self {
        self.mode = Some(mode);
        self
    }

    #[must_use]
    pub const fn with_fan(mut self, fan: FanMode) -> Self {
        self.fan = Some(fan);
        self
    }

    #[must_use]
    pub const fn with_swing(mut self, swing: SwingMode) -> Self {
        self.swing = Some(swing);
        self
    }

    #[must_use]
    pub const fn with_target(mut self, target: f32) -> Self {
        self.target = Some(target);
        self
    }

    /// True when the call carries no change at all.
    pub const fn is_empty(&self) -> bool {
        self.mode.is_none() && self.fan.is_none() && self.swing.is_none() && self.target.is_none()
    }
}

/// Clamp a requested setpoint into the range allowed for `mode` and round it
/// to a whole degree. Out-of-range requests are logged.
pub fn clamp_target(mode: ClimateMode, requested: f32) -> u8 {
    let min = f32::from(mode.min_target());
    let max = f32::from(MAX_TARGET);

    let clamped = if requested.is_nan() {
        lgap_log!(warn, "Ignoring NaN setpoint, using {}", DEFAULT_TARGET);
        f32::from(DEFAULT_TARGET)
    } else if requested < min {
        lgap_log!(
            warn,
            "Requested setpoint below the {} minimum, clamping",
            mode.as_str()
        );
        min
    } else if requested > max {
        lgap_log!(warn, "Requested setpoint above the maximum, clamping");
        max
    } else {
        requested
    };

    // Round half up without libm
    (clamped + 0.5) as u8
}
