//! Bus and zone configuration.
//!
//! Configuration is validated once, when the coordinator is built. After
//! that nothing in here can fail.
//!
//! ## Defaults
//!
//! ```text
//! ┌──────────────────────────┬─────────────┬──────────────┐
//! │ Parameter                │ Default     │ Range        │
//! ├──────────────────────────┼─────────────┼──────────────┤
//! │ tx lead / rx lead        │ 0x80 / 0x10 │ must differ  │
//! │ receive_wait_time        │ 500 ms      │ > 0          │
//! │ loop_wait_time           │ 500 ms      │ > 0          │
//! │ cooling_max_power        │ 5.86 kW     │ 0.1 - 20.0   │
//! │ heating_max_power        │ 6.19 kW     │ 0.1 - 20.0   │
//! │ power_multiplier         │ 1.0         │ 0.1 - 5.0    │
//! │ temperature_publish_time │ 300 000 ms  │ > 0          │
//! └──────────────────────────┴─────────────┴──────────────┘
//! ```

use heapless::Vec;

use crate::addressing::ZoneNumber;
use crate::entity::{copy_str, EntityBinding, EntityId, EntityName, ZoneField};
use crate::error::{LgapError, Result};
use crate::protocol::frame::LeadBytes;

/// Default `receive_wait_time` / `loop_wait_time` (ms).
pub const DEFAULT_WAIT_MS: u32 = 500;
/// Default cooling ceiling (kW).
pub const DEFAULT_COOLING_MAX_KW: f32 = 5.86;
/// Default heating ceiling (kW).
pub const DEFAULT_HEATING_MAX_KW: f32 = 6.19;
/// Default power multiplier.
pub const DEFAULT_POWER_MULTIPLIER: f32 = 1.0;
/// Default minimum interval between room temperature publications (ms).
pub const DEFAULT_TEMPERATURE_PUBLISH_MS: u32 = 300_000;

/// `poll_interval_ms` polls this many times per wait.
const POLL_DIVISOR: u32 = 4;

/// Accepted range for both power ceilings (kW).
pub const MAX_POWER_RANGE: (f32, f32) = (0.1, 20.0);
/// Accepted range for the power multiplier.
pub const MULTIPLIER_RANGE: (f32, f32) = (0.1, 5.0);

fn in_range(value: f32, (min, max): (f32, f32)) -> bool {
    value >= min && value <= max
}

/// Power estimator parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PowerConfig {
    /// Electrical draw at full load while cooling or drying (kW)
    pub cooling_max_kw: f32,
    /// Electrical draw at full load while heating (kW)
    pub heating_max_kw: f32,
    /// Site calibration factor
    pub multiplier: f32,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            cooling_max_kw: DEFAULT_COOLING_MAX_KW,
            heating_max_kw: DEFAULT_HEATING_MAX_KW,
            multiplier: DEFAULT_POWER_MULTIPLIER,
        }
    }
}

impl PowerConfig {
    /// Check every parameter against its range.
    pub fn validate(&self) -> Result<()> {
        if !in_range(self.cooling_max_kw, MAX_POWER_RANGE) {
            return Err(LgapError::cooling_max_power_out_of_range());
        }
        if !in_range(self.heating_max_kw, MAX_POWER_RANGE) {
            return Err(LgapError::heating_max_power_out_of_range());
        }
        if !in_range(self.multiplier, MULTIPLIER_RANGE) {
            return Err(LgapError::power_multiplier_out_of_range());
        }
        Ok(())
    }
}

/// Configuration of one bus.
///
/// # Examples
///
/// ```
/// use lgap_bus::config::BusConfig;
///
/// let config = BusConfig::new("lgap")
///     .unwrap()
///     .with_loop_wait_ms(250)
///     .with_cooling_max_kw(7.1);
/// assert!(config.validate().is_ok());
///
/// let bad = BusConfig::new("lgap").unwrap().with_power_multiplier(9.0);
/// assert!(bad.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BusConfig {
    /// Bus identifier, prefix of the generated total power id
    pub id: EntityId,
    pub leads: LeadBytes,
    /// Longest a partial frame may wait for its tail (ms). The host must
    /// poll more often than this or split frames are discarded as stale.
    pub receive_wait_ms: u32,
    /// Interval between master requests (ms)
    pub loop_wait_ms: u32,
    pub power: PowerConfig,
    /// Explicit total power entity
    pub total_power: Option<EntityBinding>,
    /// Log every frame at debug level
    pub debug: bool,
}

impl BusConfig {
    /// Configuration with every default applied.
    pub fn new(id: &str) -> Result<Self> {
        Ok(Self {
            id: copy_str(id)?,
            leads: LeadBytes::default(),
            receive_wait_ms: DEFAULT_WAIT_MS,
            loop_wait_ms: DEFAULT_WAIT_MS,
            power: PowerConfig::default(),
            total_power: None,
            debug: true,
        })
    }

    #[must_use]
    pub fn with_tx_lead(mut self, lead: u8) -> Self {
        self.leads.tx = lead;
        self
    }

    #[must_use]
    pub fn with_rx_lead(mut self, lead: u8) -> Self {
        self.leads.rx = lead;
        self
    }

    #[must_use]
    pub fn with_receive_wait_ms(mut self, ms: u32) -> Self {
        self.receive_wait_ms = ms;
        self
    }

    #[must_use]
    pub fn with_loop_wait_ms(mut self, ms: u32) -> Self {
        self.loop_wait_ms = ms;
        self
    }

    #[must_use]
    pub fn with_cooling_max_kw(mut self, kw: f32) -> Self {
        self.power.cooling_max_kw = kw;
        self
    }

    #[must_use]
    pub fn with_heating_max_kw(mut self, kw: f32) -> Self {
        self.power.heating_max_kw = kw;
        self
    }

    #[must_use]
    pub fn with_power_multiplier(mut self, multiplier: f32) -> Self {
        self.power.multiplier = multiplier;
        self
    }

    #[must_use]
    pub fn with_total_power(mut self, binding: EntityBinding) -> Self {
        self.total_power = Some(binding);
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Interval at which a host loop should call `poll`.
    ///
    /// A quarter of the shorter wait, so a frame split across two reads is
    /// picked up well inside `receive_wait_ms`. Requests stay paced by
    /// `loop_wait_ms` however often `poll` runs.
    pub fn poll_interval_ms(&self) -> u32 {
        (self.receive_wait_ms.min(self.loop_wait_ms) / POLL_DIVISOR).max(1)
    }

    /// Check the whole configuration.
    pub fn validate(&self) -> Result<()> {
        if self.receive_wait_ms == 0 || self.loop_wait_ms == 0 {
            return Err(LgapError::zero_wait_time());
        }
        if self.leads.tx == self.leads.rx {
            return Err(LgapError::lead_bytes_collide());
        }
        self.power.validate()
    }
}

/// Configuration of one zone (one climate entity).
///
/// # Examples
///
/// ```
/// use lgap_bus::config::ZoneConfig;
/// use lgap_bus::entity::{EntityBinding, ZoneField};
/// use lgap_bus::zone;
///
/// let config = ZoneConfig::new(zone!(2), "bedroom_climate")
///     .unwrap()
///     .with_name("Bedroom")
///     .unwrap()
///     .bind(ZoneField::Power, EntityBinding::new("bedroom_kw").unwrap())
///     .unwrap();
/// assert_eq!(config.display_name().unwrap().as_str(), "Bedroom");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneConfig {
    pub zone: ZoneNumber,
    /// Climate entity id, prefix of generated field ids
    pub id: EntityId,
    /// Climate entity name, prefix of generated field names
    pub name: Option<EntityName>,
    /// Minimum interval between room temperature publications (ms)
    pub temperature_publish_ms: u32,
    bindings: Vec<(ZoneField, EntityBinding), { ZoneField::COUNT }>,
}

impl ZoneConfig {
    /// Zone configuration with defaults and no explicit bindings.
    pub fn new(zone: ZoneNumber, id: &str) -> Result<Self> {
        Ok(Self {
            zone,
            id: copy_str(id)?,
            name: None,
            temperature_publish_ms: DEFAULT_TEMPERATURE_PUBLISH_MS,
            bindings: Vec::new(),
        })
    }

    /// Set the display name.
    pub fn with_name(mut self, name: &str) -> Result<Self> {
        self.name = Some(copy_str(name)?);
        Ok(self)
    }

    #[must_use]
    pub fn with_temperature_publish_ms(mut self, ms: u32) -> Self {
        self.temperature_publish_ms = ms;
        self
    }

    /// Bind `field` to an explicit entity, replacing any earlier binding.
    pub fn bind(mut self, field: ZoneField, binding: EntityBinding) -> Result<Self> {
        if let Some(slot) = self.bindings.iter_mut().find(|(f, _)| *f == field) {
            slot.1 = binding;
            return Ok(self);
        }
        self.bindings
            .push((field, binding))
            .map_err(|_| LgapError::RegistryFull)?;
        Ok(self)
    }

    /// Explicit binding of `field`, if any.
    pub fn binding(&self, field: ZoneField) -> Option<&EntityBinding> {
        self.bindings
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, b)| b)
    }

    /// Configured name, or the title-cased id.
    pub fn display_name(&self) -> Result<EntityName> {
        match &self.name {
            Some(name) => Ok(name.clone()),
            None => crate::entity::title_case(&self.id),
        }
    }

    /// Check the zone configuration.
    pub fn validate(&self) -> Result<()> {
        if self.temperature_publish_ms == 0 {
            return Err(LgapError::zero_publish_interval());
        }
        Ok(())
    }
}
