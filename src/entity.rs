//! Host entity descriptors.
//!
//! Every value a zone publishes (power, pipe temperatures, analysis bytes,
//! sleep timer...) is bound to a host entity. Bindings are optional in the
//! configuration; anything left unbound gets a generated id and a readable
//! name through [`resolve_or_generate`].
//!
//! ```text
//! zone id "zone_0_climate", no name, field PipeIn
//!   id   ─► "zone_0_climate_pipe_in"
//!   name ─► "Zone 0 Climate Pipe In"
//! ```
//!
//! [`ZoneField`] is the static table from field to wire offset, unit and
//! label, so adding a field is one enum arm rather than another setter.

use core::fmt::Write;

use heapless::String;

use crate::error::{LgapError, Result};
use crate::protocol::constants::{
    OFFSET_BYTE_3, OFFSET_BYTE_5, OFFSET_ODU_TOTAL_LOAD, OFFSET_ZONE_ACTIVE_LOAD,
    OFFSET_ZONE_DESIGN_LOAD, OFFSET_ZONE_POWER_STATE,
};
use crate::protocol::zone_frame::ZoneFrame;

/// Longest entity id accepted.
pub const MAX_ID_LEN: usize = 48;
/// Longest entity name accepted.
pub const MAX_NAME_LEN: usize = 64;

/// Entity identifier
pub type EntityId = String<MAX_ID_LEN>;
/// Human-readable entity name
pub type EntityName = String<MAX_NAME_LEN>;

/// Unit of measurement: kilowatts
pub const UNIT_KILOWATT: &str = "kW";
/// Unit of measurement: degrees Celsius
pub const UNIT_CELSIUS: &str = "°C";
/// Unit of measurement: minutes
pub const UNIT_MINUTES: &str = "min";

/// Kind of host entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityKind {
    /// Read-only measurement
    Sensor,
    /// Host-writable number
    Number,
}

/// Explicit entity binding from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityBinding {
    pub id: EntityId,
    pub name: Option<EntityName>,
}

impl EntityBinding {
    /// Binding with an explicit id; the name is derived later if not set.
    pub fn new(id: &str) -> Result<Self> {
        Ok(Self {
            id: copy_str(id)?,
            name: None,
        })
    }

    /// Set an explicit name.
    pub fn with_name(mut self, name: &str) -> Result<Self> {
        self.name = Some(copy_str(name)?);
        Ok(self)
    }
}

/// Static description of one publishable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EntityTemplate {
    /// Suffix of generated ids
    pub key: &'static str,
    /// Suffix of generated names
    pub label: &'static str,
    pub unit: Option<&'static str>,
    pub accuracy_decimals: u8,
    pub kind: EntityKind,
}

/// Fully resolved entity, ready to hand to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub id: EntityId,
    pub name: EntityName,
    pub unit: Option<&'static str>,
    pub accuracy_decimals: u8,
    pub kind: EntityKind,
    /// `true` when id and name were generated rather than configured
    pub generated: bool,
}

/// Resolve an entity from its optional explicit binding, or generate one.
///
/// Generated ids are `<fallback_id>_<key>`; generated names are
/// `<fallback_name> <label>`. An explicit binding without a name keeps its
/// id and gets the generated name.
///
/// # Examples
///
/// ```
/// use lgap_bus::entity::{resolve_or_generate, ZoneField};
///
/// let desc = resolve_or_generate(None, "Lounge", "lounge_climate", &ZoneField::PipeIn.template())
///     .unwrap();
/// assert_eq!(desc.id.as_str(), "lounge_climate_pipe_in");
/// assert_eq!(desc.name.as_str(), "Lounge Pipe In");
/// ```
pub fn resolve_or_generate(
    explicit: Option<&EntityBinding>,
    fallback_name: &str,
    fallback_id: &str,
    template: &EntityTemplate,
) -> Result<EntityDescriptor> {
    let mut name = EntityName::new();
    write!(name, "{} {}", fallback_name, template.label).map_err(|_| LgapError::name_too_long())?;

    let (id, name, generated) = match explicit {
        Some(binding) => (
            binding.id.clone(),
            binding.name.clone().unwrap_or(name),
            false,
        ),
        None => {
            let mut id = EntityId::new();
            write!(id, "{}_{}", fallback_id, template.key)
                .map_err(|_| LgapError::name_too_long())?;
            (id, name, true)
        }
    };

    Ok(EntityDescriptor {
        id,
        name,
        unit: template.unit,
        accuracy_decimals: template.accuracy_decimals,
        kind: template.kind,
        generated,
    })
}

/// Turn an identifier into a display name: underscores become spaces and
/// each word is capitalised (`"zone_0_climate"` → `"Zone 0 Climate"`).
pub fn title_case(id: &str) -> Result<EntityName> {
    let mut out = EntityName::new();
    let mut prev_alpha = false;

    for c in id.chars() {
        let c = if c == '_' { ' ' } else { c };
        let mapped = if !c.is_alphabetic() {
            c
        } else if prev_alpha {
            c.to_ascii_lowercase()
        } else {
            c.to_ascii_uppercase()
        };
        prev_alpha = c.is_alphabetic();
        out.push(mapped).map_err(|_| LgapError::name_too_long())?;
    }

    Ok(out)
}

pub(crate) fn copy_str<const N: usize>(s: &str) -> Result<String<N>> {
    let mut out = String::new();
    out.push_str(s).map_err(|_| LgapError::name_too_long())?;
    Ok(out)
}

/// Every value a zone can publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ZoneField {
    /// Estimated electrical power
    Power,
    /// Duty proxy used by the estimator
    LoadByte,
    PipeIn,
    PipeOut,
    /// Offset 3
    Byte3,
    /// Offset 5, unit error/service code
    Byte5,
    /// Offset 11
    Byte11,
    /// Offset 12
    Byte12,
    /// Offset 13
    ZoneLoadIndex,
    /// Offset 14
    OduActiveLoad,
    /// Offset 11, LonWorks nvoLoadEstimate
    ZoneActiveLoad,
    /// Offset 12, LonWorks nvoOnOff
    ZonePowerState,
    /// Offset 13, LonWorks nciRatedCapacity
    ZoneDesignLoad,
    /// Offset 14, LonWorks nvoThermalLoad
    OduTotalLoad,
    /// Sleep timer duration, host-writable
    SleepTimer,
    /// Minutes left on the sleep timer
    TimerRemaining,
}

impl ZoneField {
    /// Number of fields.
    pub const COUNT: usize = 16;

    /// All fields, in publication order.
    pub const ALL: [ZoneField; Self::COUNT] = [
        Self::Power,
        Self::LoadByte,
        Self::PipeIn,
        Self::PipeOut,
        Self::Byte3,
        Self::Byte5,
        Self::Byte11,
        Self::Byte12,
        Self::ZoneLoadIndex,
        Self::OduActiveLoad,
        Self::ZoneActiveLoad,
        Self::ZonePowerState,
        Self::ZoneDesignLoad,
        Self::OduTotalLoad,
        Self::SleepTimer,
        Self::TimerRemaining,
    ];

    /// Position in [`ZoneField::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Id suffix, label, unit and kind.
    pub const fn template(self) -> EntityTemplate {
        let (key, label, unit, accuracy_decimals, kind) = match self {
            Self::Power => ("power", "Power", Some(UNIT_KILOWATT), 2, EntityKind::Sensor),
            Self::LoadByte => ("load_byte", "Load Byte", None, 0, EntityKind::Sensor),
            Self::PipeIn => ("pipe_in", "Pipe In", Some(UNIT_CELSIUS), 1, EntityKind::Sensor),
            Self::PipeOut => ("pipe_out", "Pipe Out", Some(UNIT_CELSIUS), 1, EntityKind::Sensor),
            Self::Byte3 => ("byte_3", "Byte 3", None, 0, EntityKind::Sensor),
            Self::Byte5 => ("byte_5", "Byte 5", None, 0, EntityKind::Sensor),
            Self::Byte11 => ("byte_11", "Byte 11", None, 0, EntityKind::Sensor),
            Self::Byte12 => ("byte_12", "Byte 12", None, 0, EntityKind::Sensor),
            Self::ZoneLoadIndex => ("zone_load_index", "Zone Load Index", None, 0, EntityKind::Sensor),
            Self::OduActiveLoad => ("odu_active_load", "ODU Active Load", None, 0, EntityKind::Sensor),
            Self::ZoneActiveLoad => ("zone_active_load", "Zone Active Load", None, 0, EntityKind::Sensor),
            Self::ZonePowerState => ("zone_power_state", "Zone Power State", None, 0, EntityKind::Sensor),
            Self::ZoneDesignLoad => ("zone_design_load", "Zone Design Load", None, 0, EntityKind::Sensor),
            Self::OduTotalLoad => ("odu_total_load", "ODU Total Load", None, 0, EntityKind::Sensor),
            Self::SleepTimer => ("sleep_timer", "Sleep Timer", Some(UNIT_MINUTES), 0, EntityKind::Number),
            Self::TimerRemaining => ("timer_remaining", "Timer Remaining", Some(UNIT_MINUTES), 1, EntityKind::Sensor),
        };
        EntityTemplate {
            key,
            label,
            unit,
            accuracy_decimals,
            kind,
        }
    }

    /// Frame offset this field mirrors, for the raw-byte fields.
    pub const fn offset(self) -> Option<usize> {
        match self {
            Self::Byte3 => Some(OFFSET_BYTE_3),
            Self::Byte5 => Some(OFFSET_BYTE_5),
            Self::LoadByte | Self::Byte11 | Self::ZoneActiveLoad => Some(OFFSET_ZONE_ACTIVE_LOAD),
            Self::Byte12 | Self::ZonePowerState => Some(OFFSET_ZONE_POWER_STATE),
            Self::ZoneLoadIndex | Self::ZoneDesignLoad => Some(OFFSET_ZONE_DESIGN_LOAD),
            Self::OduActiveLoad | Self::OduTotalLoad => Some(OFFSET_ODU_TOTAL_LOAD),
            Self::Power | Self::PipeIn | Self::PipeOut | Self::SleepTimer | Self::TimerRemaining => {
                None
            }
        }
    }

    /// Value carried directly by a status frame.
    ///
    /// `None` for fields computed elsewhere (power, sleep timer).
    pub fn value_from(self, frame: &ZoneFrame) -> Option<f32> {
        match self {
            Self::PipeIn => Some(frame.pipe_in_temperature()),
            Self::PipeOut => Some(frame.pipe_out_temperature()),
            _ => self.offset().map(|o| f32::from(frame.byte_at(o))),
        }
    }
}

/// Resolved descriptor for every [`ZoneField`] of one zone.
#[derive(Debug, Clone)]
pub struct ZoneEntities {
    entries: heapless::Vec<EntityDescriptor, { ZoneField::COUNT }>,
}

impl ZoneEntities {
    /// Resolve all fields, using `bindings` where given.
    pub fn resolve<'a>(
        zone_name: &str,
        zone_id: &str,
        mut binding_for: impl FnMut(ZoneField) -> Option<&'a EntityBinding>,
    ) -> Result<Self> {
        let mut entries = heapless::Vec::new();
        for field in ZoneField::ALL {
            let desc = resolve_or_generate(binding_for(field), zone_name, zone_id, &field.template())?;
            entries.push(desc).map_err(|_| LgapError::RegistryFull)?;
        }
        Ok(Self { entries })
    }

    /// Descriptor of `field`.
    pub fn get(&self, field: ZoneField) -> Option<&EntityDescriptor> {
        self.entries.get(field.index())
    }

    /// All descriptors, in [`ZoneField::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("zone_0_climate").unwrap().as_str(), "Zone 0 Climate");
        assert_eq!(title_case("LOUNGE_ac").unwrap().as_str(), "Lounge Ac");
        assert_eq!(title_case("2nd_floor").unwrap().as_str(), "2Nd Floor");
        assert_eq!(title_case("").unwrap().as_str(), "");
    }

    #[test]
    fn test_generated_descriptor() {
        let name = title_case("zone_0_climate").unwrap();
        let desc = resolve_or_generate(
            None,
            &name,
            "zone_0_climate",
            &ZoneField::ZoneActiveLoad.template(),
        )
        .unwrap();
        assert_eq!(desc.id.as_str(), "zone_0_climate_zone_active_load");
        assert_eq!(desc.name.as_str(), "Zone 0 Climate Zone Active Load");
        assert!(desc.generated);
        assert_eq!(desc.kind, EntityKind::Sensor);
    }

    #[test]
    fn test_explicit_binding_wins() {
        let binding = EntityBinding::new("kitchen_kw")
            .unwrap()
            .with_name("Kitchen kW")
            .unwrap();
        let desc =
            resolve_or_generate(Some(&binding), "Kitchen", "kitchen", &ZoneField::Power.template())
                .unwrap();
        assert_eq!(desc.id.as_str(), "kitchen_kw");
        assert_eq!(desc.name.as_str(), "Kitchen kW");
        assert_eq!(desc.unit, Some(UNIT_KILOWATT));
        assert!(!desc.generated);
    }

    #[test]
    fn test_explicit_binding_without_name() {
        let binding = EntityBinding::new("custom_id").unwrap();
        let desc =
            resolve_or_generate(Some(&binding), "Den", "den", &ZoneField::SleepTimer.template())
                .unwrap();
        assert_eq!(desc.id.as_str(), "custom_id");
        assert_eq!(desc.name.as_str(), "Den Sleep Timer");
        assert_eq!(desc.kind, EntityKind::Number);
    }

    #[test]
    fn test_id_too_long() {
        let long = "x".repeat(MAX_ID_LEN);
        assert!(resolve_or_generate(None, "X", &long, &ZoneField::Power.template()).is_err());
        assert!(EntityBinding::new(&"y".repeat(MAX_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_field_table_is_consistent() {
        for (i, field) in ZoneField::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
        }
        assert_eq!(ZoneField::ZoneLoadIndex.offset(), Some(13));
        assert_eq!(ZoneField::OduActiveLoad.offset(), Some(14));
        assert_eq!(ZoneField::Byte3.offset(), Some(3));
        assert_eq!(ZoneField::Power.offset(), None);
    }

    #[test]
    fn test_value_from_frame() {
        let mut frame = ZoneFrame::response(zone!(1));
        frame.byte5 = 7;
        frame.zone_design_load = 24;
        frame.pipe_out_raw = 120;
        assert_eq!(ZoneField::Byte5.value_from(&frame), Some(7.0));
        assert_eq!(ZoneField::ZoneLoadIndex.value_from(&frame), Some(24.0));
        assert_eq!(ZoneField::PipeOut.value_from(&frame), Some(24.0));
        assert_eq!(ZoneField::SleepTimer.value_from(&frame), None);
    }

    #[test]
    fn test_zone_entities_resolve_all() {
        let binding = EntityBinding::new("lounge_kw").unwrap();
        let entities = ZoneEntities::resolve("Lounge", "lounge", |field| {
            (field == ZoneField::Power).then_some(&binding)
        })
        .unwrap();
        assert_eq!(entities.iter().count(), ZoneField::COUNT);
        assert_eq!(entities.get(ZoneField::Power).unwrap().id.as_str(), "lounge_kw");
        assert_eq!(
            entities.get(ZoneField::PipeIn).unwrap().id.as_str(),
            "lounge_pipe_in"
        );
    }
}
