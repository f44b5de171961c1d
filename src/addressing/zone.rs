//! LGAP zone number.
//!
//! Zone numbers are carried as a single byte. PI485-style gateways address
//! at most 64 indoor units per bus, so anything above [`ZoneNumber::MAX`] is
//! treated as a corrupted frame rather than a real zone.

use crate::error::{LgapError, Result};
use core::fmt;

/// Zone number of one indoor unit on the bus.
///
/// # Examples
///
/// ```
/// use lgap_bus::ZoneNumber;
///
/// let zone = ZoneNumber::new(3).unwrap();
/// assert_eq!(zone.raw(), 3);
/// assert!(ZoneNumber::new(64).is_err());
///
/// let zone: ZoneNumber = "12".parse().unwrap();
/// assert_eq!(u8::from(zone), 12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "u8", into = "u8")
)]
pub struct ZoneNumber {
    raw: u8,
}

impl ZoneNumber {
    /// Highest zone number accepted on the bus.
    pub const MAX: u8 = 63;

    /// Create a zone number, rejecting values above [`ZoneNumber::MAX`].
    pub fn new(raw: u8) -> Result<Self> {
        if raw > Self::MAX {
            return Err(LgapError::zone_out_of_range());
        }
        Ok(Self { raw })
    }

    /// Create a zone number without the range check.
    ///
    /// Used by the `zone!` macro after its compile-time check.
    #[doc(hidden)]
    pub const fn new_unchecked(raw: u8) -> Self {
        Self { raw }
    }

    /// Get the raw byte as it appears on the wire.
    #[inline(always)]
    pub const fn raw(self) -> u8 {
        self.raw
    }

    /// Check whether a raw zone byte is a valid zone number.
    #[inline(always)]
    pub const fn is_valid(raw: u8) -> bool {
        raw <= Self::MAX
    }
}

impl TryFrom<u8> for ZoneNumber {
    type Error = LgapError;

    fn try_from(raw: u8) -> Result<Self> {
        Self::new(raw)
    }
}

impl From<ZoneNumber> for u8 {
    #[inline(always)]
    fn from(zone: ZoneNumber) -> u8 {
        zone.raw
    }
}

impl fmt::Display for ZoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl core::str::FromStr for ZoneNumber {
    type Err = LgapError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s
            .trim()
            .parse::<u8>()
            .ok()
            .ok_or_else(LgapError::zone_out_of_range)?;
        Self::new(raw)
    }
}
