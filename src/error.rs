//! Error types for LGAP bus operations.
//!
//! Errors follow the same layout everywhere: a public category on
//! [`LgapError`] wrapping a small struct that carries an internal kind
//! (and a backtrace when `std` is enabled), plus `is_*` helpers for callers
//! that need to tell kinds apart.
//!
//! Only configuration-time errors ([`LgapError::DuplicateZone`],
//! [`LgapError::Config`], [`LgapError::RegistryFull`]) are meant to stop the
//! bus. Everything raised while handling a single frame is counted by the
//! coordinator and the poll loop keeps running.

use core::fmt;

#[cfg(feature = "std")]
use std::backtrace::Backtrace;

/// Result type alias for LGAP operations.
pub type Result<T> = core::result::Result<T, LgapError>;

// =============================================================================
// Error Kind Enums (Internal)
// =============================================================================

/// Framing error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum FramingErrorKind {
    /// A partial frame sat in the buffer past `receive_wait_time`
    Stalled,
    /// A lead byte candidate failed validation and one byte was dropped
    Resync,
}

/// Malformed frame variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum MalformedFrameKind {
    InvalidLength,
    UnknownLeadByte,
    InvalidChecksum,
    ZoneOutOfRange,
}

/// Configuration error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum ConfigErrorKind {
    CoolingMaxPowerOutOfRange,
    HeatingMaxPowerOutOfRange,
    PowerMultiplierOutOfRange,
    ZeroWaitTime,
    ZeroPublishInterval,
    LeadBytesCollide,
    NameTooLong,
}

/// Transport error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum TransportErrorKind {
    ReadFailed,
    WriteFailed,
    FlowControlFailed,
}

// =============================================================================
// Main Error Type
// =============================================================================

/// LGAP bus error types.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LgapError {
    /// Partial or desynchronized byte stream, recovered by the framer
    Framing(FramingError),
    /// A 16-byte frame failed structural checks
    MalformedFrame(MalformedFrameError),
    /// Two handlers claimed the same zone number
    DuplicateZone {
        /// The contested zone number
        zone: u8,
    },
    /// Valid frame for a zone that has no registered handler
    UnroutableFrame {
        /// The zone the frame was addressed to
        zone: u8,
    },
    /// Sleep timer write outside `0..=420` minutes
    InvalidTimerValue {
        /// The rejected value
        minutes: u16,
    },
    /// Invalid startup configuration
    Config(ConfigError),
    /// Serial link or flow-control pin failure
    Transport(TransportError),
    /// No room left for another zone handler
    RegistryFull,
}

// =============================================================================
// Structured Error Types
// =============================================================================

/// Framing error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FramingError {
    kind: FramingErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl FramingError {
    pub(crate) fn new(kind: FramingErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if a partial frame timed out
    pub fn is_stalled(&self) -> bool {
        matches!(self.kind, FramingErrorKind::Stalled)
    }

    /// Check if a candidate frame was rejected during resync
    pub fn is_resync(&self) -> bool {
        matches!(self.kind, FramingErrorKind::Resync)
    }
}

/// Malformed frame error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MalformedFrameError {
    kind: MalformedFrameKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl MalformedFrameError {
    pub(crate) fn new(kind: MalformedFrameKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if the checksum byte did not match
    pub fn is_invalid_checksum(&self) -> bool {
        matches!(self.kind, MalformedFrameKind::InvalidChecksum)
    }

    /// Check if the lead byte matched neither direction
    pub fn is_unknown_lead_byte(&self) -> bool {
        matches!(self.kind, MalformedFrameKind::UnknownLeadByte)
    }

    /// Check if the zone byte is not a valid zone number
    pub fn is_zone_out_of_range(&self) -> bool {
        matches!(self.kind, MalformedFrameKind::ZoneOutOfRange)
    }

    /// Check if the input was not exactly one frame long
    pub fn is_invalid_length(&self) -> bool {
        matches!(self.kind, MalformedFrameKind::InvalidLength)
    }
}

/// Configuration error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigError {
    kind: ConfigErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl ConfigError {
    pub(crate) fn new(kind: ConfigErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if a power ceiling or multiplier was outside its range
    pub fn is_power_out_of_range(&self) -> bool {
        matches!(
            self.kind,
            ConfigErrorKind::CoolingMaxPowerOutOfRange
                | ConfigErrorKind::HeatingMaxPowerOutOfRange
                | ConfigErrorKind::PowerMultiplierOutOfRange
        )
    }

    /// Check if a wait time was zero
    pub fn is_zero_wait_time(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::ZeroWaitTime)
    }

    /// Check if the temperature publish interval was zero
    pub fn is_zero_publish_interval(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::ZeroPublishInterval)
    }

    /// Check if both lead bytes were configured to the same value
    pub fn is_lead_collision(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::LeadBytesCollide)
    }

    /// Check if an identifier or name did not fit its buffer
    pub fn is_name_too_long(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::NameTooLong)
    }
}

/// Transport error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransportError {
    kind: TransportErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl TransportError {
    pub(crate) fn new(kind: TransportErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if the UART write failed
    pub fn is_write_failed(&self) -> bool {
        matches!(self.kind, TransportErrorKind::WriteFailed)
    }

    /// Check if the UART read failed
    pub fn is_read_failed(&self) -> bool {
        matches!(self.kind, TransportErrorKind::ReadFailed)
    }

    /// Check if driving the flow-control pin failed
    pub fn is_flow_control_failed(&self) -> bool {
        matches!(self.kind, TransportErrorKind::FlowControlFailed)
    }
}

// =============================================================================
// Convenience Constructors for LgapError
// =============================================================================

impl LgapError {
    // Framing errors
    pub(crate) fn stalled() -> Self {
        Self::Framing(FramingError::new(FramingErrorKind::Stalled))
    }

    pub(crate) fn resync() -> Self {
        Self::Framing(FramingError::new(FramingErrorKind::Resync))
    }

    // Malformed frames
    pub(crate) fn invalid_length() -> Self {
        Self::MalformedFrame(MalformedFrameError::new(MalformedFrameKind::InvalidLength))
    }

    pub(crate) fn unknown_lead_byte() -> Self {
        Self::MalformedFrame(MalformedFrameError::new(MalformedFrameKind::UnknownLeadByte))
    }

    pub(crate) fn invalid_checksum() -> Self {
        Self::MalformedFrame(MalformedFrameError::new(MalformedFrameKind::InvalidChecksum))
    }

    pub(crate) fn zone_out_of_range() -> Self {
        Self::MalformedFrame(MalformedFrameError::new(MalformedFrameKind::ZoneOutOfRange))
    }

    // Configuration errors
    pub(crate) fn cooling_max_power_out_of_range() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::CoolingMaxPowerOutOfRange))
    }

    pub(crate) fn heating_max_power_out_of_range() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::HeatingMaxPowerOutOfRange))
    }

    pub(crate) fn power_multiplier_out_of_range() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::PowerMultiplierOutOfRange))
    }

    pub(crate) fn zero_wait_time() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::ZeroWaitTime))
    }

    pub(crate) fn zero_publish_interval() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::ZeroPublishInterval))
    }

    pub(crate) fn lead_bytes_collide() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::LeadBytesCollide))
    }

    pub(crate) fn name_too_long() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::NameTooLong))
    }

    // Transport errors
    pub(crate) fn read_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::ReadFailed))
    }

    pub(crate) fn write_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::WriteFailed))
    }

    pub(crate) fn flow_control_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::FlowControlFailed))
    }

    /// True for errors that must prevent the bus from starting.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LgapError::DuplicateZone { .. } | LgapError::Config(_) | LgapError::RegistryFull
        )
    }
}

// =============================================================================
// Display Implementation
// =============================================================================

impl fmt::Display for LgapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LgapError::Framing(e) => write!(f, "Framing error: {:?}", e.kind),
            LgapError::MalformedFrame(e) => write!(f, "Malformed frame: {:?}", e.kind),
            LgapError::DuplicateZone { zone } => write!(f, "Zone {zone} is already registered"),
            LgapError::UnroutableFrame { zone } => write!(f, "No handler for zone {zone}"),
            LgapError::InvalidTimerValue { minutes } => {
                write!(f, "Sleep timer value {minutes} outside 0..=420 minutes")
            }
            LgapError::Config(e) => write!(f, "Configuration error: {:?}", e.kind),
            LgapError::Transport(e) => write!(f, "Transport error: {:?}", e.kind),
            LgapError::RegistryFull => write!(f, "Zone registry is full"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LgapError {}
