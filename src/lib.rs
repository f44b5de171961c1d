#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![doc = include_str!("../README.md")]

//! # lgap-bus
//!
//! LGAP bus engine for LG multi-zone HVAC controllers.
//!
//! This crate provides a `no_std` master for the fixed 16-byte LGAP serial
//! protocol, designed to run from a single cooperative poll loop on an
//! embedded microcontroller.
//!
//! ## Features
//!
//! - Byte-stream framing with resync and stall recovery
//! - Per-zone climate state, pipe temperatures and load bytes
//! - Heuristic power estimate per zone and for the whole system
//! - Per-zone sleep timer that turns the unit off on expiry
//! - `embedded-io` UART and `embedded-hal` flow-control pin seams
//! - Optional async loop with Embassy
//!
//! ## Example
//!
//! ```rust,no_run
//! use lgap_bus::{zone, BusConfig, BusCoordinator, ZoneConfig};
//! # use lgap_bus::serial::MockSerial;
//! # use lgap_bus::publisher::NoopPublisher;
//! # fn main() -> lgap_bus::Result<()> {
//! # let uart = MockSerial::new();
//!
//! let mut bus = BusCoordinator::new(BusConfig::new("lgap")?, uart, NoopPublisher)?;
//! bus.add_zone(ZoneConfig::new(zone!(0), "living_room")?)?;
//!
//! let mut now_ms = 0;
//! loop {
//!     bus.poll(now_ms);
//!     now_ms += 10;
//! #   if now_ms > 100 { break; }
//! }
//! # Ok(())
//! # }
//! ```

// Macro modules (must be declared before use)
#[macro_use]
mod logging;
#[macro_use]
pub mod macros;

pub mod addressing;
pub mod climate;
pub mod config;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod power;
pub mod protocol;
pub mod publisher;
pub mod serial;
pub mod sleep_timer;
pub mod zone;

/// Re-exported so macros can name `heapless` types from downstream crates.
#[doc(hidden)]
pub use heapless;

// Re-export commonly used types
#[doc(inline)]
pub use addressing::ZoneNumber;
#[doc(inline)]
pub use climate::{ClimateCall, ClimateMode, ClimateState, FanMode, SwingMode};
#[doc(inline)]
pub use config::{BusConfig, PowerConfig, ZoneConfig};
#[doc(inline)]
pub use coordinator::{BusCoordinator, BusStats};
#[doc(inline)]
pub use error::{LgapError, Result};
#[doc(inline)]
pub use protocol::{Frame, Framer, LeadBytes, ZoneFrame};
#[doc(inline)]
pub use publisher::StatePublisher;
#[doc(inline)]
pub use sleep_timer::{SleepTimer, TimerEvent};
