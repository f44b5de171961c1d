//! Unified Logging Macros for lgap-bus
//!
//! This module provides a unified logging interface that automatically
//! selects between `defmt::` and `log::` based on the active feature flags.
//!
//! # Usage
//!
//! ```rust,ignore
//! lgap_log!(info, "Sleep timer set for {} minutes", minutes);
//! lgap_log!(debug, "Dispatching frame for zone {}", zone);
//! lgap_log!(warn, "Zone {} error code: {}", zone, code);
//! ```
//!
//! # Feature Flags
//!
//! - `defmt` - Uses `defmt::` (preferred on target, wins when both are on)
//! - `log` - Uses `log::` (default, for host builds and tests)
//! - neither - logging is compiled out, arguments are still type-checked
//!
//! Format strings must stay in the `{}` subset understood by both backends.

/// Unified logging macro - automatically selects defmt:: or log:: based on features
#[macro_export]
#[cfg(feature = "defmt")]
macro_rules! lgap_log {
    (info, $($arg:tt)*) => { defmt::info!($($arg)*) };
    (debug, $($arg:tt)*) => { defmt::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { defmt::warn!($($arg)*) };
    (error, $($arg:tt)*) => { defmt::error!($($arg)*) };
    (trace, $($arg:tt)*) => { defmt::trace!($($arg)*) };
}

#[macro_export]
#[cfg(all(feature = "log", not(feature = "defmt")))]
macro_rules! lgap_log {
    (info, $($arg:tt)*) => { log::info!(target: "lgap", $($arg)*) };
    (debug, $($arg:tt)*) => { log::debug!(target: "lgap", $($arg)*) };
    (warn, $($arg:tt)*) => { log::warn!(target: "lgap", $($arg)*) };
    (error, $($arg:tt)*) => { log::error!(target: "lgap", $($arg)*) };
    (trace, $($arg:tt)*) => { log::trace!(target: "lgap", $($arg)*) };
}

#[macro_export]
#[cfg(not(any(feature = "log", feature = "defmt")))]
macro_rules! lgap_log {
    ($level:ident, $($arg:tt)*) => {{
        let _ = core::format_args!($($arg)*);
    }};
}
