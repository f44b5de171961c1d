//! Zone handlers and the registry that owns them.

pub mod handler;
pub mod registry;

pub use handler::ZoneHandler;
pub use registry::ZoneRegistry;

/// Most zones one bus can serve. A PI485 gateway drives at most 16 indoor units.
pub const MAX_ZONES: usize = 16;
