//! LGAP bus addressing.
//!
//! Every indoor unit on the bus is addressed by a small zone number carried
//! in byte 4 of each frame. One bus, many zones, one handler per zone.

pub mod zone;

pub use zone::ZoneNumber;
