//! LGAP wire protocol.
//!
//! This module contains the frame layout, the byte-stream framer, the
//! decoder producing [`ZoneFrame`]s and the master request builder.

pub mod command;
pub mod constants;
pub mod frame;
pub mod framer;
pub mod zone_frame;

pub use command::{Request, RequestIds, RequestKind};
pub use frame::{checksum, Direction, Frame, LeadBytes};
pub use framer::{Framer, FramerStats, Frames};
pub use zone_frame::{decode, decode_bytes, ZoneFrame};
