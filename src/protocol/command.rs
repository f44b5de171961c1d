//! Master requests sent to indoor units.
//!
//! The controller polls zones one at a time. A *read* request only asks for
//! status; a *write* request also carries the power, mode, swing, fan and
//! setpoint the host wants, with the write flag set in byte 1.
//!
//! Requests use the same 16-byte layout as status frames: unused bytes are
//! zero.

use crate::addressing::ZoneNumber;
use crate::climate::ClimateState;
use crate::protocol::constants::{FAN_SHIFT, FLAG_POWER, FLAG_WRITE, MODE_MASK, SWING_SHIFT};
use crate::protocol::frame::{Frame, LeadBytes};
use crate::protocol::zone_frame::ZoneFrame;

/// First request id used after start-up.
pub const INITIAL_REQUEST_ID: u8 = 250;

/// Whether a request carries new control values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestKind {
    Read,
    Write,
}

/// One poll request for one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Request {
    pub zone: ZoneNumber,
    pub request_id: u8,
    pub kind: RequestKind,
    /// Control values; ignored by the unit for reads but still sent
    pub state: ClimateState,
    /// Mode code sent while `state.mode` is Off
    pub idle_mode_code: u8,
}

impl Request {
    /// Status poll.
    pub const fn read(zone: ZoneNumber, request_id: u8, state: ClimateState) -> Self {
        Self {
            zone,
            request_id,
            kind: RequestKind::Read,
            state,
            idle_mode_code: 0,
        }
    }

    /// Control write.
    pub const fn write(zone: ZoneNumber, request_id: u8, state: ClimateState) -> Self {
        Self {
            zone,
            request_id,
            kind: RequestKind::Write,
            state,
            idle_mode_code: 0,
        }
    }

    /// Mode code to carry when powering off. The unit keeps its mode while
    /// off, so this should be the last mode it ran in.
    #[must_use]
    pub const fn with_idle_mode_code(mut self, code: u8) -> Self {
        self.idle_mode_code = code & MODE_MASK;
        self
    }

    /// Build the request-direction [`ZoneFrame`].
    pub fn to_zone_frame(&self) -> ZoneFrame {
        let mut flags = 0;
        if self.state.power_on() {
            flags |= FLAG_POWER;
        }
        if self.kind == RequestKind::Write {
            flags |= FLAG_WRITE;
        }

        // Powering off keeps the last real mode code; Off has none of its own
        let mode_code = match self.state.mode.code() {
            Some(code) => code,
            None => self.idle_mode_code,
        };
        let operation = mode_code
            | (u8::from(self.state.swing.bit()) << SWING_SHIFT)
            | (self.state.fan.code() << FAN_SHIFT);

        let mut frame = ZoneFrame::request(self.zone);
        frame.flags = flags;
        frame.request_id = self.request_id;
        frame.operation = operation;
        frame.target_code = self.state.target_code();
        frame
    }

    /// Encode into a sealed frame ready for the wire.
    pub fn encode(&self, leads: &LeadBytes) -> Frame {
        self.to_zone_frame().encode(leads)
    }
}

/// Wrapping request-id counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestIds {
    last: u8,
}

impl Default for RequestIds {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestIds {
    /// Counter whose first id is [`INITIAL_REQUEST_ID`].
    pub const fn new() -> Self {
        Self {
            last: INITIAL_REQUEST_ID.wrapping_sub(1),
        }
    }

    /// Advance and return the next id.
    pub fn next_id(&mut self) -> u8 {
        self.last = self.last.wrapping_add(1);
        self.last
    }

    /// Most recently issued id.
    pub const fn last(&self) -> u8 {
        self.last
    }
}
