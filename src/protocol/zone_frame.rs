//! Decoded view of one frame, addressed to one zone.
//!
//! [`decode`] is pure: it never looks at handler state, so the same frame
//! always decodes to the same [`ZoneFrame`]. [`ZoneFrame::encode`] is its
//! inverse.
//!
//! ## Example
//!
//! ```
//! use lgap_bus::protocol::frame::LeadBytes;
//! use lgap_bus::protocol::zone_frame::{decode, ZoneFrame};
//! use lgap_bus::climate::ClimateMode;
//! use lgap_bus::zone;
//!
//! let leads = LeadBytes::default();
//! let mut status = ZoneFrame::response(zone!(2));
//! status.flags = 0x01;      // powered
//! status.operation = 0x44;  // heat, fan auto
//! status.target_code = 7;   // 22 °C
//! status.room_temp_raw = 129;
//!
//! let decoded = decode(&status.encode(&leads), &leads).unwrap();
//! assert_eq!(decoded.mode(), ClimateMode::Heat);
//! assert_eq!(decoded.target_temperature(), 22);
//! assert_eq!(decoded.room_temperature(), 21);
//! ```

use crate::addressing::ZoneNumber;
use crate::climate::{ClimateMode, FanMode, SwingMode};
use crate::error::Result;
use crate::protocol::constants::{
    FAN_MASK, FAN_SHIFT, FLAG_POWER, FLAG_WRITE, FRAME_LEN, MODE_MASK, OFFSET_BYTE_3,
    OFFSET_BYTE_5, OFFSET_FLAGS, OFFSET_LEAD, OFFSET_LOAD_BYTE, OFFSET_ODU_TOTAL_LOAD,
    OFFSET_OPERATION, OFFSET_PIPE_IN, OFFSET_PIPE_OUT, OFFSET_REQUEST_ID, OFFSET_ROOM_TEMP,
    OFFSET_TARGET, OFFSET_ZONE, OFFSET_ZONE_ACTIVE_LOAD, OFFSET_ZONE_DESIGN_LOAD,
    OFFSET_ZONE_POWER_STATE, SWING_SHIFT, TARGET_TEMP_OFFSET, TEMP_RAW_PER_DEGREE,
    TEMP_RAW_ZERO,
};
use crate::protocol::frame::{Direction, Frame, LeadBytes};

/// One named raw field per frame byte. The checksum is validated on decode
/// and recomputed on encode, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ZoneFrame {
    pub direction: Direction,
    /// Offset 1
    pub flags: u8,
    /// Offset 2
    pub request_id: u8,
    /// Offset 3, meaning unknown
    pub byte3: u8,
    /// Offset 4
    pub zone: ZoneNumber,
    /// Offset 5, unit error/service code
    pub byte5: u8,
    /// Offset 6, mode/swing/fan
    pub operation: u8,
    /// Offset 7, setpoint minus 15 in the low nibble
    pub target_code: u8,
    /// Offset 8
    pub room_temp_raw: u8,
    /// Offset 9
    pub pipe_in_raw: u8,
    /// Offset 10
    pub pipe_out_raw: u8,
    /// Offset 11
    pub zone_active_load: u8,
    /// Offset 12
    pub zone_power_state: u8,
    /// Offset 13
    pub zone_design_load: u8,
    /// Offset 14
    pub odu_total_load: u8,
}

/// Decode a raw frame.
///
/// # Errors
///
/// Returns `MalformedFrame` for an unknown lead byte, a bad checksum or a
/// zone byte above [`ZoneNumber::MAX`].
pub fn decode(frame: &Frame, leads: &LeadBytes) -> Result<ZoneFrame> {
    let direction = frame.validate(leads)?;
    let b = frame.as_bytes();

    Ok(ZoneFrame {
        direction,
        flags: b[OFFSET_FLAGS],
        request_id: b[OFFSET_REQUEST_ID],
        byte3: b[OFFSET_BYTE_3],
        zone: ZoneNumber::new(b[OFFSET_ZONE])?,
        byte5: b[OFFSET_BYTE_5],
        operation: b[OFFSET_OPERATION],
        target_code: b[OFFSET_TARGET],
        room_temp_raw: b[OFFSET_ROOM_TEMP],
        pipe_in_raw: b[OFFSET_PIPE_IN],
        pipe_out_raw: b[OFFSET_PIPE_OUT],
        zone_active_load: b[OFFSET_ZONE_ACTIVE_LOAD],
        zone_power_state: b[OFFSET_ZONE_POWER_STATE],
        zone_design_load: b[OFFSET_ZONE_DESIGN_LOAD],
        odu_total_load: b[OFFSET_ODU_TOTAL_LOAD],
    })
}

/// Decode a frame straight from a byte slice.
///
/// # Errors
///
/// As [`decode`], plus `MalformedFrame` when `data` is not 16 bytes long.
pub fn decode_bytes(data: &[u8], leads: &LeadBytes) -> Result<ZoneFrame> {
    decode(&Frame::from_slice(data)?, leads)
}

impl ZoneFrame {
    /// All-zero response frame for `zone`.
    pub const fn response(zone: ZoneNumber) -> Self {
        Self::blank(Direction::Response, zone)
    }

    /// All-zero request frame for `zone`.
    pub const fn request(zone: ZoneNumber) -> Self {
        Self::blank(Direction::Request, zone)
    }

    const fn blank(direction: Direction, zone: ZoneNumber) -> Self {
        Self {
            direction,
            flags: 0,
            request_id: 0,
            byte3: 0,
            zone,
            byte5: 0,
            operation: 0,
            target_code: 0,
            room_temp_raw: 0,
            pipe_in_raw: 0,
            pipe_out_raw: 0,
            zone_active_load: 0,
            zone_power_state: 0,
            zone_design_load: 0,
            odu_total_load: 0,
        }
    }

    /// Encode into a sealed 16-byte frame.
    pub fn encode(&self, leads: &LeadBytes) -> Frame {
        let mut b = [0u8; FRAME_LEN];
        b[OFFSET_LEAD] = leads.lead_for(self.direction);
        b[OFFSET_FLAGS] = self.flags;
        b[OFFSET_REQUEST_ID] = self.request_id;
        b[OFFSET_BYTE_3] = self.byte3;
        b[OFFSET_ZONE] = self.zone.raw();
        b[OFFSET_BYTE_5] = self.byte5;
        b[OFFSET_OPERATION] = self.operation;
        b[OFFSET_TARGET] = self.target_code;
        b[OFFSET_ROOM_TEMP] = self.room_temp_raw;
        b[OFFSET_PIPE_IN] = self.pipe_in_raw;
        b[OFFSET_PIPE_OUT] = self.pipe_out_raw;
        b[OFFSET_ZONE_ACTIVE_LOAD] = self.zone_active_load;
        b[OFFSET_ZONE_POWER_STATE] = self.zone_power_state;
        b[OFFSET_ZONE_DESIGN_LOAD] = self.zone_design_load;
        b[OFFSET_ODU_TOTAL_LOAD] = self.odu_total_load;
        Frame::sealed(b)
    }

    // =========================================================================
    // Typed accessors
    // =========================================================================

    /// Unit reports itself powered on.
    #[inline]
    pub const fn power_on(&self) -> bool {
        self.flags & FLAG_POWER != 0
    }

    /// Request carries new control values.
    #[inline]
    pub const fn is_write(&self) -> bool {
        self.flags & FLAG_WRITE != 0
    }

    /// Raw 3-bit mode code.
    #[inline]
    pub const fn mode_code(&self) -> u8 {
        self.operation & MODE_MASK
    }

    /// Combined power + mode. Unknown mode codes read as `Off`.
    pub const fn mode(&self) -> ClimateMode {
        if !self.power_on() {
            return ClimateMode::Off;
        }
        match ClimateMode::from_code(self.mode_code()) {
            Some(mode) => mode,
            None => ClimateMode::Off,
        }
    }

    /// Raw 3-bit fan code.
    #[inline]
    pub const fn fan_code(&self) -> u8 {
        (self.operation >> FAN_SHIFT) & FAN_MASK
    }

    /// Fan speed, `None` for the "no change" code.
    pub const fn fan(&self) -> Option<FanMode> {
        FanMode::from_code(self.fan_code())
    }

    /// Louver swing.
    pub const fn swing(&self) -> SwingMode {
        SwingMode::from_bit((self.operation >> SWING_SHIFT) & 1 != 0)
    }

    /// Setpoint (°C).
    pub const fn target_temperature(&self) -> u8 {
        (self.target_code & 0x0F) + TARGET_TEMP_OFFSET
    }

    /// Room temperature (°C), whole degrees.
    pub fn room_temperature(&self) -> i16 {
        (TEMP_RAW_ZERO - i16::from(self.room_temp_raw)) / TEMP_RAW_PER_DEGREE
    }

    /// Pipe-in temperature (°C).
    pub fn pipe_in_temperature(&self) -> f32 {
        raw_to_celsius(self.pipe_in_raw)
    }

    /// Pipe-out temperature (°C).
    pub fn pipe_out_temperature(&self) -> f32 {
        raw_to_celsius(self.pipe_out_raw)
    }

    /// The 0-255 duty proxy used for power estimation.
    #[inline]
    pub const fn load_byte(&self) -> u8 {
        self.byte_at(OFFSET_LOAD_BYTE)
    }

    /// Unit error/service code, 0 when healthy.
    #[inline]
    pub const fn error_code(&self) -> u8 {
        self.byte5
    }

    /// Raw field by frame offset. Offsets 0 and 15 and anything past the
    /// frame read as 0.
    pub const fn byte_at(&self, offset: usize) -> u8 {
        match offset {
            OFFSET_FLAGS => self.flags,
            OFFSET_REQUEST_ID => self.request_id,
            OFFSET_BYTE_3 => self.byte3,
            OFFSET_ZONE => self.zone.raw(),
            OFFSET_BYTE_5 => self.byte5,
            OFFSET_OPERATION => self.operation,
            OFFSET_TARGET => self.target_code,
            OFFSET_ROOM_TEMP => self.room_temp_raw,
            OFFSET_PIPE_IN => self.pipe_in_raw,
            OFFSET_PIPE_OUT => self.pipe_out_raw,
            OFFSET_ZONE_ACTIVE_LOAD => self.zone_active_load,
            OFFSET_ZONE_POWER_STATE => self.zone_power_state,
            OFFSET_ZONE_DESIGN_LOAD => self.zone_design_load,
            OFFSET_ODU_TOTAL_LOAD => self.odu_total_load,
            _ => 0,
        }
    }
}

fn raw_to_celsius(raw: u8) -> f32 {
    f32::from(TEMP_RAW_ZERO - i16::from(raw)) / f32::from(TEMP_RAW_PER_DEGREE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LgapError;
    use crate::zone;
    use proptest::prelude::*;

    // Captured status frame: zone 1, powered, cool, fan high, 22 °C
    const CAPTURED: [u8; 16] = [
        0x10, 0x01, 0xFA, 0x00, 0x01, 0x00, 0x30, 0x07, 0x81, 0x96, 0x90, 0xCC, 0x00, 0x0C, 0x24,
        0x00,
    ];

    fn captured() -> Frame {
        Frame::sealed(CAPTURED)
    }

    #[test]
    fn test_decode_captured() {
        let z = decode(&captured(), &LeadBytes::default()).unwrap();
        assert_eq!(z.direction, Direction::Response);
        assert_eq!(z.zone.raw(), 1);
        assert_eq!(z.request_id, 0xFA);
        assert!(z.power_on());
        assert_eq!(z.mode(), ClimateMode::Cool);
        assert_eq!(z.fan(), Some(FanMode::High));
        assert_eq!(z.swing(), SwingMode::Off);
        assert_eq!(z.target_temperature(), 22);
        // (192 - 129) / 3 = 21
        assert_eq!(z.room_temperature(), 21);
        // (192 - 150) / 3 = 14.0
        assert!((z.pipe_in_temperature() - 14.0).abs() < 1e-4);
        assert_eq!(z.load_byte(), 0xCC);
        assert_eq!(z.zone_design_load, 12);
        assert_eq!(z.odu_total_load, 36);
    }

    #[test]
    fn test_round_trip() {
        let leads = LeadBytes::default();
        let z = decode(&captured(), &leads).unwrap();
        assert_eq!(z.encode(&leads), captured());
        assert_eq!(decode(&z.encode(&leads), &leads).unwrap(), z);
    }

    #[test]
    fn test_powered_off_reads_off() {
        let mut z = ZoneFrame::response(zone!(0));
        z.operation = 0x04;
        assert_eq!(z.mode(), ClimateMode::Off);
        z.flags = FLAG_POWER;
        assert_eq!(z.mode(), ClimateMode::Heat);
    }

    #[test]
    fn test_invalid_mode_reads_off() {
        let mut z = ZoneFrame::response(zone!(0));
        z.flags = FLAG_POWER;
        z.operation = 0x07;
        assert_eq!(z.mode(), ClimateMode::Off);
    }

    #[test]
    fn test_swing_and_fan_zero() {
        let mut z = ZoneFrame::response(zone!(0));
        z.operation = 0x08;
        assert_eq!(z.swing(), SwingMode::Vertical);
        assert_eq!(z.fan(), None);
    }

    #[test]
    fn test_room_temperature_above_zero_raw() {
        let mut z = ZoneFrame::response(zone!(0));
        z.room_temp_raw = 200;
        // (192 - 200) / 3 truncates toward zero
        assert_eq!(z.room_temperature(), -2);
    }

    #[test]
    fn test_request_direction_uses_tx_lead() {
        let leads = LeadBytes { tx: 0xA0, rx: 0x10 };
        let frame = ZoneFrame::request(zone!(5)).encode(&leads);
        assert_eq!(frame.lead(), 0xA0);
        assert_eq!(decode(&frame, &leads).unwrap().direction, Direction::Request);
    }

    #[test]
    fn test_decode_rejects_checksum() {
        let mut raw = *captured().as_bytes();
        raw[8] = raw[8].wrapping_add(1);
        let err = decode(&Frame::from_array(raw), &LeadBytes::default()).unwrap_err();
        assert!(matches!(err, LgapError::MalformedFrame(ref e) if e.is_invalid_checksum()));
    }

    #[test]
    fn test_decode_bytes_length() {
        let err = decode_bytes(&CAPTURED[..15], &LeadBytes::default()).unwrap_err();
        assert!(matches!(err, LgapError::MalformedFrame(ref e) if e.is_invalid_length()));
    }

    #[test]
    fn test_byte_at_matches_wire() {
        let frame = captured();
        let z = decode(&frame, &LeadBytes::default()).unwrap();
        for offset in 1..15 {
            assert_eq!(z.byte_at(offset), frame.byte(offset), "offset {offset}");
        }
    }

    fn direction_strategy() -> impl Strategy<Value = Direction> {
        prop_oneof![Just(Direction::Request), Just(Direction::Response)]
    }

    proptest! {
        #[test]
        fn prop_encode_then_decode_is_identity(
            direction in direction_strategy(),
            zone in 0u8..=ZoneNumber::MAX,
            bytes in any::<[u8; 13]>(),
        ) {
            let zone = ZoneNumber::new(zone).unwrap();
            let z = ZoneFrame {
                direction,
                flags: bytes[0],
                request_id: bytes[1],
                byte3: bytes[2],
                zone,
                byte5: bytes[3],
                operation: bytes[4],
                target_code: bytes[5],
                room_temp_raw: bytes[6],
                pipe_in_raw: bytes[7],
                pipe_out_raw: bytes[8],
                zone_active_load: bytes[9],
                zone_power_state: bytes[10],
                zone_design_load: bytes[11],
                odu_total_load: bytes[12],
            };
            let leads = LeadBytes::default();

            let decoded = decode(&z.encode(&leads), &leads);
            prop_assert!(decoded.is_ok());
            prop_assert_eq!(decoded.unwrap(), z);
        }
    }
}
