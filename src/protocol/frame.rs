//! Raw 16-byte LGAP frame.
//!
//! ## Frame Structure
//!
//! ```text
//! ┌──────┬───────┬────────┬──────┬──────┬──────┬──────┬────────┐
//! │ Lead │ Flags │ Req id │  b3  │ Zone │  b5  │  Op  │ Target │
//! │  0   │   1   │   2    │  3   │  4   │  5   │  6   │   7    │
//! ├──────┼───────┼────────┼──────┼──────┼──────┼──────┼────────┤
//! │ Room │ Pipe  │ Pipe   │ Zone │ Zone │ Zone │ ODU  │ Check  │
//! │ temp │  in   │  out   │ load │ pwr  │design│ load │  sum   │
//! │  8   │   9   │   10   │  11  │  12  │  13  │  14  │   15   │
//! └──────┴───────┴────────┴──────┴──────┴──────┴──────┴────────┘
//! ```
//!
//! The checksum is the byte sum of offsets 0..15, XOR `0x55`.
//!
//! ## Example
//!
//! ```
//! use lgap_bus::protocol::frame::{Direction, Frame, LeadBytes};
//!
//! let mut raw = [0u8; 16];
//! raw[0] = 0x10;
//! raw[4] = 2;
//! let frame = Frame::sealed(raw);
//!
//! assert_eq!(frame.validate(&LeadBytes::default()).unwrap(), Direction::Response);
//! ```

use crate::addressing::ZoneNumber;
use crate::error::{LgapError, Result};
use crate::protocol::constants::{
    CHECKSUM_XOR, DEFAULT_RX_LEAD, DEFAULT_TX_LEAD, FRAME_LEN, OFFSET_CHECKSUM, OFFSET_LEAD,
    OFFSET_ZONE,
};

/// Which side of the bus produced a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Sent by a bus master (us, another master, or our own echo)
    Request,
    /// Status returned by an indoor unit
    Response,
}

/// The pair of lead bytes that tell requests and responses apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LeadBytes {
    /// Lead byte of master requests
    pub tx: u8,
    /// Lead byte of unit responses
    pub rx: u8,
}

impl Default for LeadBytes {
    fn default() -> Self {
        Self {
            tx: DEFAULT_TX_LEAD,
            rx: DEFAULT_RX_LEAD,
        }
    }
}

impl LeadBytes {
    /// Map a lead byte to its direction, if it belongs to either class.
    #[inline]
    pub const fn classify(&self, lead: u8) -> Option<Direction> {
        if lead == self.rx {
            Some(Direction::Response)
        } else if lead == self.tx {
            Some(Direction::Request)
        } else {
            None
        }
    }

    /// Lead byte used when encoding a frame in the given direction.
    #[inline]
    pub const fn lead_for(&self, direction: Direction) -> u8 {
        match direction {
            Direction::Request => self.tx,
            Direction::Response => self.rx,
        }
    }

    /// Check whether `byte` can start a frame.
    #[inline]
    pub const fn is_lead(&self, byte: u8) -> bool {
        byte == self.tx || byte == self.rx
    }
}

/// Compute the LGAP checksum over the first 15 bytes of `bytes`.
///
/// Shorter input is summed as-is.
pub fn checksum(bytes: &[u8]) -> u8 {
    let end = bytes.len().min(OFFSET_CHECKSUM);
    bytes[..end]
        .iter()
        .fold(0u8, |acc, &b| acc.wrapping_add(b))
        ^ CHECKSUM_XOR
}

/// One complete 16-byte frame, not yet validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    bytes: [u8; FRAME_LEN],
}

impl Frame {
    /// Frame length in bytes
    pub const LEN: usize = FRAME_LEN;

    /// Wrap raw bytes exactly as received.
    pub const fn from_array(bytes: [u8; FRAME_LEN]) -> Self {
        Self { bytes }
    }

    /// Copy a frame out of a slice.
    ///
    /// # Errors
    ///
    /// Returns `MalformedFrame` if `data` is not exactly 16 bytes long.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let bytes: [u8; FRAME_LEN] = data
            .try_into()
            .map_err(|_| LgapError::invalid_length())?;
        Ok(Self { bytes })
    }

    /// Wrap raw bytes and overwrite byte 15 with the correct checksum.
    pub fn sealed(mut bytes: [u8; FRAME_LEN]) -> Self {
        bytes[OFFSET_CHECKSUM] = checksum(&bytes);
        Self { bytes }
    }

    /// Raw frame bytes.
    #[inline(always)]
    pub const fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }

    /// Byte at `offset`, or 0 past the end of the frame.
    #[inline(always)]
    pub const fn byte(&self, offset: usize) -> u8 {
        if offset < FRAME_LEN {
            self.bytes[offset]
        } else {
            0
        }
    }

    /// Lead byte
    #[inline(always)]
    pub const fn lead(&self) -> u8 {
        self.bytes[OFFSET_LEAD]
    }

    /// Checksum byte as carried by the frame
    #[inline(always)]
    pub const fn checksum(&self) -> u8 {
        self.bytes[OFFSET_CHECKSUM]
    }

    /// Check whether the carried checksum matches the contents.
    pub fn checksum_ok(&self) -> bool {
        checksum(&self.bytes) == self.checksum()
    }

    /// Run the structural checks shared by the framer and the decoder.
    ///
    /// Order: lead byte, checksum, zone range.
    ///
    /// # Errors
    ///
    /// Returns `MalformedFrame` naming the first check that failed.
    pub fn validate(&self, leads: &LeadBytes) -> Result<Direction> {
        let direction = leads
            .classify(self.lead())
            .ok_or_else(LgapError::unknown_lead_byte)?;

        if !self.checksum_ok() {
            return Err(LgapError::invalid_checksum());
        }

        if !ZoneNumber::is_valid(self.bytes[OFFSET_ZONE]) {
            return Err(LgapError::zone_out_of_range());
        }

        Ok(direction)
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(zone: u8) -> Frame {
        let mut raw = [0u8; FRAME_LEN];
        raw[0] = DEFAULT_RX_LEAD;
        raw[OFFSET_ZONE] = zone;
        raw[8] = 0x78;
        Frame::sealed(raw)
    }

    #[test]
    fn test_byte_past_end_is_zero() {
        let frame = response(7);
        assert_eq!(frame.byte(OFFSET_ZONE), 7);
        assert_eq!(frame.byte(FRAME_LEN - 1), frame.checksum());
        assert_eq!(frame.byte(FRAME_LEN), 0);
        assert_eq!(frame.byte(usize::MAX), 0);
    }

    #[test]
    fn test_checksum_known_value() {
        // 0x10 + 0x02 + 0x78 = 0x8A, ^ 0x55 = 0xDF
        let frame = response(2);
        assert_eq!(frame.checksum(), 0xDF);
        assert!(frame.checksum_ok());
    }

    #[test]
    fn test_checksum_wraps() {
        let raw = [0xFFu8; FRAME_LEN];
        // 15 * 0xFF = 0xEF1, low byte 0xF1, ^ 0x55 = 0xA4
        assert_eq!(checksum(&raw), 0xA4);
    }

    #[test]
    fn test_classify() {
        let leads = LeadBytes::default();
        assert_eq!(leads.classify(0x10), Some(Direction::Response));
        assert_eq!(leads.classify(0x80), Some(Direction::Request));
        assert_eq!(leads.classify(0x55), None);
        assert_eq!(leads.lead_for(Direction::Request), 0x80);
    }

    #[test]
    fn test_validate_ok() {
        assert_eq!(
            response(5).validate(&LeadBytes::default()).unwrap(),
            Direction::Response
        );
    }

    #[test]
    fn test_validate_bad_checksum() {
        let mut raw = *response(5).as_bytes();
        raw[OFFSET_CHECKSUM] ^= 0x01;
        let err = Frame::from_array(raw)
            .validate(&LeadBytes::default())
            .unwrap_err();
        assert!(matches!(err, LgapError::MalformedFrame(ref e) if e.is_invalid_checksum()));
    }

    #[test]
    fn test_validate_unknown_lead() {
        let mut raw = *response(5).as_bytes();
        raw[0] = 0x42;
        let err = Frame::sealed(raw)
            .validate(&LeadBytes::default())
            .unwrap_err();
        assert!(matches!(err, LgapError::MalformedFrame(ref e) if e.is_unknown_lead_byte()));
    }

    #[test]
    fn test_validate_zone_out_of_range() {
        let err = response(64).validate(&LeadBytes::default()).unwrap_err();
        assert!(matches!(err, LgapError::MalformedFrame(ref e) if e.is_zone_out_of_range()));
    }

    #[test]
    fn test_from_slice_length() {
        assert!(Frame::from_slice(&[0u8; 15]).is_err());
        assert!(Frame::from_slice(&[0u8; 17]).is_err());
        assert!(Frame::from_slice(&[0u8; 16]).is_ok());
    }
}
