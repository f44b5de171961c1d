//! LGAP wire constants and byte offsets.

/// Every LGAP frame is exactly this long, in both directions.
pub const FRAME_LEN: usize = 16;

/// Default lead byte of frames sent by a bus master.
pub const DEFAULT_TX_LEAD: u8 = 0x80;

/// Default lead byte of status frames returned by indoor units.
pub const DEFAULT_RX_LEAD: u8 = 0x10;

/// XOR mask applied to the byte sum to form the checksum.
pub const CHECKSUM_XOR: u8 = 0x55;

/// Offset added to the low nibble of the target byte (°C).
pub const TARGET_TEMP_OFFSET: u8 = 15;

/// Raw value that maps to 0 °C in the room/pipe temperature bytes.
pub const TEMP_RAW_ZERO: i16 = 192;

/// Raw counts per °C in the room/pipe temperature bytes.
pub const TEMP_RAW_PER_DEGREE: i16 = 3;

// =============================================================================
// Byte offsets
// =============================================================================

/// Lead / direction byte
pub const OFFSET_LEAD: usize = 0;
/// Status flags (bit 0 power, bit 1 write request)
pub const OFFSET_FLAGS: usize = 1;
/// Request id, echoed back by the unit
pub const OFFSET_REQUEST_ID: usize = 2;
/// Unknown byte, exposed for protocol analysis
pub const OFFSET_BYTE_3: usize = 3;
/// Zone number
pub const OFFSET_ZONE: usize = 4;
/// Unit error/service code, exposed for protocol analysis
pub const OFFSET_BYTE_5: usize = 5;
/// Mode (bits 0-2), swing (bit 3), fan (bits 4-6)
pub const OFFSET_OPERATION: usize = 6;
/// Target temperature code (low nibble)
pub const OFFSET_TARGET: usize = 7;
/// Room temperature raw
pub const OFFSET_ROOM_TEMP: usize = 8;
/// Pipe-in temperature raw
pub const OFFSET_PIPE_IN: usize = 9;
/// Pipe-out temperature raw
pub const OFFSET_PIPE_OUT: usize = 10;
/// Zone active load (LonWorks nvoLoadEstimate)
pub const OFFSET_ZONE_ACTIVE_LOAD: usize = 11;
/// Zone power state (LonWorks nvoOnOff)
pub const OFFSET_ZONE_POWER_STATE: usize = 12;
/// Zone design load (LonWorks nciRatedCapacity)
pub const OFFSET_ZONE_DESIGN_LOAD: usize = 13;
/// ODU total load (LonWorks nvoThermalLoad)
pub const OFFSET_ODU_TOTAL_LOAD: usize = 14;
/// Checksum
pub const OFFSET_CHECKSUM: usize = 15;

/// Byte used as the 0-255 duty proxy for power estimation.
pub const OFFSET_LOAD_BYTE: usize = OFFSET_ZONE_ACTIVE_LOAD;

// =============================================================================
// Bit fields
// =============================================================================

/// Flags bit: unit powered on
pub const FLAG_POWER: u8 = 0x01;
/// Flags bit: command carries new control values
pub const FLAG_WRITE: u8 = 0x02;

/// Operation byte: mode mask
pub const MODE_MASK: u8 = 0x07;
/// Operation byte: swing bit position
pub const SWING_SHIFT: u8 = 3;
/// Operation byte: fan speed position
pub const FAN_SHIFT: u8 = 4;
/// Operation byte: fan speed mask (after shift)
pub const FAN_MASK: u8 = 0x07;
