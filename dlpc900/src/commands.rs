//! USB command codes
//!
//! Codes are 16 bits and travel little-endian right after the frame header.
//! The sequence bytes below are the ones each command is sent with; replies
//! echo them back.

// ============================================================================
// Status
// ============================================================================

/// Generic error check: byte 0 of the reply is the last error code.
pub const CMD_ERROR_CHECK: u16 = 0x0100;
/// Hardware status bit field.
pub const CMD_HARDWARE_STATUS: u16 = 0x1A0A;
/// System status bit field (internal memory test).
pub const CMD_SYSTEM_STATUS: u16 = 0x1A0B;
/// Main status bit field (mirrors, sequencer, source lock, syncs).
pub const CMD_MAIN_STATUS: u16 = 0x1A0C;
/// Controller-to-DMD communication status.
pub const CMD_COMMUNICATION_STATUS: u16 = 0x1A49;
/// Hardware product code and firmware tag.
pub const CMD_HARDWARE_INFO: u16 = 0x0206;

// ============================================================================
// Power
// ============================================================================

/// Standby (1), wake up (0) or reset (2).
pub const CMD_POWER: u16 = 0x0200;
/// Idle on (1) or off (3).
pub const CMD_IDLE: u16 = 0x0201;

// ============================================================================
// Display
// ============================================================================

/// Long-axis image flip.
pub const CMD_LONG_AXIS_FLIP: u16 = 0x1008;
/// Short-axis image flip.
pub const CMD_SHORT_AXIS_FLIP: u16 = 0x1009;
/// Input source selection.
pub const CMD_INPUT_SOURCE: u16 = 0x1A00;
/// Source-lock power: release (0), HDMI (1), DisplayPort (2).
pub const CMD_SOURCE_LOCK: u16 = 0x1A01;
/// Pixel clock and port configuration.
pub const CMD_PORT_CONFIG: u16 = 0x1A03;
/// Display mode get/set.
pub const CMD_DISPLAY_MODE: u16 = 0x1A1B;

// ============================================================================
// Pattern sequences
// ============================================================================

/// Pattern sequence start (2), pause (1) or stop (0).
pub const CMD_PATTERN_CONTROL: u16 = 0x1A24;
/// Image slot declaration before a bulk load.
pub const CMD_IMAGE_SLOT: u16 = 0x1A2A;
/// Bulk bitmap load, one sub-chunk per frame.
pub const CMD_BITMAP_LOAD: u16 = 0x1A2B;
/// LUT playback configuration (pattern count, repeat count).
pub const CMD_LUT_CONFIG: u16 = 0x1A31;
/// LUT entry definition.
pub const CMD_LUT_ENTRY: u16 = 0x1A34;

// ============================================================================
// Sequence bytes
// ============================================================================

pub const SEQ_DEFAULT: u8 = 0x00;
pub const SEQ_LUT: u8 = 0x01;
pub const SEQ_PORT: u8 = 0x02;
pub const SEQ_PATTERN_CONTROL: u8 = 0x05;
pub const SEQ_STATUS: u8 = 0x0A;
pub const SEQ_BITMAP_LOAD: u8 = 0x11;
pub const SEQ_ERROR_CHECK: u8 = 0x22;
