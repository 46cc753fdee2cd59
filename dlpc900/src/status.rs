/*!
Status and error decoding.

The controller reports its health through a handful of single-byte bit
fields and through a numeric error code. This module turns those bytes into
typed values; it performs no I/O.
*/

use crate::bits::{bit, bits_lsb_first};
use crate::error::{DmdError, Result};
use serde::Serialize;
use std::fmt;

/// Error codes returned by the generic error-check command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    BatchFileChecksum,
    DeviceFailure,
    InvalidCommandNumber,
    IncompatibleControllerAndDmd,
    CommandNotAllowed,
    InvalidCommandParameter,
    ItemNotPresent,
    OutOfResource,
    InvalidBmpCompression,
    PatternBitOutOfRange,
    PatternBmpNotPresent,
    DarkTimeOutOfRange,
    SignalDelayOutOfRange,
    ExposureOutOfRange,
    PatternNumberOutOfRange,
    InvalidPatternDefinition,
    ImageAddressOutOfRange,
    Internal,
    /// Any code without a documented meaning
    Undocumented(u8),
}

impl ErrorCode {
    /// Decode the data of an error-check reply
    ///
    /// Returns `None` when no error is pending. An empty reply counts as no
    /// error: the controller intermittently answers this command with no data.
    pub fn from_reply(data: &[u8]) -> Option<Self> {
        match data.first() {
            None | Some(0) => None,
            Some(&code) => Some(Self::from(code)),
        }
    }

    /// Human-readable description of the code
    pub fn message(&self) -> String {
        let text = match self {
            Self::BatchFileChecksum => "Batch file checksum error",
            Self::DeviceFailure => "Device failure",
            Self::InvalidCommandNumber => "Invalid command number",
            Self::IncompatibleControllerAndDmd => "Incompatible controller and DMD combination",
            Self::CommandNotAllowed => "Command not allowed in current mode",
            Self::InvalidCommandParameter => "Invalid command parameter",
            Self::ItemNotPresent => "Item referred by the parameter is not present",
            Self::OutOfResource => "Out of resource (RAM or Flash)",
            Self::InvalidBmpCompression => "Invalid BMP compression type",
            Self::PatternBitOutOfRange => "Pattern bit number out of range",
            Self::PatternBmpNotPresent => "Pattern BMP not present in flash",
            Self::DarkTimeOutOfRange => "Pattern dark time is out of range",
            Self::SignalDelayOutOfRange => "Signal delay parameter is out of range",
            Self::ExposureOutOfRange => "Pattern exposure time is out of range",
            Self::PatternNumberOutOfRange => "Pattern number is out of range",
            Self::InvalidPatternDefinition => "Invalid pattern definition (errors other than 9-15)",
            Self::ImageAddressOutOfRange => "Pattern image memory address is out of range",
            Self::Internal => "Internal Error",
            Self::Undocumented(code) => return format!("undocumented error [{}]", code),
        };
        text.to_string()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl From<u8> for ErrorCode {
    fn from(code: u8) -> Self {
        match code {
            1 => Self::BatchFileChecksum,
            2 => Self::DeviceFailure,
            3 => Self::InvalidCommandNumber,
            4 => Self::IncompatibleControllerAndDmd,
            5 => Self::CommandNotAllowed,
            6 => Self::InvalidCommandParameter,
            7 => Self::ItemNotPresent,
            8 => Self::OutOfResource,
            9 => Self::InvalidBmpCompression,
            10 => Self::PatternBitOutOfRange,
            11 => Self::PatternBmpNotPresent,
            12 => Self::DarkTimeOutOfRange,
            13 => Self::SignalDelayOutOfRange,
            14 => Self::ExposureOutOfRange,
            15 => Self::PatternNumberOutOfRange,
            16 => Self::InvalidPatternDefinition,
            17 => Self::ImageAddressOutOfRange,
            255 => Self::Internal,
            other => Self::Undocumented(other),
        }
    }
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::BatchFileChecksum => 1,
            ErrorCode::DeviceFailure => 2,
            ErrorCode::InvalidCommandNumber => 3,
            ErrorCode::IncompatibleControllerAndDmd => 4,
            ErrorCode::CommandNotAllowed => 5,
            ErrorCode::InvalidCommandParameter => 6,
            ErrorCode::ItemNotPresent => 7,
            ErrorCode::OutOfResource => 8,
            ErrorCode::InvalidBmpCompression => 9,
            ErrorCode::PatternBitOutOfRange => 10,
            ErrorCode::PatternBmpNotPresent => 11,
            ErrorCode::DarkTimeOutOfRange => 12,
            ErrorCode::SignalDelayOutOfRange => 13,
            ErrorCode::ExposureOutOfRange => 14,
            ErrorCode::PatternNumberOutOfRange => 15,
            ErrorCode::InvalidPatternDefinition => 16,
            ErrorCode::ImageAddressOutOfRange => 17,
            ErrorCode::Internal => 255,
            ErrorCode::Undocumented(code) => code,
        }
    }
}

/// Hardware status byte (command 0x1A0A)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HardwareStatus {
    pub raw: u8,
    pub init_ok: bool,
    pub incompatible: bool,
    pub reset_controller_error: bool,
    pub forced_swap_error: bool,
    pub secondary_controller_present: bool,
    pub sequencer_abort_error: bool,
    pub sequencer_error: bool,
}

impl HardwareStatus {
    pub fn from_byte(raw: u8) -> Self {
        Self {
            raw,
            init_ok: bit(raw, 0),
            incompatible: bit(raw, 1),
            reset_controller_error: bit(raw, 2),
            forced_swap_error: bit(raw, 3),
            secondary_controller_present: bit(raw, 4),
            // bit 5 is reserved
            sequencer_abort_error: bit(raw, 6),
            sequencer_error: bit(raw, 7),
        }
    }

    /// Number of bits whose value denotes an error condition
    pub fn error_count(&self) -> usize {
        [
            !self.init_ok,
            self.incompatible,
            self.reset_controller_error,
            self.forced_swap_error,
            self.sequencer_abort_error,
            self.sequencer_error,
        ]
        .iter()
        .filter(|&&flagged| flagged)
        .count()
    }

    pub fn is_healthy(&self) -> bool {
        self.error_count() == 0
    }

    /// Multi-line report with one line per documented bit
    pub fn report(&self) -> String {
        let lines = [
            if self.init_ok {
                "Internal Initialization Successful"
            } else {
                "Internal Initialization Error"
            },
            if self.incompatible {
                "Incompatible Controller or DMD, or wrong firmware loaded on system"
            } else {
                "System is compatible"
            },
            if self.reset_controller_error {
                "DMD Reset Controller Error: Multiple overlapping bias or reset operations are accessing the same DMD block"
            } else {
                "DMD Reset Controller has no errors"
            },
            if self.forced_swap_error {
                "Forced Swap Error occurred"
            } else {
                "No Forced Swap Errors"
            },
            if self.secondary_controller_present {
                "Secondary Controller Present and Ready"
            } else {
                "No Secondary Controller Present"
            },
            if self.sequencer_abort_error {
                "Sequencer has detected an error condition that caused an abort"
            } else {
                "Sequencer Abort Status reports no errors"
            },
            if self.sequencer_error {
                "Sequencer detected an error"
            } else {
                "Sequencer reports no errors"
            },
        ];

        lines.iter().map(|line| format!("{}\n", line)).collect()
    }
}

/// Main status byte (command 0x1A0C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MainStatus {
    pub mirrors_parked: bool,
    pub sequencer_running: bool,
    pub video_frozen: bool,
    pub source_locked: bool,
    pub port1_sync_valid: bool,
    pub port2_sync_valid: bool,
}

impl MainStatus {
    pub fn from_byte(raw: u8) -> Self {
        let flags = bits_lsb_first(raw, 6);
        Self {
            mirrors_parked: flags[0],
            sequencer_running: flags[1],
            video_frozen: flags[2],
            source_locked: flags[3],
            port1_sync_valid: flags[4],
            port2_sync_valid: flags[5],
        }
    }

    /// The six flags in bit order
    pub fn as_array(&self) -> [bool; 6] {
        [
            self.mirrors_parked,
            self.sequencer_running,
            self.video_frozen,
            self.source_locked,
            self.port1_sync_valid,
            self.port2_sync_valid,
        ]
    }
}

/// Validate the communication status byte (command 0x1A49)
///
/// Bits 0 and 2 flag a broken controller-to-DMD link.
pub fn check_communication_status(raw: u8) -> Result<()> {
    if bit(raw, 0) || bit(raw, 2) {
        return Err(DmdError::CommunicationError(raw));
    }
    Ok(())
}

/// Validate the system status byte (command 0x1A0B)
///
/// Bit 0 is set once the internal memory test has passed.
pub fn check_system_status(raw: u8) -> Result<()> {
    if !bit(raw, 0) {
        return Err(DmdError::MemoryTestError(raw));
    }
    Ok(())
}

/// Controller/DMD combination reported by the hardware info command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Product {
    Unknown,
    Dlp6500,
    Dlp9000,
    Dlp670S,
    Dlp500YX,
    Dlp5500,
    Undocumented(u8),
}

impl From<u8> for Product {
    fn from(code: u8) -> Self {
        match code {
            0x00 => Self::Unknown,
            0x01 => Self::Dlp6500,
            0x02 => Self::Dlp9000,
            0x03 => Self::Dlp670S,
            0x04 => Self::Dlp500YX,
            0x05 => Self::Dlp5500,
            other => Self::Undocumented(other),
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Dlp6500 => write!(f, "DLP6500"),
            Self::Dlp9000 => write!(f, "DLP9000"),
            Self::Dlp670S => write!(f, "DLP670S"),
            Self::Dlp500YX => write!(f, "DLP500YX"),
            Self::Dlp5500 => write!(f, "DLP5500"),
            Self::Undocumented(code) => write!(f, "undocumented hardware [{}]", code),
        }
    }
}

/// Hardware product code and firmware tag (command 0x0206)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HardwareInfo {
    pub product: Product,
    pub firmware_tag: String,
}

impl HardwareInfo {
    pub fn from_reply(data: &[u8]) -> Result<Self> {
        let (&code, tag) = data
            .split_first()
            .ok_or_else(|| DmdError::malformed("hardware info reply carries no data"))?;

        let tag = String::from_utf8_lossy(tag);
        Ok(Self {
            product: Product::from(code),
            firmware_tag: tag.trim_end_matches('\0').trim_end().to_string(),
        })
    }
}

/// Power state derived from the standby (0x0200) and idle (0x0201) reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PowerMode {
    Normal,
    Idle,
    Standby,
}

impl PowerMode {
    pub fn from_status(standby: u8, idle: u8) -> Result<Self> {
        match (standby, idle) {
            (1, _) => Ok(Self::Standby),
            (0, 0) => Ok(Self::Normal),
            (0, 1) => Ok(Self::Idle),
            (0, value) => Err(DmdError::UnexpectedValue { what: "idle status", value }),
            (value, _) => Err(DmdError::UnexpectedValue { what: "standby status", value }),
        }
    }
}

impl fmt::Display for PowerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Idle => write!(f, "idle"),
            Self::Standby => write!(f, "standby"),
        }
    }
}

/// External video source the controller is locked to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceLock {
    Unlocked,
    Hdmi,
    DisplayPort,
}

impl SourceLock {
    /// Decode the port byte of the source-lock power command (0x1A01)
    pub fn from_port(port: u8) -> Result<Self> {
        match port {
            0 => Ok(Self::Unlocked),
            1 => Ok(Self::Hdmi),
            2 => Ok(Self::DisplayPort),
            value => Err(DmdError::UnexpectedValue { what: "source port", value }),
        }
    }

    /// Payload byte selecting this source
    pub fn port_byte(self) -> u8 {
        match self {
            Self::Unlocked => 0,
            Self::Hdmi => 1,
            Self::DisplayPort => 2,
        }
    }
}

impl fmt::Display for SourceLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlocked => write!(f, "unlocked"),
            Self::Hdmi => write!(f, "HDMI"),
            Self::DisplayPort => write!(f, "DisplayPort"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_table_is_complete() {
        let documented: [(u8, &str); 18] = [
            (1, "Batch file checksum error"),
            (2, "Device failure"),
            (3, "Invalid command number"),
            (4, "Incompatible controller and DMD combination"),
            (5, "Command not allowed in current mode"),
            (6, "Invalid command parameter"),
            (7, "Item referred by the parameter is not present"),
            (8, "Out of resource (RAM or Flash)"),
            (9, "Invalid BMP compression type"),
            (10, "Pattern bit number out of range"),
            (11, "Pattern BMP not present in flash"),
            (12, "Pattern dark time is out of range"),
            (13, "Signal delay parameter is out of range"),
            (14, "Pattern exposure time is out of range"),
            (15, "Pattern number is out of range"),
            (16, "Invalid pattern definition (errors other than 9-15)"),
            (17, "Pattern image memory address is out of range"),
            (255, "Internal Error"),
        ];

        for (code, message) in documented {
            let decoded = ErrorCode::from(code);
            assert!(!matches!(decoded, ErrorCode::Undocumented(_)), "code {}", code);
            assert_eq!(decoded.message(), message);
            assert_eq!(u8::from(decoded), code);
        }
    }

    #[test]
    fn test_no_error_replies() {
        assert_eq!(ErrorCode::from_reply(&[]), None);
        assert_eq!(ErrorCode::from_reply(&[0]), None);
        assert_eq!(ErrorCode::from_reply(&[0, 7]), None);
        assert_eq!(ErrorCode::from_reply(&[14]), Some(ErrorCode::ExposureOutOfRange));
    }

    #[test]
    fn test_undocumented_error_fallback() {
        for code in [18u8, 42, 128, 254] {
            let decoded = ErrorCode::from_reply(&[code]).unwrap();
            assert_eq!(decoded, ErrorCode::Undocumented(code));
            assert_eq!(decoded.to_string(), format!("undocumented error [{}]", code));
        }
    }

    #[test]
    fn test_hardware_status_healthy() {
        // init ok + secondary controller present
        let status = HardwareStatus::from_byte(0b0001_0001);
        assert!(status.init_ok);
        assert!(status.secondary_controller_present);
        assert_eq!(status.error_count(), 0);
        assert!(status.is_healthy());
        assert!(status.report().contains("Internal Initialization Successful\n"));
        assert!(status.report().contains("Secondary Controller Present and Ready\n"));
        assert_eq!(status.report().lines().count(), 7);
    }

    #[test]
    fn test_hardware_status_errors() {
        // everything wrong: init bit clear, all error bits set, reserved bit ignored
        let status = HardwareStatus::from_byte(0b1110_1110);
        assert_eq!(status.error_count(), 6);
        assert!(status.report().contains("Internal Initialization Error"));
        assert!(status.report().contains("Sequencer detected an error"));

        // the reserved bit alone changes nothing
        assert_eq!(HardwareStatus::from_byte(0b0010_0001).error_count(), 0);
        assert_eq!(HardwareStatus::from_byte(0x00).error_count(), 1);
    }

    #[test]
    fn test_main_status_bit_order() {
        let status = MainStatus::from_byte(0b0000_1001);
        assert!(status.mirrors_parked);
        assert!(status.source_locked);
        assert!(!status.sequencer_running);
        assert_eq!(status.as_array(), [true, false, false, true, false, false]);

        let status = MainStatus::from_byte(0b1111_0110);
        assert_eq!(status.as_array(), [false, true, true, false, true, true]);
    }

    #[test]
    fn test_communication_status() {
        assert!(check_communication_status(0x00).is_ok());
        assert!(check_communication_status(0b0000_0010).is_ok());
        assert_eq!(check_communication_status(0x01), Err(DmdError::CommunicationError(0x01)));
        assert_eq!(check_communication_status(0x04), Err(DmdError::CommunicationError(0x04)));
    }

    #[test]
    fn test_system_status() {
        assert!(check_system_status(0x01).is_ok());
        assert_eq!(check_system_status(0x00), Err(DmdError::MemoryTestError(0x00)));
        assert_eq!(check_system_status(0x02), Err(DmdError::MemoryTestError(0x02)));
    }

    #[test]
    fn test_hardware_info() {
        let mut data = vec![0x01];
        data.extend_from_slice(b"DLPC900 FW 6.0.0\0\0\0");
        let info = HardwareInfo::from_reply(&data).unwrap();
        assert_eq!(info.product, Product::Dlp6500);
        assert_eq!(info.firmware_tag, "DLPC900 FW 6.0.0");
        assert_eq!(Product::from(0x09).to_string(), "undocumented hardware [9]");
        assert!(HardwareInfo::from_reply(&[]).is_err());
    }

    #[test]
    fn test_power_mode() {
        assert_eq!(PowerMode::from_status(0, 0).unwrap(), PowerMode::Normal);
        assert_eq!(PowerMode::from_status(0, 1).unwrap(), PowerMode::Idle);
        assert_eq!(PowerMode::from_status(1, 0).unwrap(), PowerMode::Standby);
        assert!(PowerMode::from_status(0, 3).is_err());
        assert!(PowerMode::from_status(2, 0).is_err());
    }

    #[test]
    fn test_source_lock() {
        assert_eq!(SourceLock::from_port(2).unwrap(), SourceLock::DisplayPort);
        assert_eq!(SourceLock::Hdmi.port_byte(), 1);
        assert!(SourceLock::from_port(3).is_err());
    }
}
