/*!
# DLPC900 Controller Protocol

This crate speaks the USB HID command protocol of the DLPC900 digital
micromirror device controller.

## Core Types

- [`Dmd`] - A session with one controller over a [`Transport`]
- [`CommandFrame`] / [`ReplyFrame`] - Logical command and reply frames
- [`DisplayMode`] - Controller display modes and the transition rules between them
- [`PatternLutEntry`] - One 12-byte pattern LUT entry
- [`DmdError`] - Every failure the protocol can report

## Modules

- [`frame`] - Frame header encoding and reply decoding
- [`report`] - Splitting frames into 64-byte reports
- [`status`] - Status bytes, error codes and hardware info
- [`mode`] - Display mode state machine
- [`pattern`] - LUT entries and bulk image payloads
- [`sequence`] - Full pattern sequence upload
- [`bits`] - Fixed-width integer packing helpers
- [`transport`] - Report transports (scripted, and HID with the `hid` feature)
*/

pub mod bits;
pub mod commands;
pub mod config;
pub mod device;
pub mod error;
pub mod frame;
pub mod mode;
pub mod pattern;
pub mod report;
pub mod sequence;
pub mod status;
pub mod transport;

// Re-export commonly used types
pub use config::SessionConfig;
pub use device::Dmd;
pub use error::{DmdError, Result};
pub use frame::{CommandFrame, Direction, ReplyFrame};
pub use mode::{DisplayMode, ModeStateMachine};
pub use pattern::{PatternLutEntry, VideoPatternLut};
pub use report::Report;
pub use sequence::{BitmapEncoder, PatternTiming};
pub use status::{ErrorCode, HardwareInfo, HardwareStatus, MainStatus, PowerMode, Product, SourceLock};
#[cfg(feature = "hid")]
pub use transport::HidTransport;
pub use transport::{ScriptedTransport, Transport};

/// Version information for the protocol library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol constants
pub mod protocol {
    use std::time::Duration;

    /// Size of one HID report in bytes, excluding the report id
    pub const REPORT_SIZE: usize = 64;

    /// Command frame header: flag, sequence, length (2) and command (2)
    pub const HEADER_SIZE: usize = 6;

    /// Reply header: flag, sequence and length (2)
    pub const REPLY_HEADER_SIZE: usize = 4;

    /// Payload bytes that fit in the first report after the header
    pub const FIRST_REPORT_CAPACITY: usize = REPORT_SIZE - HEADER_SIZE;

    /// Image bytes carried by one bulk-load command
    pub const BULK_CHUNK_SIZE: usize = 504;

    /// Capacity of the pattern LUT
    pub const MAX_PATTERNS: usize = 400;

    /// Bit-planes stored in one image group
    pub const BIT_PLANES_PER_IMAGE: usize = 24;

    /// Wait between a display mode switch and its read-back
    pub const MODE_SETTLE_DELAY: Duration = Duration::from_millis(500);
}
