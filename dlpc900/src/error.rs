/*!
Error types for the DLPC900 protocol driver.

Use [`DmdError::is_device_reported`] to tell controller-side failures from
host-side ones.
*/

use crate::mode::DisplayMode;
use crate::status::ErrorCode;
use thiserror::Error;

/// Common result type used throughout the driver
pub type Result<T> = std::result::Result<T, DmdError>;

/// Every failure the driver can surface
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DmdError {
    /// Writing or reading a transport report failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// A reply could not be parsed as a protocol frame
    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    /// The controller reported an error through the error-check command
    #[error("Firmware error: {0}")]
    Firmware(ErrorCode),

    /// The requested display mode cannot be entered from the tracked mode
    #[error("Cannot switch display mode from {from} to {to}: {to} is only reachable from {required}")]
    InvalidTransition {
        from: DisplayMode,
        to: DisplayMode,
        required: DisplayMode,
    },

    /// The read-back after a mode switch reported a different mode
    #[error("Mode activation failed: requested {requested}, device reports {actual}")]
    ModeActivationFailed {
        requested: DisplayMode,
        actual: DisplayMode,
    },

    /// The controller cannot communicate with the DMD
    #[error("Controller cannot communicate with DMD (status 0x{0:02X})")]
    CommunicationError(u8),

    /// The controller's internal memory test failed
    #[error("Internal memory test failed (status 0x{0:02X})")]
    MemoryTestError(u8),

    /// A caller-supplied value is out of range for its protocol field
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A reply byte fell outside its documented set of values
    #[error("Unexpected {what} value: {value}")]
    UnexpectedValue { what: &'static str, value: u8 },

    /// The external bitmap encoder failed
    #[error("Bitmap encoder error: {0}")]
    Encoder(String),
}

impl DmdError {
    /// Create a new transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a new malformed reply error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedReply(msg.into())
    }

    /// Create a new invalid parameter error
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Create a new encoder error
    pub fn encoder(msg: impl Into<String>) -> Self {
        Self::Encoder(msg.into())
    }

    /// True when the device answered but reported a problem, as opposed to
    /// the device being unreachable or the reply unreadable
    pub fn is_device_reported(&self) -> bool {
        matches!(
            self,
            Self::Firmware(_) | Self::CommunicationError(_) | Self::MemoryTestError(_)
        )
    }
}

#[cfg(feature = "hid")]
impl From<hidapi::HidError> for DmdError {
    fn from(err: hidapi::HidError) -> Self {
        Self::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DmdError::InvalidTransition {
            from: DisplayMode::Pattern,
            to: DisplayMode::VideoPattern,
            required: DisplayMode::Video,
        };
        assert_eq!(
            err.to_string(),
            "Cannot switch display mode from pattern to video-pattern: video-pattern is only reachable from video"
        );

        let err = DmdError::Firmware(ErrorCode::from(5));
        assert_eq!(err.to_string(), "Firmware error: Command not allowed in current mode");
    }

    #[test]
    fn test_device_reported_classification() {
        assert!(DmdError::Firmware(ErrorCode::from(255)).is_device_reported());
        assert!(DmdError::CommunicationError(0x01).is_device_reported());
        assert!(DmdError::MemoryTestError(0x00).is_device_reported());
        assert!(!DmdError::transport("unplugged").is_device_reported());
        assert!(!DmdError::malformed("short").is_device_reported());
    }
}
