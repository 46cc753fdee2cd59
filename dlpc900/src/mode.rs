/*!
Display modes and the rules for switching between them.
*/

use crate::error::{DmdError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display mode of the controller (command 0x1A1B)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    Video,
    Pattern,
    VideoPattern,
    #[serde(rename = "otf")]
    OnTheFly,
}

impl DisplayMode {
    /// Byte used for this mode on the wire
    pub fn code(self) -> u8 {
        match self {
            Self::Video => 0,
            Self::Pattern => 1,
            Self::VideoPattern => 2,
            Self::OnTheFly => 3,
        }
    }

    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Video),
            1 => Ok(Self::Pattern),
            2 => Ok(Self::VideoPattern),
            3 => Ok(Self::OnTheFly),
            value => Err(DmdError::UnexpectedValue { what: "display mode", value }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Pattern => "pattern",
            Self::VideoPattern => "video-pattern",
            Self::OnTheFly => "otf",
        }
    }

    /// Mode the controller must already be in before entering `self`, if any
    pub fn required_predecessor(self) -> Option<DisplayMode> {
        match self {
            // the video source has to be enabled and locked first
            Self::VideoPattern => Some(Self::Video),
            _ => None,
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = DmdError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "video" => Ok(Self::Video),
            "pattern" => Ok(Self::Pattern),
            "video-pattern" | "videopattern" => Ok(Self::VideoPattern),
            "otf" | "on-the-fly" => Ok(Self::OnTheFly),
            other => Err(DmdError::invalid_parameter(format!("unknown display mode '{}'", other))),
        }
    }
}

/// Locally tracked display mode
///
/// The tracked mode only changes once the device has confirmed a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeStateMachine {
    current: DisplayMode,
}

impl ModeStateMachine {
    pub fn new(initial: DisplayMode) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> DisplayMode {
        self.current
    }

    /// Check that `to` may be entered from the tracked mode
    pub fn check_transition(&self, to: DisplayMode) -> Result<()> {
        match to.required_predecessor() {
            Some(required) if required != self.current => Err(DmdError::InvalidTransition {
                from: self.current,
                to,
                required,
            }),
            _ => Ok(()),
        }
    }

    /// Record the mode read back after a switch to `requested`
    pub fn confirm(&mut self, requested: DisplayMode, actual: DisplayMode) -> Result<()> {
        if requested != actual {
            return Err(DmdError::ModeActivationFailed { requested, actual });
        }
        self.current = actual;
        Ok(())
    }
}
