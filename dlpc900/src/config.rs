/*!
Session configuration.
*/

use crate::mode::DisplayMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables of a controller session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay between sending a command and reading its reply
    pub reply_settle_ms: u64,

    /// Display mode assumed for a fresh session until a switch is confirmed
    pub initial_mode: DisplayMode,

    /// Run the error check after every LUT entry, slot declaration and bulk chunk
    pub check_errors_during_upload: bool,
}

impl SessionConfig {
    pub fn reply_settle(&self) -> Duration {
        Duration::from_millis(self.reply_settle_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reply_settle_ms: 100,
            initial_mode: DisplayMode::Pattern,
            check_errors_during_upload: true,
        }
    }
}
