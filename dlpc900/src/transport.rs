/*!
Report transports.

The protocol layer only needs two things from the USB side: send one 64-byte
report to the controller's OUT endpoint, and read one 64-byte report from its
IN endpoint. [`Transport`] captures exactly that.
*/

use crate::error::{DmdError, Result};
use crate::report::Report;
use std::collections::VecDeque;

/// A channel that moves fixed-size reports to and from the controller
pub trait Transport {
    /// Send one report
    fn write_report(&mut self, report: &Report) -> Result<()>;

    /// Block until one report arrives
    fn read_report(&mut self) -> Result<Report>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write_report(&mut self, report: &Report) -> Result<()> {
        (**self).write_report(report)
    }

    fn read_report(&mut self) -> Result<Report> {
        (**self).read_report()
    }
}

/// In-memory transport that records written reports and replays queued replies
///
/// Reads fail with a transport error once the reply queue is empty, the way
/// a real read that never completes would.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    written: Vec<Report>,
    replies: VecDeque<Report>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw reply report
    pub fn push_reply(&mut self, report: Report) {
        self.replies.push_back(report);
    }

    /// Queue a well-formed reply carrying `data`
    pub fn push_reply_data(&mut self, sequence: u8, data: &[u8]) {
        let mut report = [0u8; crate::protocol::REPORT_SIZE];
        let len = data.len().min(crate::protocol::REPORT_SIZE - crate::protocol::REPLY_HEADER_SIZE);
        report[0] = 0xC0;
        report[1] = sequence;
        report[2..4].copy_from_slice(&(len as u16).to_le_bytes());
        report[4..4 + len].copy_from_slice(&data[..len]);
        self.replies.push_back(report);
    }

    /// Every report written so far, in order
    pub fn written(&self) -> &[Report] {
        &self.written
    }

    /// Replies not yet consumed
    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }

    pub fn clear_written(&mut self) {
        self.written.clear();
    }
}

impl Transport for ScriptedTransport {
    fn write_report(&mut self, report: &Report) -> Result<()> {
        self.written.push(*report);
        Ok(())
    }

    fn read_report(&mut self) -> Result<Report> {
        self.replies
            .pop_front()
            .ok_or_else(|| DmdError::transport("no reply available"))
    }
}

#[cfg(feature = "hid")]
pub use hid::HidTransport;

#[cfg(feature = "hid")]
mod hid {
    use super::Transport;
    use crate::error::{DmdError, Result};
    use crate::protocol::REPORT_SIZE;
    use crate::report::Report;
    use hidapi::{HidApi, HidDevice};
    use std::time::Duration;
    use tracing::info;

    /// Transport over the operating system's HID stack
    pub struct HidTransport {
        device: HidDevice,
        read_timeout: Duration,
    }

    impl HidTransport {
        /// Open the first controller matching `vendor_id`/`product_id`
        pub fn open(vendor_id: u16, product_id: u16, read_timeout: Duration) -> Result<Self> {
            info!("🔌 Opening DLPC900 at {:04X}:{:04X}", vendor_id, product_id);
            let api = HidApi::new()?;
            let device = api.open(vendor_id, product_id)?;
            info!("✅ Controller opened");

            Ok(Self { device, read_timeout })
        }
    }

    impl Transport for HidTransport {
        fn write_report(&mut self, report: &Report) -> Result<()> {
            // hidapi expects the report id in front; the controller uses id 0
            let mut buf = [0u8; REPORT_SIZE + 1];
            buf[1..].copy_from_slice(report);

            let written = self.device.write(&buf)?;
            if written < buf.len() {
                return Err(DmdError::transport(format!(
                    "short write: {} of {} bytes",
                    written,
                    buf.len()
                )));
            }
            Ok(())
        }

        fn read_report(&mut self) -> Result<Report> {
            let mut report = [0u8; REPORT_SIZE];
            let timeout_ms = i32::try_from(self.read_timeout.as_millis()).unwrap_or(i32::MAX);

            let read = self.device.read_timeout(&mut report, timeout_ms)?;
            if read == 0 {
                return Err(DmdError::transport(format!(
                    "no reply within {} ms",
                    self.read_timeout.as_millis()
                )));
            }
            Ok(report)
        }
    }
}
