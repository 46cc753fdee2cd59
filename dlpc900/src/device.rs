/*!
Controller session.

[`Dmd`] owns one transport handle and the locally tracked display mode. Every
operation is a synchronous request/reply exchange: a command frame is split
into reports and written, and when a reply is expected exactly one report is
read back after a settle delay. There is never more than one request in
flight. A session is not meant to be shared between threads; wrap it in a
mutex if several threads must drive the same controller.
*/

use crate::commands::*;
use crate::config::SessionConfig;
use crate::error::{DmdError, Result};
use crate::frame::{CommandFrame, ReplyFrame};
use crate::mode::{DisplayMode, ModeStateMachine};
use crate::pattern::{
    bulk_chunk_payload, bulk_chunks, image_slot_payload, lut_config_payload, PatternLutEntry, VideoPatternLut,
};
use crate::protocol::MODE_SETTLE_DELAY;
use crate::report::{frame_to_reports, reply_from_report};
use crate::status::{
    check_communication_status, check_system_status, ErrorCode, HardwareInfo, HardwareStatus, MainStatus, PowerMode,
    SourceLock,
};
use crate::transport::Transport;
use std::thread;
use tracing::{debug, info, trace, warn};

/// A session with one DLPC900 controller
pub struct Dmd<T: Transport> {
    transport: T,
    config: SessionConfig,
    mode: ModeStateMachine,
    last_reply: Option<ReplyFrame>,
}

impl<T: Transport> Dmd<T> {
    /// Start a session over `transport`
    pub fn new(transport: T, config: SessionConfig) -> Self {
        let mode = ModeStateMachine::new(config.initial_mode);
        Self {
            transport,
            config,
            mode,
            last_reply: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Display mode as tracked by this session
    pub fn current_mode(&self) -> DisplayMode {
        self.mode.current()
    }

    /// The most recent reply read from the controller
    pub fn last_reply(&self) -> Option<&ReplyFrame> {
        self.last_reply.as_ref()
    }

    // ------------------------------------------------------------------
    // Raw command exchange
    // ------------------------------------------------------------------

    /// Send `frame` and, for reads, wait for and return the reply
    pub fn send(&mut self, frame: &CommandFrame) -> Result<Option<ReplyFrame>> {
        let reports = frame_to_reports(frame)?;
        debug!(
            "Sending {:?} 0x{:04X} (seq 0x{:02X}, {} payload bytes, {} report(s))",
            frame.direction,
            frame.command,
            frame.sequence,
            frame.payload.len(),
            reports.len()
        );

        for report in &reports {
            trace!("→ {}", hex::encode(report));
            self.transport.write_report(report)?;
        }

        if !frame.expects_reply() {
            return Ok(None);
        }

        thread::sleep(self.config.reply_settle());
        let raw = self.transport.read_report()?;
        trace!("← {}", hex::encode(raw));

        let reply = reply_from_report(&raw)?;
        if reply.sequence != frame.sequence {
            warn!(
                "Reply sequence 0x{:02X} does not match request 0x{:02X}",
                reply.sequence, frame.sequence
            );
        }
        if reply.error_flag {
            warn!("⚠️ Controller flagged an error replying to 0x{:04X}", frame.command);
        }

        self.last_reply = Some(reply.clone());
        Ok(Some(reply))
    }

    /// Send a write command
    pub fn write(&mut self, sequence: u8, command: u16, payload: &[u8]) -> Result<()> {
        self.send(&CommandFrame::write(sequence, command, payload.to_vec()))?;
        Ok(())
    }

    /// Send a read command and return its reply
    pub fn read(&mut self, sequence: u8, command: u16) -> Result<ReplyFrame> {
        self.send(&CommandFrame::read(sequence, command))?
            .ok_or_else(|| DmdError::malformed(format!("no reply to read of 0x{:04X}", command)))
    }

    fn read_byte(&mut self, sequence: u8, command: u16) -> Result<u8> {
        self.read(sequence, command)?.byte(0)
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    pub fn hardware_status(&mut self) -> Result<HardwareStatus> {
        let raw = self.read_byte(SEQ_STATUS, CMD_HARDWARE_STATUS)?;
        Ok(HardwareStatus::from_byte(raw))
    }

    pub fn main_status(&mut self) -> Result<MainStatus> {
        let raw = self.read_byte(SEQ_STATUS, CMD_MAIN_STATUS)?;
        Ok(MainStatus::from_byte(raw))
    }

    /// Fails with [`DmdError::CommunicationError`] if the controller cannot reach the DMD
    pub fn check_communication_status(&mut self) -> Result<()> {
        let raw = self.read_byte(SEQ_STATUS, CMD_COMMUNICATION_STATUS)?;
        check_communication_status(raw)
    }

    /// Fails with [`DmdError::MemoryTestError`] if the internal memory test failed
    pub fn check_system_status(&mut self) -> Result<()> {
        let raw = self.read_byte(SEQ_STATUS, CMD_SYSTEM_STATUS)?;
        check_system_status(raw)
    }

    /// Surface the controller's pending error code, if any
    pub fn check_for_error(&mut self) -> Result<()> {
        let reply = self.read(SEQ_ERROR_CHECK, CMD_ERROR_CHECK)?;
        match ErrorCode::from_reply(&reply.data) {
            None => Ok(()),
            Some(code) => {
                warn!("❌ Controller reports: {}", code);
                Err(DmdError::Firmware(code))
            }
        }
    }

    pub fn hardware_info(&mut self) -> Result<HardwareInfo> {
        let reply = self.read(SEQ_STATUS, CMD_HARDWARE_INFO)?;
        HardwareInfo::from_reply(&reply.data)
    }

    // ------------------------------------------------------------------
    // Power
    // ------------------------------------------------------------------

    /// Stop any pattern sequence and put the controller in standby
    pub fn standby(&mut self) -> Result<()> {
        self.stop_pattern()?;
        self.write(SEQ_DEFAULT, CMD_POWER, &[1])
    }

    pub fn wakeup(&mut self) -> Result<()> {
        self.write(SEQ_DEFAULT, CMD_POWER, &[0])
    }

    pub fn reset(&mut self) -> Result<()> {
        self.write(SEQ_DEFAULT, CMD_POWER, &[2])
    }

    /// Stop any pattern sequence and enter idle mode
    pub fn idle_on(&mut self) -> Result<()> {
        self.stop_pattern()?;
        self.write(SEQ_DEFAULT, CMD_IDLE, &[1])
    }

    pub fn idle_off(&mut self) -> Result<()> {
        self.write(SEQ_DEFAULT, CMD_IDLE, &[3])
    }

    pub fn power_mode(&mut self) -> Result<PowerMode> {
        let idle = self.read_byte(SEQ_DEFAULT, CMD_IDLE)?;
        let standby = self.read_byte(SEQ_DEFAULT, CMD_POWER)?;
        PowerMode::from_status(standby, idle)
    }

    // ------------------------------------------------------------------
    // Parallel interface and source lock
    // ------------------------------------------------------------------

    pub fn set_dual_pixel_mode(&mut self) -> Result<()> {
        self.write(SEQ_PORT, CMD_PORT_CONFIG, &[2, 0, 0, 0])
    }

    /// Route the parallel interface (rather than flash or test patterns) to the display
    pub fn set_display_to_parallel(&mut self) -> Result<()> {
        self.write(SEQ_LUT, CMD_INPUT_SOURCE, &[0, 3])
    }

    /// Power the receiver for `source` (or release the lock) and select the parallel input
    pub fn lock_source(&mut self, source: SourceLock) -> Result<()> {
        info!("🔒 Source lock: {}", source);
        self.write(SEQ_DEFAULT, CMD_SOURCE_LOCK, &[source.port_byte()])?;
        self.set_display_to_parallel()
    }

    pub fn lock_hdmi(&mut self) -> Result<()> {
        self.lock_source(SourceLock::Hdmi)
    }

    pub fn lock_displayport(&mut self) -> Result<()> {
        self.lock_source(SourceLock::DisplayPort)
    }

    pub fn lock_release(&mut self) -> Result<()> {
        self.lock_source(SourceLock::Unlocked)
    }

    /// Which external source is locked, if any
    pub fn source_lock(&mut self) -> Result<SourceLock> {
        if !self.main_status()?.source_locked {
            return Ok(SourceLock::Unlocked);
        }
        let port = self.read_byte(SEQ_DEFAULT, CMD_SOURCE_LOCK)?;
        SourceLock::from_port(port)
    }

    // ------------------------------------------------------------------
    // Image flips
    // ------------------------------------------------------------------

    pub fn set_long_axis_flip(&mut self, flip: bool) -> Result<()> {
        self.write(SEQ_DEFAULT, CMD_LONG_AXIS_FLIP, &[flip as u8])
    }

    pub fn set_short_axis_flip(&mut self, flip: bool) -> Result<()> {
        self.write(SEQ_DEFAULT, CMD_SHORT_AXIS_FLIP, &[flip as u8])
    }

    pub fn long_axis_flip(&mut self) -> Result<bool> {
        Ok(self.read_byte(SEQ_DEFAULT, CMD_LONG_AXIS_FLIP)? & 0x01 != 0)
    }

    pub fn short_axis_flip(&mut self) -> Result<bool> {
        Ok(self.read_byte(SEQ_DEFAULT, CMD_SHORT_AXIS_FLIP)? & 0x01 != 0)
    }

    // ------------------------------------------------------------------
    // Display mode
    // ------------------------------------------------------------------

    /// Read the display mode from the controller
    ///
    /// This does not change the tracked mode; only a confirmed
    /// [`set_display_mode`](Self::set_display_mode) does.
    pub fn get_display_mode(&mut self) -> Result<DisplayMode> {
        let code = self.read_byte(SEQ_DEFAULT, CMD_DISPLAY_MODE)?;
        DisplayMode::from_code(code)
    }

    /// Switch display mode and confirm the switch by reading it back
    ///
    /// Entering [`DisplayMode::VideoPattern`] is refused unless the tracked
    /// mode is [`DisplayMode::Video`]; nothing is sent in that case.
    pub fn set_display_mode(&mut self, mode: DisplayMode) -> Result<()> {
        self.mode.check_transition(mode)?;

        self.write(SEQ_DEFAULT, CMD_DISPLAY_MODE, &[mode.code()])?;
        thread::sleep(MODE_SETTLE_DELAY);

        let actual = match self.get_display_mode() {
            Ok(actual) => actual,
            Err(DmdError::MalformedReply(reason)) => {
                warn!("Mode read-back failed ({}), retrying once", reason);
                self.get_display_mode()?
            }
            Err(e) => return Err(e),
        };

        self.mode.confirm(mode, actual)?;
        info!("🔁 Display mode is now {}", mode);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Pattern sequences
    // ------------------------------------------------------------------

    pub fn start_pattern(&mut self) -> Result<()> {
        self.write(SEQ_PATTERN_CONTROL, CMD_PATTERN_CONTROL, &[2])
    }

    pub fn pause_pattern(&mut self) -> Result<()> {
        self.write(SEQ_PATTERN_CONTROL, CMD_PATTERN_CONTROL, &[1])
    }

    pub fn stop_pattern(&mut self) -> Result<()> {
        self.write(SEQ_PATTERN_CONTROL, CMD_PATTERN_CONTROL, &[0])
    }

    /// Send one LUT entry
    pub fn define_pattern(&mut self, entry: &PatternLutEntry) -> Result<()> {
        let payload = entry.encode()?;
        self.write(SEQ_LUT, CMD_LUT_ENTRY, &payload)
    }

    /// Define the single LUT entry used in video-pattern mode
    pub fn setup_video_pattern_lut(&mut self, lut: &VideoPatternLut) -> Result<()> {
        self.define_pattern(&lut.to_entry())
    }

    /// Set how many LUT entries to play and how often (0 = forever)
    pub fn configure_lut(&mut self, pattern_count: usize, repeat: u32) -> Result<()> {
        let payload = lut_config_payload(pattern_count, repeat)?;
        self.write(SEQ_DEFAULT, CMD_LUT_CONFIG, &payload)
    }

    /// Announce the size of the image about to be loaded into `group_index`
    pub fn declare_image(&mut self, group_index: u16, byte_count: usize) -> Result<()> {
        let payload = image_slot_payload(group_index, byte_count)?;
        self.write(SEQ_DEFAULT, CMD_IMAGE_SLOT, &payload)
    }

    /// Stream an encoded image in bulk-load sub-chunks
    pub fn load_image(&mut self, image: &[u8]) -> Result<()> {
        let chunks = bulk_chunks(image);
        let total = chunks.len();

        for (i, chunk) in chunks.into_iter().enumerate() {
            self.write(SEQ_BITMAP_LOAD, CMD_BITMAP_LOAD, &bulk_chunk_payload(chunk)?)?;
            self.upload_checkpoint()?;

            if (i + 1) % 100 == 0 {
                info!("📤 Loaded {}/{} chunks", i + 1, total);
            }
        }
        Ok(())
    }

    /// Error check between upload steps, when enabled
    pub(crate) fn upload_checkpoint(&mut self) -> Result<()> {
        if self.config.check_errors_during_upload {
            self.check_for_error()?;
        }
        Ok(())
    }
}
