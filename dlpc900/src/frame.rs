/*!
Command and reply frames.

An outgoing command frame is laid out as:

```text
+------+-----+--------+--------+--------+--------+-------------------+
| flag | seq | len_lo | len_hi | cmd_lo | cmd_hi | payload[0..n]     |
+------+-----+--------+--------+--------+--------+-------------------+
```

where the length counts the two command bytes plus the payload. Replies start
directly with the flag byte (no report id), followed by the sequence byte, a
little-endian length and `length` bytes of data.
*/

use crate::error::{DmdError, Result};
use crate::protocol::{HEADER_SIZE, REPLY_HEADER_SIZE};
use bytes::BufMut;
use serde::{Deserialize, Serialize};

/// Flag byte bit 7: the host wants a reply
const FLAG_READ: u8 = 0x80;
/// Flag byte bit 6: always set on host frames
const FLAG_HOST: u8 = 0x40;
/// Flag byte bit 5: the device flags an error in its reply
const FLAG_ERROR: u8 = 0x20;

/// Whether a command reads from or writes to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Read,
    Write,
}

impl Direction {
    /// Flag byte for a frame sent in this direction
    pub fn flag_byte(self) -> u8 {
        match self {
            Direction::Read => FLAG_READ | FLAG_HOST,
            Direction::Write => FLAG_HOST,
        }
    }
}

/// A logical command sent to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    pub direction: Direction,
    pub sequence: u8,
    pub command: u16,
    pub payload: Vec<u8>,
}

impl CommandFrame {
    /// Create a new command frame
    pub fn new(direction: Direction, sequence: u8, command: u16, payload: Vec<u8>) -> Self {
        Self {
            direction,
            sequence,
            command,
            payload,
        }
    }

    /// A read request with no payload
    pub fn read(sequence: u8, command: u16) -> Self {
        Self::new(Direction::Read, sequence, command, Vec::new())
    }

    /// A write request carrying `payload`
    pub fn write(sequence: u8, command: u16, payload: Vec<u8>) -> Self {
        Self::new(Direction::Write, sequence, command, payload)
    }

    /// Whether the controller answers this frame with a reply report
    pub fn expects_reply(&self) -> bool {
        self.direction == Direction::Read
    }

    /// Value of the header's length field: the payload plus the command code
    pub fn length_field(&self) -> Result<u16> {
        u16::try_from(self.payload.len() + 2).map_err(|_| {
            DmdError::invalid_parameter(format!(
                "payload of {} bytes exceeds the 16-bit frame length",
                self.payload.len()
            ))
        })
    }

    /// Serialize header and payload, without any report padding
    pub fn encode(&self) -> Result<Vec<u8>> {
        let length = self.length_field()?;

        let mut buf = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        buf.put_u8(self.direction.flag_byte());
        buf.put_u8(self.sequence);
        buf.put_u16_le(length);
        buf.put_u16_le(self.command);
        buf.extend_from_slice(&self.payload);
        Ok(buf)
    }
}

/// A reply read back from the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyFrame {
    pub error_flag: bool,
    pub flag_byte: u8,
    pub sequence: u8,
    pub length: u16,
    pub data: Vec<u8>,
}

impl ReplyFrame {
    /// Parse a reply from raw report bytes
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() < REPLY_HEADER_SIZE {
            return Err(DmdError::malformed(format!(
                "reply too short: expected at least {} bytes, got {}",
                REPLY_HEADER_SIZE,
                raw.len()
            )));
        }

        let flag_byte = raw[0];
        let sequence = raw[1];
        let length = u16::from_le_bytes([raw[2], raw[3]]);
        let available = raw.len() - REPLY_HEADER_SIZE;

        if length as usize > available {
            return Err(DmdError::malformed(format!(
                "reply length {} exceeds the {} bytes available",
                length, available
            )));
        }

        Ok(Self {
            error_flag: flag_byte & FLAG_ERROR != 0,
            flag_byte,
            sequence,
            length,
            data: raw[REPLY_HEADER_SIZE..REPLY_HEADER_SIZE + length as usize].to_vec(),
        })
    }

    /// Data byte at `index`, failing when the reply is too short
    pub fn byte(&self, index: usize) -> Result<u8> {
        self.data.get(index).copied().ok_or_else(|| {
            DmdError::malformed(format!(
                "reply carries {} data byte(s), byte {} requested",
                self.data.len(),
                index
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_bytes() {
        assert_eq!(Direction::Write.flag_byte(), 0x40);
        assert_eq!(Direction::Read.flag_byte(), 0xC0);
    }

    #[test]
    fn test_standby_command_encoding() {
        let frame = CommandFrame::write(0x00, 0x0200, vec![1]);
        assert_eq!(frame.encode().unwrap(), vec![0x40, 0x00, 0x03, 0x00, 0x00, 0x02, 0x01]);
        assert!(!frame.expects_reply());
    }

    #[test]
    fn test_read_command_encoding() {
        let frame = CommandFrame::read(0x0A, 0x1A0A);
        assert_eq!(frame.encode().unwrap(), vec![0xC0, 0x0A, 0x02, 0x00, 0x0A, 0x1A]);
        assert!(frame.expects_reply());
    }

    #[test]
    fn test_length_field_counts_command_code() {
        let frame = CommandFrame::write(0x11, 0x1A2B, vec![0u8; 506]);
        assert_eq!(frame.length_field().unwrap(), 508);
        let encoded = frame.encode().unwrap();
        assert_eq!(&encoded[2..4], &[0xFC, 0x01]);
        assert_eq!(encoded.len(), HEADER_SIZE + 506);

        let oversized = CommandFrame::write(0, 0x1A2B, vec![0u8; 0xFFFE]);
        assert!(oversized.encode().is_err());
    }

    #[test]
    fn test_reply_decode() {
        let mut raw = [0u8; 64];
        raw[..6].copy_from_slice(&[0xC0, 0x0A, 0x02, 0x00, 0x15, 0x7F]);

        let reply = ReplyFrame::decode(&raw).unwrap();
        assert!(!reply.error_flag);
        assert_eq!(reply.flag_byte, 0xC0);
        assert_eq!(reply.sequence, 0x0A);
        assert_eq!(reply.length, 2);
        assert_eq!(reply.data, vec![0x15, 0x7F]);
        assert_eq!(reply.byte(1).unwrap(), 0x7F);
        assert!(reply.byte(2).is_err());
    }

    #[test]
    fn test_reply_error_flag() {
        let reply = ReplyFrame::decode(&[0xE0, 0x01, 0x00, 0x00]).unwrap();
        assert!(reply.error_flag);
        assert!(reply.data.is_empty());
    }

    #[test]
    fn test_reply_decode_rejects_malformed() {
        assert!(matches!(ReplyFrame::decode(&[0xC0, 0x00, 0x01]), Err(DmdError::MalformedReply(_))));
        assert!(matches!(
            ReplyFrame::decode(&[0xC0, 0x00, 0x05, 0x00, 0x01, 0x02]),
            Err(DmdError::MalformedReply(_))
        ));
    }

    #[test]
    fn test_command_survives_decode_of_first_report() {
        for (sequence, command, payload) in [
            (0u8, 0x0200u16, vec![1u8]),
            (0x22, 0x0100, vec![]),
            (0xFF, 0x1A34, (0..12).collect::<Vec<u8>>()),
            (7, 0x1A03, vec![0xAA; 58]),
        ] {
            let frame = CommandFrame::write(sequence, command, payload.clone());
            let mut report = frame.encode().unwrap();
            report.resize(64, 0);

            let decoded = ReplyFrame::decode(&report).unwrap();
            assert_eq!(decoded.sequence, sequence);
            assert_eq!(decoded.length as usize, payload.len() + 2);
            assert_eq!(&decoded.data[..2], &command.to_le_bytes());
            assert_eq!(&decoded.data[2..], &payload[..]);
        }
    }
}
