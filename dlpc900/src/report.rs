/*!
Splitting frames into fixed-size HID reports.

The transport only moves 64-byte reports. A frame that fits is sent as one
zero-padded report. A longer frame fills its first report completely (header
plus the first 58 payload bytes) and continues in raw 64-byte reports with no
header of their own; the last one is zero-padded. Replies always fit in a
single report.
*/

use crate::error::Result;
use crate::frame::{CommandFrame, ReplyFrame};
use crate::protocol::{FIRST_REPORT_CAPACITY, HEADER_SIZE, REPORT_SIZE};

/// One transport report
pub type Report = [u8; REPORT_SIZE];

/// Encode `frame` and cut it into the reports that carry it, in send order
pub fn frame_to_reports(frame: &CommandFrame) -> Result<Vec<Report>> {
    let encoded = frame.encode()?;

    let (first, rest) = encoded.split_at(encoded.len().min(REPORT_SIZE));
    let mut reports = Vec::with_capacity(report_count(frame.payload.len()));
    reports.push(padded(first));
    reports.extend(rest.chunks(REPORT_SIZE).map(padded));

    Ok(reports)
}

/// Number of reports needed for a frame with `payload_len` payload bytes
pub fn report_count(payload_len: usize) -> usize {
    if payload_len <= FIRST_REPORT_CAPACITY {
        1
    } else {
        1 + (payload_len - FIRST_REPORT_CAPACITY).div_ceil(REPORT_SIZE)
    }
}

/// Parse the single report a reply arrives in
pub fn reply_from_report(report: &Report) -> Result<ReplyFrame> {
    ReplyFrame::decode(report)
}

fn padded(chunk: &[u8]) -> Report {
    let mut report = [0u8; REPORT_SIZE];
    report[..chunk.len()].copy_from_slice(chunk);
    report
}

// The first report's payload share is what is left after the header
const _: () = assert!(HEADER_SIZE + FIRST_REPORT_CAPACITY == REPORT_SIZE);
