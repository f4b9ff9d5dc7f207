//! candump log reader
//!
//! Reads the text format written by `candump -l` / `candump -L`:
//!
//! ```text
//! (1436509052.249713) can0 118#6400
//! (1436509052.250101) can0 7F0#05
//! (1436509052.250377) can0 00000640#0102
//! (1436509052.251000) can0 119#R
//! ```
//!
//! Three hex digits give a standard identifier, eight an extended one.

use anyhow::{anyhow, bail, Context, Result};
use can_signal_decoder::{Frame, FrameFormat, FrameKind};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

/// A frame together with where and when it was captured
#[derive(Debug, Clone)]
pub struct LoggedFrame {
    pub timestamp: Option<DateTime<Utc>>,
    pub interface: Option<String>,
    pub frame: Frame,
}

/// Read every frame of a candump log file
///
/// Lines that do not parse are logged and skipped. Only a failure to read the
/// file is an error.
pub fn read_log(path: &Path) -> Result<Vec<LoggedFrame>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read log file: {:?}", path))?;

    let mut frames = Vec::new();
    let mut skipped = 0usize;
    for (line_no, line) in content.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(frame)) => frames.push(frame),
            Ok(None) => {}
            Err(e) => {
                log::warn!("{:?} line {}: skipping: {:#}", path, line_no + 1, e);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        log::info!("Read {} frames from {:?} ({} lines skipped)", frames.len(), path, skipped);
    } else {
        log::info!("Read {} frames from {:?}", frames.len(), path);
    }
    Ok(frames)
}

/// Parse one log line; blank lines and `#` comments give `None`
pub fn parse_line(line: &str) -> Result<Option<LoggedFrame>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut fields: Vec<&str> = line.split_whitespace().collect();

    let timestamp = match fields.first().copied() {
        Some(field) if field.starts_with('(') => {
            let ts = parse_timestamp(field)?;
            fields.remove(0);
            Some(ts)
        }
        _ => None,
    };

    let (interface, frame_field) = match fields.as_slice() {
        [frame] => (None, *frame),
        [iface, frame, ..] => (Some(iface.to_string()), *frame),
        [] => bail!("missing frame field"),
    };

    Ok(Some(LoggedFrame {
        timestamp,
        interface,
        frame: parse_frame(frame_field)?,
    }))
}

/// Parse `(seconds.micros)`
fn parse_timestamp(field: &str) -> Result<DateTime<Utc>> {
    let inner = field
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| anyhow!("malformed timestamp {:?}", field))?;

    let (secs, frac) = inner.split_once('.').unwrap_or((inner, "0"));
    let secs: i64 = secs
        .parse()
        .with_context(|| format!("malformed timestamp {:?}", field))?;

    // Right-pad the fraction to nanoseconds
    let digits: String = frac.chars().chain(std::iter::repeat('0')).take(9).collect();
    let nanos: u32 = digits
        .parse()
        .with_context(|| format!("malformed timestamp {:?}", field))?;

    DateTime::from_timestamp(secs, nanos)
        .ok_or_else(|| anyhow!("timestamp out of range {:?}", field))
}

/// Parse `ID#DATA` or `ID#R`
fn parse_frame(field: &str) -> Result<Frame> {
    let (id_str, data_str) = field
        .split_once('#')
        .ok_or_else(|| anyhow!("missing '#' in frame {:?}", field))?;

    let identifier = u32::from_str_radix(id_str, 16)
        .with_context(|| format!("malformed CAN ID {:?}", id_str))?;

    let format = match id_str.len() {
        3 => FrameFormat::Standard,
        8 => FrameFormat::Extended,
        n => bail!("CAN ID {:?} has {} digits, expected 3 or 8", id_str, n),
    };

    // Remote frames may carry a DLC after the R, which has no payload to keep
    if data_str.starts_with('R') {
        return Ok(Frame::remote(identifier, format)?);
    }

    let payload = parse_hex_bytes(data_str)?;
    Ok(Frame::new(identifier, &payload, format, FrameKind::Data)?)
}

fn parse_hex_bytes(data: &str) -> Result<Vec<u8>> {
    let data: String = data.chars().filter(|c| *c != '.').collect();
    if !data.is_ascii() || data.len() % 2 != 0 {
        bail!("malformed data field {:?}", data);
    }

    (0..data.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&data[i..i + 2], 16)
                .with_context(|| format!("malformed data byte {:?}", &data[i..i + 2]))
        })
        .collect()
}
