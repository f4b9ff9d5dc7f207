//! Core types for the CAN signal decoder library
//!
//! This module defines the frame value object handed over by the transport
//! layer, the values the decode engine produces, and the error taxonomy shared
//! by every decode path.

use crate::status::PdmOutputStatus;
use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Payload capacity of a classic CAN 2.0B frame
pub const MAX_PAYLOAD_LEN: usize = 8;

/// Mask for 11-bit standard identifiers
pub const STANDARD_ID_MASK: u32 = 0x0000_07FF;

/// Mask for 29-bit extended identifiers
pub const EXTENDED_ID_MASK: u32 = 0x1FFF_FFFF;

/// Identifier addressing format of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameFormat {
    /// 11-bit identifier
    Standard,
    /// 29-bit identifier
    Extended,
}

impl FrameFormat {
    /// Largest identifier representable in this format
    pub fn id_mask(self) -> u32 {
        match self {
            FrameFormat::Standard => STANDARD_ID_MASK,
            FrameFormat::Extended => EXTENDED_ID_MASK,
        }
    }
}

/// Kind of frame as seen on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Data frame carrying a payload
    Data,
    /// Remote transmission request, no payload
    Remote,
}

/// One received CAN message
///
/// Frames are validated on construction and never mutated afterwards, so a
/// single frame can be shared by any number of concurrent decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    identifier: u32,
    data: [u8; MAX_PAYLOAD_LEN],
    len: u8,
    format: FrameFormat,
    kind: FrameKind,
}

impl Frame {
    /// Build a frame from a payload slice
    ///
    /// Fails with `InvalidFrameError` when the payload is longer than 8 bytes,
    /// when the identifier does not fit the addressing format, or when a
    /// remote frame is given payload bytes.
    pub fn new(
        identifier: u32,
        payload: &[u8],
        format: FrameFormat,
        kind: FrameKind,
    ) -> Result<Self> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(DecoderError::InvalidFrameError(format!(
                "payload of {} bytes exceeds capacity of {}",
                payload.len(),
                MAX_PAYLOAD_LEN
            )));
        }

        let mut data = [0u8; MAX_PAYLOAD_LEN];
        data[..payload.len()].copy_from_slice(payload);
        Self::from_raw(identifier, data, payload.len() as u8, format, kind)
    }

    /// Build a frame from a fixed 8-byte buffer and an explicit length
    ///
    /// This mirrors how controllers usually hand frames over (a full data
    /// register plus a DLC). Bytes past `len` are cleared.
    pub fn from_raw(
        identifier: u32,
        mut data: [u8; MAX_PAYLOAD_LEN],
        len: u8,
        format: FrameFormat,
        kind: FrameKind,
    ) -> Result<Self> {
        if len as usize > MAX_PAYLOAD_LEN {
            return Err(DecoderError::InvalidFrameError(format!(
                "length {} exceeds capacity of {}",
                len, MAX_PAYLOAD_LEN
            )));
        }

        if identifier & !format.id_mask() != 0 {
            return Err(DecoderError::InvalidFrameError(format!(
                "identifier 0x{:X} does not fit a {:?} frame",
                identifier, format
            )));
        }

        if kind == FrameKind::Remote && len != 0 {
            return Err(DecoderError::InvalidFrameError(format!(
                "remote frame 0x{:X} supplied with {} payload bytes",
                identifier, len
            )));
        }

        data[len as usize..].fill(0);

        Ok(Self {
            identifier,
            data,
            len,
            format,
            kind,
        })
    }

    /// Shorthand for a standard data frame
    pub fn standard(identifier: u32, payload: &[u8]) -> Result<Self> {
        Self::new(identifier, payload, FrameFormat::Standard, FrameKind::Data)
    }

    /// Shorthand for an extended data frame
    pub fn extended(identifier: u32, payload: &[u8]) -> Result<Self> {
        Self::new(identifier, payload, FrameFormat::Extended, FrameKind::Data)
    }

    /// Shorthand for a remote frame
    pub fn remote(identifier: u32, format: FrameFormat) -> Result<Self> {
        Self::new(identifier, &[], format, FrameKind::Remote)
    }

    /// CAN arbitration identifier
    pub fn identifier(&self) -> u32 {
        self.identifier
    }

    /// Occupied payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    /// Number of occupied payload bytes (DLC)
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// True if the frame carries no payload bytes
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of payload bits available for extraction
    pub fn bit_len(&self) -> usize {
        self.len() * 8
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Full payload register, zero past `len()`
    pub(crate) fn data_register(&self) -> &[u8; MAX_PAYLOAD_LEN] {
        &self.data
    }
}

/// Errors that can occur while building frames, loading descriptors or decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Invalid frame: {0}")]
    InvalidFrameError(String),

    #[error("Frame ID 0x{frame:X} does not match descriptor ID 0x{descriptor:X}")]
    MismatchedIdentifierError { frame: u32, descriptor: u32 },

    #[error("Frame ID 0x{0:X} is a remote frame and carries no payload")]
    NoPayloadError(u32),

    #[error(
        "Signal at bit {start_bit} with width {width} exceeds {available} payload bits of frame 0x{identifier:X}"
    )]
    OutOfBoundsError {
        identifier: u32,
        start_bit: u16,
        width: u8,
        available: usize,
    },

    #[error(
        "Duplicate descriptor for CAN ID 0x{identifier:X} (start bit {start_bit}, bitmask 0x{bitmask:X})"
    )]
    DuplicateDescriptorError {
        identifier: u32,
        start_bit: u16,
        bitmask: u32,
    },

    #[error("Invalid signal descriptor: {0}")]
    InvalidDescriptorError(String),

    #[error("Unknown device: {0}")]
    UnknownDeviceError(String),

    #[error("Failed to parse signal table: {0}")]
    SignalTableParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Typed value produced by one decode
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodedValue {
    UInt8(u8),
    Int16(i16),
    Boolean(bool),
    Float(f64),
    PdmStatus(PdmOutputStatus),
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::UInt8(v) => write!(f, "{}", v),
            DecodedValue::Int16(v) => write!(f, "{}", v),
            DecodedValue::Float(v) => write!(f, "{:.3}", v),
            DecodedValue::Boolean(v) => write!(f, "{}", if *v { "true" } else { "false" }),
            DecodedValue::PdmStatus(status) => write!(f, "{}", status),
        }
    }
}

impl DecodedValue {
    /// Numeric view of the value; a status word maps to its encoded bits
    pub fn as_f64(&self) -> f64 {
        match self {
            DecodedValue::UInt8(v) => *v as f64,
            DecodedValue::Int16(v) => *v as f64,
            DecodedValue::Float(v) => *v,
            DecodedValue::Boolean(v) => f64::from(u8::from(*v)),
            DecodedValue::PdmStatus(status) => status.bits() as f64,
        }
    }

    /// Convert to i64 if the value is scalar
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DecodedValue::UInt8(v) => Some(*v as i64),
            DecodedValue::Int16(v) => Some(*v as i64),
            DecodedValue::Float(v) => Some(*v as i64),
            DecodedValue::Boolean(v) => Some(i64::from(*v)),
            DecodedValue::PdmStatus(_) => None,
        }
    }

    /// Status flags, if this value came from a PDM status descriptor
    pub fn as_status(&self) -> Option<PdmOutputStatus> {
        match self {
            DecodedValue::PdmStatus(status) => Some(*status),
            _ => None,
        }
    }
}

/// A decoded value together with the descriptor metadata it came from
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSignal {
    /// Signal name from the signal table
    pub name: String,
    /// CAN identifier the signal was read from
    pub identifier: u32,
    /// Typed value
    pub value: DecodedValue,
    /// Masked raw value before scaling (useful for debugging)
    pub raw_value: u64,
    /// Engineering unit (e.g., "rpm", "°C", "V")
    pub unit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_construction() {
        let frame = Frame::standard(0x118, &[0x64, 0x00]).unwrap();
        assert_eq!(frame.identifier(), 0x118);
        assert_eq!(frame.payload(), &[0x64, 0x00]);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.bit_len(), 16);
        assert_eq!(frame.format(), FrameFormat::Standard);
        assert_eq!(frame.kind(), FrameKind::Data);
    }

    #[test]
    fn test_frame_rejects_long_payload() {
        let result = Frame::standard(0x118, &[0u8; 9]);
        assert!(matches!(result, Err(DecoderError::InvalidFrameError(_))));

        let result = Frame::from_raw(0x118, [0u8; 8], 9, FrameFormat::Standard, FrameKind::Data);
        assert!(matches!(result, Err(DecoderError::InvalidFrameError(_))));
    }

    #[test]
    fn test_frame_identifier_width() {
        assert!(Frame::standard(0x7FF, &[]).is_ok());
        assert!(Frame::standard(0x800, &[]).is_err());
        assert!(Frame::extended(0x1FFF_FFFF, &[]).is_ok());
        assert!(Frame::extended(0x2000_0000, &[]).is_err());
    }

    #[test]
    fn test_remote_frame_with_payload_is_rejected() {
        assert!(Frame::remote(0x7F0, FrameFormat::Standard).is_ok());
        let result = Frame::new(0x7F0, &[0x01], FrameFormat::Standard, FrameKind::Remote);
        assert!(matches!(result, Err(DecoderError::InvalidFrameError(_))));
    }

    #[test]
    fn test_from_raw_clears_unused_bytes() {
        let frame =
            Frame::from_raw(0x640, [0xFF; 8], 2, FrameFormat::Standard, FrameKind::Data).unwrap();
        assert_eq!(frame.payload(), &[0xFF, 0xFF]);
        assert_eq!(frame.data_register(), &[0xFF, 0xFF, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_decoded_value_conversions() {
        assert_eq!(DecodedValue::UInt8(100).as_f64(), 100.0);
        assert_eq!(DecodedValue::Int16(-5).as_i64(), Some(-5));
        assert_eq!(DecodedValue::Boolean(true).as_f64(), 1.0);
        assert_eq!(DecodedValue::Boolean(false).as_f64(), 0.0);
        assert_eq!(DecodedValue::Boolean(true).as_i64(), Some(1));
        assert_eq!(DecodedValue::Float(2.75).as_i64(), Some(2));

        let status = DecodedValue::PdmStatus(PdmOutputStatus::ACTIVE);
        assert_eq!(status.as_i64(), None);
        assert_eq!(status.as_status(), Some(PdmOutputStatus::ACTIVE));
    }

    #[test]
    fn test_decoded_value_display() {
        assert_eq!(format!("{}", DecodedValue::UInt8(42)), "42");
        assert_eq!(format!("{}", DecodedValue::Float(3.14159)), "3.142");
        assert_eq!(format!("{}", DecodedValue::Boolean(false)), "false");
    }
}
