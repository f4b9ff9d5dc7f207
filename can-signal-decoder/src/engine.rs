//! Signal Decoding Engine
//!
//! Extracts signal values from CAN frames based on signal descriptors.
//! Handles bit extraction, masking, sign interpretation and physical value
//! conversion.
//!
//! Bit numbering is little-endian, LSB-first: bit 0 is the least significant
//! bit of payload byte 0, bit 8 the least significant bit of byte 1, and so
//! on. A descriptor's `start_bit` is counted in this numbering.

use crate::signals::{SignalDescriptor, ValueType};
use crate::status::StatusCodec;
use crate::types::{DecodedSignal, DecodedValue, DecoderError, Frame, FrameKind, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Decode engine - turns (frame, descriptor) pairs into typed values
///
/// The engine is stateless; every method is a pure function of its inputs.
pub struct DecodeEngine;

impl DecodeEngine {
    /// Decode one signal from a frame
    ///
    /// # Errors
    /// * `MismatchedIdentifierError` if the descriptor belongs to another ID
    /// * `NoPayloadError` for remote frames
    /// * `OutOfBoundsError` if the signal reaches past the frame's payload
    pub fn decode(frame: &Frame, descriptor: &SignalDescriptor) -> Result<DecodedValue> {
        let raw_value = Self::extract(frame, descriptor)?;
        Ok(Self::interpret(raw_value, descriptor))
    }

    /// Decode one signal and attach the descriptor's metadata
    pub fn decode_signal(frame: &Frame, descriptor: &SignalDescriptor) -> Result<DecodedSignal> {
        let raw_value = Self::extract(frame, descriptor)?;

        Ok(DecodedSignal {
            name: descriptor.name().to_string(),
            identifier: descriptor.identifier(),
            value: Self::interpret(raw_value, descriptor),
            raw_value,
            unit: descriptor.unit().map(str::to_string),
        })
    }

    /// Extract the masked raw value of a signal
    ///
    /// This is the core extraction algorithm; no scaling is applied.
    pub fn extract(frame: &Frame, descriptor: &SignalDescriptor) -> Result<u64> {
        if frame.identifier() != descriptor.identifier() {
            return Err(DecoderError::MismatchedIdentifierError {
                frame: frame.identifier(),
                descriptor: descriptor.identifier(),
            });
        }

        if frame.kind() == FrameKind::Remote {
            return Err(DecoderError::NoPayloadError(frame.identifier()));
        }

        let start_bit = descriptor.start_bit() as usize;
        let width = descriptor.bit_width();

        // Never read past the occupied payload
        if start_bit + width as usize > frame.bit_len() {
            return Err(DecoderError::OutOfBoundsError {
                identifier: frame.identifier(),
                start_bit: descriptor.start_bit(),
                width,
                available: frame.bit_len(),
            });
        }

        let region = Self::extract_little_endian(frame.data_register(), start_bit, width);
        Ok(Self::apply_mask(region, descriptor.bitmask()))
    }

    /// Keep only the bits selected by `bitmask`
    pub fn apply_mask(value: u64, bitmask: u32) -> u64 {
        value & bitmask as u64
    }

    /// Physical value: `raw * multiplier / divisor`
    pub fn scale(raw: f64, descriptor: &SignalDescriptor) -> f64 {
        raw * descriptor.multiplier() / descriptor.divisor()
    }

    /// Read `width` bits starting at `start_bit` from a full payload register
    ///
    /// The caller guarantees `start_bit + width <= 64`.
    fn extract_little_endian(data: &[u8; 8], start_bit: usize, width: u8) -> u64 {
        let word = LittleEndian::read_u64(data);
        let shifted = word >> start_bit;

        if width >= 64 {
            shifted
        } else {
            shifted & ((1u64 << width) - 1)
        }
    }

    /// Turn a masked raw value into the descriptor's value type
    ///
    /// Integral types are scaled in floating point and then truncated toward
    /// zero; results outside the target range saturate. Status words skip
    /// scaling entirely.
    fn interpret(raw_value: u64, descriptor: &SignalDescriptor) -> DecodedValue {
        match descriptor.value_type() {
            ValueType::UInt8 => {
                DecodedValue::UInt8(Self::scale(raw_value as f64, descriptor) as u8)
            }
            ValueType::Int16 => {
                let signed = raw_value as u16 as i16;
                DecodedValue::Int16(Self::scale(signed as f64, descriptor) as i16)
            }
            ValueType::Boolean => DecodedValue::Boolean(raw_value != 0),
            ValueType::Float => DecodedValue::Float(Self::scale(raw_value as f64, descriptor)),
            ValueType::PdmStatus => DecodedValue::PdmStatus(StatusCodec::decode_status(raw_value)),
        }
    }
}
