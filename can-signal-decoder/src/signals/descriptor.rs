//! Signal descriptors
//!
//! A descriptor says where one signal lives in frames of a given identifier
//! and how its raw bits turn into a physical value.

use crate::types::{DecoderError, Result, MAX_PAYLOAD_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the extracted bits of a signal are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Unsigned 8-bit integer
    #[serde(rename = "uint8", alias = "u8")]
    UInt8,
    /// Two's-complement 16-bit integer
    #[serde(rename = "int16", alias = "i16")]
    Int16,
    /// Non-zero masked bits map to `true`
    #[serde(rename = "boolean", alias = "bool")]
    Boolean,
    /// 32-bit integer raw value, scaled into a float
    #[serde(rename = "float")]
    Float,
    /// PDM output status word, decoded into flags
    #[serde(rename = "pdm_status", alias = "pdm")]
    PdmStatus,
}

impl ValueType {
    /// Natural width in bits of this type's raw value
    pub fn natural_width(self) -> u8 {
        match self {
            ValueType::UInt8 | ValueType::Boolean | ValueType::PdmStatus => 8,
            ValueType::Int16 => 16,
            ValueType::Float => 32,
        }
    }

    /// Width in bits of the region actually read for `bitmask`
    ///
    /// The region spans up to the highest bit the mask selects, never less
    /// than one bit and never more than the natural width. Mask bits above the
    /// natural width are ignored.
    pub fn bit_width(self, bitmask: u32) -> u8 {
        let natural = self.natural_width();
        let mask = bitmask as u64 & ((1u64 << natural) - 1);
        let spanned = (64 - mask.leading_zeros()) as u8;
        spanned.max(1)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::UInt8 => "uint8",
            ValueType::Int16 => "int16",
            ValueType::Boolean => "boolean",
            ValueType::Float => "float",
            ValueType::PdmStatus => "pdm_status",
        };
        f.write_str(name)
    }
}

/// Immutable description of one signal within a frame
///
/// `start_bit` is a bit offset into the payload, counted from the LSB of the
/// first byte (little-endian, LSB-first).
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDescriptor {
    name: String,
    identifier: u32,
    start_bit: u16,
    bitmask: u32,
    multiplier: f64,
    divisor: f64,
    value_type: ValueType,
    unit: Option<String>,
}

impl SignalDescriptor {
    /// Create a descriptor, validating the start bit and scale factors
    pub fn new(
        identifier: u32,
        start_bit: u16,
        bitmask: u32,
        multiplier: f64,
        divisor: f64,
        value_type: ValueType,
    ) -> Result<Self> {
        if start_bit as usize >= MAX_PAYLOAD_LEN * 8 {
            return Err(DecoderError::InvalidDescriptorError(format!(
                "start bit {} outside a {}-bit payload",
                start_bit,
                MAX_PAYLOAD_LEN * 8
            )));
        }

        if divisor == 0.0 || !divisor.is_finite() {
            return Err(DecoderError::InvalidDescriptorError(format!(
                "divisor must be finite and non-zero, got {}",
                divisor
            )));
        }

        if !multiplier.is_finite() {
            return Err(DecoderError::InvalidDescriptorError(format!(
                "multiplier must be finite, got {}",
                multiplier
            )));
        }

        Ok(Self {
            name: format!("0x{:X}@{}", identifier, start_bit),
            identifier,
            start_bit,
            bitmask,
            multiplier,
            divisor,
            value_type,
            unit: None,
        })
    }

    /// Builder method: set the signal name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder method: set the engineering unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identifier(&self) -> u32 {
        self.identifier
    }

    pub fn start_bit(&self) -> u16 {
        self.start_bit
    }

    pub fn bitmask(&self) -> u32 {
        self.bitmask
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn divisor(&self) -> f64 {
        self.divisor
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Width in bits of the region this descriptor reads
    pub fn bit_width(&self) -> u8 {
        self.value_type.bit_width(self.bitmask)
    }

    /// Key used by the registry's uniqueness policy
    pub(crate) fn layout_key(&self) -> (u32, u16, u32) {
        (self.identifier, self.start_bit, self.bitmask)
    }
}
