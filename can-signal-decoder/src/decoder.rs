//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct is the entry point for loading signal tables and
//! decoding frames.

use crate::config::DecoderConfig;
use crate::devices::Device;
use crate::engine::DecodeEngine;
use crate::signals::{RegistryStats, SignalDescriptor, SignalRegistry};
use crate::types::{DecodedSignal, DecoderError, Frame, Result};
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
///
/// Load every signal table first, then share the decoder (by reference or
/// through an `Arc`) with whatever decodes frames. Decoding only needs `&self`.
pub struct Decoder {
    /// Descriptor registry (loaded from signal tables)
    registry: SignalRegistry,
    config: DecoderConfig,
}

impl Decoder {
    /// Create a new decoder instance with default settings
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Create a decoder with the given configuration
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            registry: SignalRegistry::new().with_unique_layouts(config.reject_duplicates),
            config,
        }
    }

    /// Register a single descriptor
    pub fn register(&mut self, descriptor: SignalDescriptor) -> Result<()> {
        self.registry.register(descriptor)
    }

    /// Load a signal table file and register its descriptors
    ///
    /// A table that fails to load registers nothing.
    ///
    /// # Example
    /// ```no_run
    /// use can_signal_decoder::Decoder;
    /// use std::path::Path;
    ///
    /// let mut decoder = Decoder::new();
    /// decoder.add_signal_table(Path::new("motec.toml")).unwrap();
    /// ```
    pub fn add_signal_table(&mut self, path: &Path) -> Result<()> {
        log::info!("Loading signal table: {:?}", path);

        let descriptors = crate::signals::table::parse_signal_table_file(path)?;
        self.registry.register_all(descriptors)?;

        log::info!("Signal table loaded successfully: {:?}", path);
        Ok(())
    }

    /// Register descriptors from signal table text
    ///
    /// A table that fails to load registers nothing.
    pub fn add_signal_table_str(&mut self, content: &str, source: &str) -> Result<()> {
        let descriptors = crate::signals::table::parse_signal_table(content, source)?;
        self.registry.register_all(descriptors)
    }

    /// Decode every signal registered for the frame's identifier
    ///
    /// Each descriptor yields its own result, so one failing signal (e.g. a
    /// payload shorter than expected) does not hide the others. Unknown
    /// identifiers give an empty vector.
    pub fn decode_frame(&self, frame: &Frame) -> Vec<Result<DecodedSignal>> {
        self.registry
            .lookup(frame.identifier())
            .iter()
            .map(|descriptor| DecodeEngine::decode_signal(frame, descriptor))
            .collect()
    }

    /// Decode a stream of frames lazily, see [`Decoder::process_frame`]
    pub fn decode_frames<I>(&self, frames: I) -> DecodingIterator<'_, I::IntoIter>
    where
        I: IntoIterator<Item = Frame>,
    {
        DecodingIterator::new(frames.into_iter(), self)
    }

    /// Decode one frame from a stream
    ///
    /// Returns `None` for identifiers outside the message filter, and for
    /// frames no descriptor matched unless `emit_undecoded_frames` is set.
    pub fn process_frame(&self, frame: Frame) -> Option<DecodedFrame> {
        let can_id = frame.identifier();

        if !self.config.should_process_message(can_id) {
            log::trace!("Filtered CAN ID: 0x{:X}", can_id);
            return None;
        }

        let device = self.registry.known_device(can_id);
        let mut signals = Vec::new();
        let mut errors = Vec::new();

        for result in self.decode_frame(&frame) {
            match result {
                Ok(signal) => signals.push(signal),
                Err(e) => errors.push(e),
            }
        }

        let decoded = DecodedFrame {
            frame,
            device,
            signals,
            errors,
        };

        if decoded.is_undecoded() {
            log::trace!("No descriptors for CAN ID: 0x{:X}", can_id);
            if !self.config.emit_undecoded_frames {
                return None;
            }
        } else {
            log::debug!(
                "Decoded CAN ID 0x{:X}: {} signals, {} skipped",
                can_id,
                decoded.signals.len(),
                decoded.errors.len()
            );
        }

        Some(decoded)
    }

    /// Read access to the loaded registry
    pub fn registry(&self) -> &SignalRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Get statistics about the loaded registry
    pub fn registry_stats(&self) -> RegistryStats {
        self.registry.stats()
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// All decode results of one frame
#[derive(Debug)]
pub struct DecodedFrame {
    /// The frame that was decoded
    pub frame: Frame,
    /// Known device transmitting on this identifier
    pub device: Option<Device>,
    /// Successfully decoded signals, in registration order
    pub signals: Vec<DecodedSignal>,
    /// Descriptors that could not be decoded from this frame
    pub errors: Vec<DecoderError>,
}

impl DecodedFrame {
    /// True if no descriptor was registered for this frame
    pub fn is_undecoded(&self) -> bool {
        self.signals.is_empty() && self.errors.is_empty()
    }
}

/// Iterator that decodes CAN frames into decoded frames
pub struct DecodingIterator<'a, I>
where
    I: Iterator<Item = Frame>,
{
    frame_iter: I,
    decoder: &'a Decoder,
}

impl<'a, I> DecodingIterator<'a, I>
where
    I: Iterator<Item = Frame>,
{
    fn new(frame_iter: I, decoder: &'a Decoder) -> Self {
        Self { frame_iter, decoder }
    }
}

impl<'a, I> Iterator for DecodingIterator<'a, I>
where
    I: Iterator<Item = Frame>,
{
    type Item = DecodedFrame;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.frame_iter.next()?;
            if let Some(decoded) = self.decoder.process_frame(frame) {
                return Some(decoded);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::ValueType;
    use crate::types::DecodedValue;

    fn decoder_with_signals() -> Decoder {
        let mut decoder = Decoder::new();
        decoder
            .register(
                SignalDescriptor::new(0x118, 0, 0xFF, 1.0, 1.0, ValueType::UInt8)
                    .unwrap()
                    .with_name("CoolantTemp"),
            )
            .unwrap();
        decoder
            .register(
                SignalDescriptor::new(0x118, 8, 0xFFFF, 1.0, 1.0, ValueType::Int16)
                    .unwrap()
                    .with_name("EngineSpeed"),
            )
            .unwrap();
        decoder
    }

    #[test]
    fn test_decoder_creation() {
        let decoder = Decoder::new();
        let stats = decoder.registry_stats();
        assert_eq!(stats.num_identifiers, 0);
        assert_eq!(stats.num_descriptors, 0);
    }

    #[test]
    fn test_decode_frame_keeps_going_after_failure() {
        let decoder = decoder_with_signals();

        // Two bytes: the 8-bit signal fits, the 16-bit one at bit 8 does not
        let frame = Frame::standard(0x118, &[0x5A, 0x10]).unwrap();
        let results = decoder.decode_frame(&frame);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().value, DecodedValue::UInt8(0x5A));
        assert!(matches!(results[1], Err(DecoderError::OutOfBoundsError { .. })));
    }

    #[test]
    fn test_unknown_identifier_decodes_nothing() {
        let decoder = decoder_with_signals();
        let frame = Frame::standard(0x123, &[0x01]).unwrap();
        assert!(decoder.decode_frame(&frame).is_empty());
    }

    #[test]
    fn test_decode_frames_skips_undecoded() {
        let decoder = decoder_with_signals();
        let frames = vec![
            Frame::standard(0x123, &[0x01]).unwrap(),
            Frame::standard(0x118, &[0x5A, 0xE8, 0x03]).unwrap(),
        ];

        let decoded: Vec<DecodedFrame> = decoder.decode_frames(frames).collect();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].device, Some(Device::Ecu1));
        assert_eq!(decoded[0].signals[1].value, DecodedValue::Int16(1000));
        assert!(decoded[0].errors.is_empty());
    }

    #[test]
    fn test_decode_frames_with_filter_and_undecoded() {
        let mut decoder = Decoder::with_config(
            DecoderConfig::new()
                .with_message_filter(vec![0x118, 0x7F0])
                .with_undecoded_frames(true),
        );
        decoder
            .register(SignalDescriptor::new(0x118, 0, 0xFF, 1.0, 1.0, ValueType::UInt8).unwrap())
            .unwrap();

        let frames = vec![
            Frame::standard(0x119, &[0x01]).unwrap(),
            Frame::standard(0x7F0, &[0x01]).unwrap(),
            Frame::standard(0x118, &[0x01]).unwrap(),
        ];

        let decoded: Vec<DecodedFrame> = decoder.decode_frames(frames).collect();
        assert_eq!(decoded.len(), 2);
        assert!(decoded[0].is_undecoded());
        assert_eq!(decoded[0].device, Some(Device::Pdm1));
        assert_eq!(decoded[1].signals.len(), 1);
    }

    #[test]
    fn test_duplicate_policy_from_config() {
        let table = r#"
            [[signal]]
            name = "A"
            id = 0x118
            start_bit = 0
            bitmask = 0xFF
            type = "uint8"

            [[signal]]
            name = "B"
            id = 0x118
            start_bit = 0
            bitmask = 0xFF
            type = "float"
            multiplier = 0.1
        "#;

        let mut lenient = Decoder::new();
        lenient.add_signal_table_str(table, "dup.toml").unwrap();
        assert_eq!(lenient.registry_stats().num_descriptors, 2);

        let mut strict = Decoder::with_config(DecoderConfig::new().with_reject_duplicates(true));
        let result = strict.add_signal_table_str(table, "dup.toml");
        assert!(matches!(result, Err(DecoderError::DuplicateDescriptorError { .. })));
    }

    #[test]
    fn test_failed_table_load_registers_nothing() {
        let broken = r#"
            [[signal]]
            name = "Lambda"
            id = 0x118
            start_bit = 0
            bitmask = 0xFF
            type = "uint8"

            [[signal]]
            name = "LambdaScaled"
            id = 0x118
            start_bit = 0
            bitmask = 0xFF
            type = "float"
            divisor = 100.0
        "#;
        let fixed = r#"
            [[signal]]
            name = "Lambda"
            id = 0x118
            start_bit = 0
            bitmask = 0xFF
            type = "uint8"
        "#;

        let mut decoder = Decoder::with_config(DecoderConfig::new().with_reject_duplicates(true));
        assert!(decoder.add_signal_table_str(broken, "broken.toml").is_err());
        assert_eq!(decoder.registry_stats().num_descriptors, 0);
        assert!(decoder.registry().find_signal("Lambda").is_none());

        // The corrected table loads cleanly afterwards
        decoder.add_signal_table_str(fixed, "fixed.toml").unwrap();
        assert_eq!(decoder.registry_stats().num_descriptors, 1);

        // A second table clashing with the loaded one leaves it as it was
        let result = decoder.add_signal_table_str(broken, "broken.toml");
        assert!(matches!(result, Err(DecoderError::DuplicateDescriptorError { .. })));
        assert_eq!(decoder.registry_stats().num_descriptors, 1);
    }
}
