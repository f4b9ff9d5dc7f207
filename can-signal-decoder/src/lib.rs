//! CAN Signal Decoder Library
//!
//! A stateless, reusable library for decoding MoTeC ECU, PDM and logger
//! telemetry from CAN frames using declarative signal tables.
//!
//! # Architecture
//!
//! This library is intentionally minimal and focused on decoding:
//! - Validates frames handed over by a transport layer
//! - Maps CAN identifiers to signal descriptors (loaded from TOML tables)
//! - Extracts, masks and scales each signal into a typed value
//! - Splits PDM output status words into independent flags
//!
//! The library does NOT:
//! - Receive or transmit frames
//! - Buffer frames over time
//! - Persist or log decoded values
//!
//! Bits are numbered little-endian, LSB-first: bit 0 is the least significant
//! bit of payload byte 0.
//!
//! # Example Usage
//!
//! ```no_run
//! use can_signal_decoder::{Decoder, DecoderConfig, Frame};
//! use std::path::Path;
//!
//! // Create decoder and load signal tables
//! let mut decoder = Decoder::with_config(DecoderConfig::new().with_reject_duplicates(true));
//! decoder.add_signal_table(Path::new("ecu.toml")).unwrap();
//! decoder.add_signal_table(Path::new("pdm.toml")).unwrap();
//!
//! // Decode a frame handed over by the transport layer
//! let frame = Frame::standard(0x118, &[0x64, 0x00]).unwrap();
//!
//! for result in decoder.decode_frame(&frame) {
//!     match result {
//!         Ok(signal) => println!("{} = {}", signal.name, signal.value),
//!         Err(e) => eprintln!("Decode error: {}", e),
//!     }
//! }
//! ```

// Public modules
pub mod config;
pub mod decoder;
pub mod devices;
pub mod engine;
pub mod signals;
pub mod status;
pub mod types;

// Re-export main types for convenience
pub use config::DecoderConfig;
pub use decoder::{DecodedFrame, Decoder, DecodingIterator};
pub use devices::Device;
pub use engine::DecodeEngine;
pub use signals::{RegistryStats, SignalDescriptor, SignalRegistry, ValueType};
pub use status::{PdmOutputStatus, StatusCodec};
pub use types::{
    DecodedSignal, DecodedValue, DecoderError, Frame, FrameFormat, FrameKind, Result,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: ensure we can create a decoder
        let decoder = Decoder::new();
        let stats = decoder.registry_stats();
        assert_eq!(stats.num_descriptors, 0);
    }
}
