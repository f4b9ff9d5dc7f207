//! Signal table parser
//!
//! Parses TOML signal tables and converts them into signal descriptors.
//!
//! ```toml
//! [[signal]]
//! name = "EngineSpeed"
//! device = "ECU_1"
//! start_bit = 0
//! bitmask = 0xFFFF
//! type = "int16"
//! unit = "rpm"
//!
//! [[signal]]
//! name = "Output1Status"
//! id = 0x7F0
//! start_bit = 8
//! bitmask = 0x0F
//! type = "pdm_status"
//! ```

use crate::devices::Device;
use crate::signals::descriptor::{SignalDescriptor, ValueType};
use crate::types::{DecoderError, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SignalTable {
    #[serde(default, rename = "signal")]
    signals: Vec<SignalEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SignalEntry {
    name: String,
    device: Option<String>,
    id: Option<u32>,
    start_bit: u16,
    bitmask: u32,
    #[serde(default = "default_scale")]
    multiplier: f64,
    #[serde(default = "default_scale")]
    divisor: f64,
    #[serde(rename = "type")]
    value_type: ValueType,
    unit: Option<String>,
}

fn default_scale() -> f64 {
    1.0
}

/// Parse a signal table file and return its descriptors
pub fn parse_signal_table_file(path: &Path) -> Result<Vec<SignalDescriptor>> {
    log::info!("Parsing signal table: {:?}", path);

    let content = std::fs::read_to_string(path)?;

    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.toml");

    parse_signal_table(&content, source)
}

/// Parse signal table text; `source` names the table in error messages
pub fn parse_signal_table(content: &str, source: &str) -> Result<Vec<SignalDescriptor>> {
    let table: SignalTable = toml::from_str(content)
        .map_err(|e| DecoderError::SignalTableParseError(format!("{}: {}", source, e)))?;

    let descriptors = table
        .signals
        .into_iter()
        .map(|entry| convert_entry(entry, source))
        .collect::<Result<Vec<_>>>()?;

    log::info!("Parsed {} signals from {}", descriptors.len(), source);

    Ok(descriptors)
}

/// Convert a table entry into a validated descriptor
fn convert_entry(entry: SignalEntry, source: &str) -> Result<SignalDescriptor> {
    let identifier = match (&entry.device, entry.id) {
        (Some(device), None) => device.parse::<Device>()?.identifier(),
        (None, Some(id)) => id,
        (Some(device), Some(id)) => {
            // Both given: they must agree
            let device_id = device.parse::<Device>()?.identifier();
            if device_id != id {
                return Err(DecoderError::SignalTableParseError(format!(
                    "{}: signal '{}' names device {} (0x{:X}) but id 0x{:X}",
                    source, entry.name, device, device_id, id
                )));
            }
            id
        }
        (None, None) => {
            return Err(DecoderError::SignalTableParseError(format!(
                "{}: signal '{}' needs either 'device' or 'id'",
                source, entry.name
            )));
        }
    };

    let descriptor = SignalDescriptor::new(
        identifier,
        entry.start_bit,
        entry.bitmask,
        entry.multiplier,
        entry.divisor,
        entry.value_type,
    )?
    .with_name(entry.name);

    Ok(match entry.unit {
        Some(unit) => descriptor.with_unit(unit),
        None => descriptor,
    })
}
