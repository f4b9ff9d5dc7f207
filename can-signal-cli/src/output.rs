//! Output formatting for decoded frames (text and JSON lines)

use can_signal_decoder::{DecodedFrame, DecodedSignal, DecodedValue};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Render one decoded frame as output lines
pub fn render(
    format: OutputFormat,
    timestamp: Option<DateTime<Utc>>,
    interface: Option<&str>,
    decoded: &DecodedFrame,
) -> Vec<String> {
    match format {
        OutputFormat::Text => render_text(timestamp, interface, decoded),
        OutputFormat::Json => vec![render_json(timestamp, interface, decoded).to_string()],
    }
}

fn render_text(
    timestamp: Option<DateTime<Utc>>,
    interface: Option<&str>,
    decoded: &DecodedFrame,
) -> Vec<String> {
    let mut prefix = String::new();
    if let Some(ts) = timestamp {
        prefix.push_str(&format!("[{}] ", ts.to_rfc3339_opts(SecondsFormat::Micros, true)));
    }
    if let Some(iface) = interface {
        prefix.push_str(iface);
        prefix.push(' ');
    }
    prefix.push_str(&format!("0x{:03X}", decoded.frame.identifier()));
    if let Some(device) = decoded.device {
        prefix.push_str(&format!(" ({})", device));
    }

    if decoded.is_undecoded() {
        let data: Vec<String> = decoded
            .frame
            .payload()
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect();
        return vec![format!("{}  [{}]", prefix, data.join(" "))];
    }

    let mut lines: Vec<String> = decoded
        .signals
        .iter()
        .map(|signal| match &signal.unit {
            Some(unit) => format!("{}  {} = {} {}", prefix, signal.name, signal.value, unit),
            None => format!("{}  {} = {}", prefix, signal.name, signal.value),
        })
        .collect();

    lines.extend(decoded.errors.iter().map(|e| format!("{}  ! {}", prefix, e)));
    lines
}

fn render_json(
    timestamp: Option<DateTime<Utc>>,
    interface: Option<&str>,
    decoded: &DecodedFrame,
) -> Value {
    json!({
        "timestamp": timestamp.map(|ts| ts.to_rfc3339_opts(SecondsFormat::Micros, true)),
        "interface": interface,
        "id": decoded.frame.identifier(),
        "device": decoded.device.map(|d| d.name()),
        "data": decoded.frame.payload(),
        "signals": decoded.signals.iter().map(signal_json).collect::<Vec<_>>(),
        "errors": decoded.errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
    })
}

fn signal_json(signal: &DecodedSignal) -> Value {
    json!({
        "name": signal.name,
        "value": value_json(&signal.value),
        "raw": signal.raw_value,
        "unit": signal.unit,
    })
}

fn value_json(value: &DecodedValue) -> Value {
    match value {
        DecodedValue::UInt8(v) => json!(v),
        DecodedValue::Int16(v) => json!(v),
        DecodedValue::Boolean(v) => json!(v),
        DecodedValue::Float(v) => json!(v),
        DecodedValue::PdmStatus(status) => json!({
            "active": status.active(),
            "fault": status.fault(),
            "over_current": status.over_current(),
            "retries_done": status.retries_done(),
        }),
    }
}
