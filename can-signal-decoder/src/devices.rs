//! Known MoTeC device identifiers
//!
//! All fixed CAN identifiers live in one static table so that signal tables can
//! refer to a device by name and decoded frames can be labelled with their
//! source.

use crate::types::{DecoderError, Result};
use std::fmt;
use std::str::FromStr;

/// Base address of the ECU receive block
pub const ECU_RECV_BASE: u32 = 0x0500;

/// A device on the vehicle bus with a fixed CAN identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Device {
    Ecu1,
    Ecu2,
    Pdm1,
    Pdm2,
    Logger1,
    Logger2,
    Logger3,
    Logger5,
    Logger6,
    Logger9,
    Logger10,
    Logger11,
    Logger13,
    Logger14,
    Logger15,
    Logger16,
    EcuCan0,
    EcuCan1,
    EcuCan2,
    EcuCan3,
    EcuCan4,
    EcuCan5,
    EcuCan6,
    EcuCan7,
}

/// (device, symbolic name, identifier)
static DEVICE_TABLE: [(Device, &str, u32); 24] = [
    (Device::Ecu1, "ECU_1", 0x118),
    (Device::Ecu2, "ECU_2", 0x119),
    (Device::Pdm1, "PDM_1", 0x7F0),
    (Device::Pdm2, "PDM_2", 0x7F1),
    (Device::Logger1, "Logger_1", 0x0640),
    (Device::Logger2, "Logger_2", 0x0641),
    (Device::Logger3, "Logger_3", 0x0642),
    (Device::Logger5, "Logger_5", 0x0644),
    (Device::Logger6, "Logger_6", 0x0645),
    (Device::Logger9, "Logger_9", 0x0648),
    (Device::Logger10, "Logger_10", 0x0649),
    (Device::Logger11, "Logger_11", 0x064A),
    (Device::Logger13, "Logger_13", 0x064C),
    (Device::Logger14, "Logger_14", 0x064D),
    (Device::Logger15, "Logger_15", 0x064E),
    (Device::Logger16, "Logger_16", 0x064F),
    (Device::EcuCan0, "ECU_CAN0", ECU_RECV_BASE),
    (Device::EcuCan1, "ECU_CAN1", ECU_RECV_BASE + 1),
    (Device::EcuCan2, "ECU_CAN2", ECU_RECV_BASE + 2),
    (Device::EcuCan3, "ECU_CAN3", ECU_RECV_BASE + 3),
    (Device::EcuCan4, "ECU_CAN4", ECU_RECV_BASE + 4),
    (Device::EcuCan5, "ECU_CAN5", ECU_RECV_BASE + 5),
    (Device::EcuCan6, "ECU_CAN6", ECU_RECV_BASE + 6),
    (Device::EcuCan7, "ECU_CAN7", ECU_RECV_BASE + 7),
];

impl Device {
    /// Every known device, in table order
    pub fn all() -> impl Iterator<Item = Device> {
        DEVICE_TABLE.iter().map(|(device, _, _)| *device)
    }

    fn entry(self) -> &'static (Device, &'static str, u32) {
        // Table order matches declaration order
        &DEVICE_TABLE[self as usize]
    }

    /// CAN identifier of this device
    pub fn identifier(self) -> u32 {
        self.entry().2
    }

    /// Symbolic name as used in signal tables
    pub fn name(self) -> &'static str {
        self.entry().1
    }

    /// Look up a device by symbolic name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Device> {
        DEVICE_TABLE
            .iter()
            .find(|(_, n, _)| n.eq_ignore_ascii_case(name))
            .map(|(device, _, _)| *device)
    }

    /// Look up the device that transmits on `identifier`
    pub fn from_identifier(identifier: u32) -> Option<Device> {
        DEVICE_TABLE
            .iter()
            .find(|(_, _, id)| *id == identifier)
            .map(|(device, _, _)| *device)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Device {
    type Err = DecoderError;

    fn from_str(s: &str) -> Result<Self> {
        Device::from_name(s).ok_or_else(|| DecoderError::UnknownDeviceError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_order_matches_enum() {
        for (idx, (device, _, _)) in DEVICE_TABLE.iter().enumerate() {
            assert_eq!(*device as usize, idx);
        }
    }

    #[test]
    fn test_fixed_identifiers() {
        assert_eq!(Device::Ecu1.identifier(), 0x118);
        assert_eq!(Device::Ecu2.identifier(), 0x119);
        assert_eq!(Device::Pdm1.identifier(), 0x7F0);
        assert_eq!(Device::Pdm2.identifier(), 0x7F1);
        assert_eq!(Device::Logger5.identifier(), 0x644);
        assert_eq!(Device::Logger16.identifier(), 0x64F);
        assert_eq!(Device::EcuCan0.identifier(), 0x500);
        assert_eq!(Device::EcuCan7.identifier(), 0x507);
    }

    #[test]
    fn test_identifiers_are_unique() {
        let ids: HashSet<u32> = Device::all().map(Device::identifier).collect();
        assert_eq!(ids.len(), DEVICE_TABLE.len());
    }

    #[test]
    fn test_name_lookup() {
        assert_eq!(Device::from_name("PDM_1"), Some(Device::Pdm1));
        assert_eq!(Device::from_name("logger_13"), Some(Device::Logger13));
        assert_eq!(Device::from_name("Logger_4"), None);
        assert_eq!("ECU_CAN3".parse::<Device>().unwrap(), Device::EcuCan3);
        assert!(matches!(
            "Dash".parse::<Device>(),
            Err(DecoderError::UnknownDeviceError(_))
        ));
    }

    #[test]
    fn test_identifier_lookup() {
        assert_eq!(Device::from_identifier(0x7F1), Some(Device::Pdm2));
        assert_eq!(Device::from_identifier(0x643), None);
        assert_eq!(Device::Logger9.to_string(), "Logger_9");
    }
}
