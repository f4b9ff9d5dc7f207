//! Signal registry
//!
//! Maps a CAN identifier to the descriptors that apply to its frames. The
//! registry is filled during configuration load and only read afterwards;
//! share it behind `&` or `Arc` once decoding starts.

use crate::devices::Device;
use crate::signals::descriptor::SignalDescriptor;
use crate::types::{DecoderError, Result};
use std::collections::{HashMap, HashSet};

/// Descriptor lookup table keyed by CAN identifier
#[derive(Debug, Clone)]
pub struct SignalRegistry {
    /// Key: CAN ID, Value: descriptors in registration order
    descriptors: HashMap<u32, Vec<SignalDescriptor>>,

    /// Identifiers of the known device table
    devices: HashMap<u32, Device>,

    /// Reject a repeated (identifier, start bit, bitmask) triple
    reject_duplicates: bool,

    /// Layouts already registered, only maintained when rejecting duplicates
    layouts: HashSet<(u32, u16, u32)>,
}

impl SignalRegistry {
    /// Create an empty registry seeded with the known device identifiers
    pub fn new() -> Self {
        Self {
            descriptors: HashMap::new(),
            devices: Device::all().map(|device| (device.identifier(), device)).collect(),
            reject_duplicates: false,
            layouts: HashSet::new(),
        }
    }

    /// Builder method: enforce one descriptor per (identifier, start bit, bitmask)
    pub fn with_unique_layouts(mut self, enabled: bool) -> Self {
        self.reject_duplicates = enabled;
        if enabled {
            self.layouts = self
                .descriptors
                .values()
                .flat_map(|descs| descs.iter())
                .map(SignalDescriptor::layout_key)
                .collect();
        }
        self
    }

    /// Add a descriptor under its identifier
    ///
    /// Overlapping descriptors are allowed unless the registry was built with
    /// `with_unique_layouts(true)`.
    pub fn register(&mut self, descriptor: SignalDescriptor) -> Result<()> {
        if self.reject_duplicates && !self.layouts.insert(descriptor.layout_key()) {
            return Err(DecoderError::DuplicateDescriptorError {
                identifier: descriptor.identifier(),
                start_bit: descriptor.start_bit(),
                bitmask: descriptor.bitmask(),
            });
        }

        self.descriptors
            .entry(descriptor.identifier())
            .or_default()
            .push(descriptor);
        Ok(())
    }

    /// Add a batch of descriptors, or none of them
    ///
    /// With unique layouts enabled, every layout in the batch is checked
    /// against the registry and against the rest of the batch first. On a
    /// duplicate the registry is left untouched.
    pub fn register_all(&mut self, descriptors: Vec<SignalDescriptor>) -> Result<()> {
        if self.reject_duplicates {
            let mut batch = HashSet::with_capacity(descriptors.len());
            for descriptor in &descriptors {
                let key = descriptor.layout_key();
                if self.layouts.contains(&key) || !batch.insert(key) {
                    return Err(DecoderError::DuplicateDescriptorError {
                        identifier: descriptor.identifier(),
                        start_bit: descriptor.start_bit(),
                        bitmask: descriptor.bitmask(),
                    });
                }
            }
        }

        for descriptor in descriptors {
            self.register(descriptor)?;
        }
        Ok(())
    }

    /// Descriptors registered for `identifier`, empty if none
    pub fn lookup(&self, identifier: u32) -> &[SignalDescriptor] {
        self.descriptors
            .get(&identifier)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Find a descriptor by signal name
    pub fn find_signal(&self, name: &str) -> Option<&SignalDescriptor> {
        self.descriptors
            .values()
            .flat_map(|descs| descs.iter())
            .find(|desc| desc.name() == name)
    }

    /// Device known to transmit on `identifier`
    pub fn known_device(&self, identifier: u32) -> Option<Device> {
        self.devices.get(&identifier).copied()
    }

    /// Get registry statistics
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            num_identifiers: self.descriptors.len(),
            num_descriptors: self.descriptors.values().map(Vec::len).sum(),
        }
    }

    /// Get all identifiers with at least one descriptor, sorted
    pub fn identifiers(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.descriptors.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for SignalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of identifiers with descriptors
    pub num_identifiers: usize,
    /// Total number of descriptors
    pub num_descriptors: usize,
}
