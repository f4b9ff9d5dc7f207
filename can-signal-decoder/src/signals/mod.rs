//! Signal descriptors, the descriptor registry and the signal table parser
//!
//! This module contains everything that describes where signals live in a
//! frame, as opposed to the engine that extracts them.

pub mod descriptor;
pub mod registry;
pub mod table;

// Re-export key types for convenience
pub use descriptor::{SignalDescriptor, ValueType};
pub use registry::{RegistryStats, SignalRegistry};
