//! Decoder configuration types
//!
//! This module defines the minimal configuration needed by the decoder library:
//! the registry's duplicate policy and which frames the streaming decoder
//! handles.

use serde::{Deserialize, Serialize};

/// Configuration for the decoder library
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Reject descriptors repeating an (identifier, start bit, bitmask) triple
    #[serde(default)]
    pub reject_duplicates: bool,

    /// Optional: only decode these specific CAN message IDs
    #[serde(default)]
    pub message_filter: Option<Vec<u32>>,

    /// Whether the frame stream also yields frames no descriptor matched
    #[serde(default)]
    pub emit_undecoded_frames: bool,
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: enable or disable the duplicate descriptor check
    pub fn with_reject_duplicates(mut self, enabled: bool) -> Self {
        self.reject_duplicates = enabled;
        self
    }

    /// Builder method: set message filter
    pub fn with_message_filter(mut self, messages: Vec<u32>) -> Self {
        self.message_filter = Some(messages);
        self
    }

    /// Builder method: yield frames without matching descriptors
    pub fn with_undecoded_frames(mut self, enabled: bool) -> Self {
        self.emit_undecoded_frames = enabled;
        self
    }

    /// Check if a message ID should be processed
    pub fn should_process_message(&self, can_id: u32) -> bool {
        match &self.message_filter {
            Some(messages) => messages.contains(&can_id),
            None => true,
        }
    }
}
