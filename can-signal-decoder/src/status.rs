//! PDM output status codec
//!
//! A PDM reports each output channel as a small status word. The decode engine
//! hands the masked raw word (before any scaling) to [`StatusCodec`], which
//! splits it into four independent flags.
//!
//! Bit mapping, LSB first:
//!
//! | bit | flag        |
//! |-----|-------------|
//! | 0   | Active      |
//! | 1   | Fault       |
//! | 2   | OverCurrent |
//! | 3   | RetriesDone |
//!
//! Bits above 3 are ignored.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Status flags of one PDM output channel
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PdmOutputStatus: u8 {
        const ACTIVE = 1 << 0;
        const FAULT = 1 << 1;
        const OVER_CURRENT = 1 << 2;
        const RETRIES_DONE = 1 << 3;
    }
}

impl PdmOutputStatus {
    pub fn active(&self) -> bool {
        self.contains(Self::ACTIVE)
    }

    pub fn fault(&self) -> bool {
        self.contains(Self::FAULT)
    }

    pub fn over_current(&self) -> bool {
        self.contains(Self::OVER_CURRENT)
    }

    pub fn retries_done(&self) -> bool {
        self.contains(Self::RETRIES_DONE)
    }
}

impl fmt::Display for PdmOutputStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, &(bit, name)) in StatusCodec::FLAG_TABLE.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", name, self.bits() & (1u8 << bit) != 0)?;
        }
        Ok(())
    }
}

/// Converts between raw status words and [`PdmOutputStatus`]
pub struct StatusCodec;

impl StatusCodec {
    /// Bit position and display name of every flag, used by `Display`
    pub const FLAG_TABLE: [(u8, &'static str); 4] = [
        (0, "Active"),
        (1, "Fault"),
        (2, "OverCurrent"),
        (3, "RetriesDone"),
    ];

    /// Split a masked raw word into the four status flags
    pub fn decode_status(raw_value: u64) -> PdmOutputStatus {
        let known = raw_value & u64::from(PdmOutputStatus::all().bits());
        PdmOutputStatus::from_bits_truncate(known as u8)
    }

    /// Pack status flags back into a raw word
    pub fn encode_status(status: PdmOutputStatus) -> u8 {
        status.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_table_matches_constants() {
        let flags = [
            PdmOutputStatus::ACTIVE,
            PdmOutputStatus::FAULT,
            PdmOutputStatus::OVER_CURRENT,
            PdmOutputStatus::RETRIES_DONE,
        ];
        for ((bit, _name), flag) in StatusCodec::FLAG_TABLE.iter().zip(flags) {
            assert_eq!(flag.bits(), 1 << bit);
        }
    }

    #[test]
    fn test_all_combinations_are_independent() {
        for raw in 0u64..=0xF {
            let status = StatusCodec::decode_status(raw);
            assert_eq!(status.active(), raw & 0x1 != 0);
            assert_eq!(status.fault(), raw & 0x2 != 0);
            assert_eq!(status.over_current(), raw & 0x4 != 0);
            assert_eq!(status.retries_done(), raw & 0x8 != 0);
            assert_eq!(StatusCodec::encode_status(status) as u64, raw);
        }
    }

    #[test]
    fn test_upper_bits_ignored() {
        let status = StatusCodec::decode_status(0xF5);
        assert!(status.active());
        assert!(!status.fault());
        assert!(status.over_current());
        assert!(!status.retries_done());
    }

    #[test]
    fn test_display() {
        let status = PdmOutputStatus::ACTIVE | PdmOutputStatus::RETRIES_DONE;
        assert_eq!(
            status.to_string(),
            "Active=true Fault=false OverCurrent=false RetriesDone=true"
        );
        assert_eq!(
            StatusCodec::decode_status(0x06).to_string(),
            "Active=false Fault=true OverCurrent=true RetriesDone=false"
        );
    }

    #[test]
    fn test_display_follows_flag_table() {
        for (bit, name) in StatusCodec::FLAG_TABLE {
            let text = StatusCodec::decode_status(1u64 << bit).to_string();
            for (other, other_name) in StatusCodec::FLAG_TABLE {
                let expected = format!("{}={}", other_name, other == bit);
                assert!(
                    text.contains(&expected),
                    "{} missing from {:?} for {}",
                    expected,
                    text,
                    name
                );
            }
        }
    }
}
