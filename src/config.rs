//! Configuration for the splitter

use serde::{Deserialize, Serialize};

/// Splitter configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    /// Keep indexed images as indexed color with palette metadata attached.
    ///
    /// When false, indexed images are reported as RGB (or RGBA with a tRNS
    /// chunk) for consumers that cannot interpret a palette.
    pub indexed: bool,
    /// Compare each chunk's stored CRC-32 against the computed one
    pub verify_crc: bool,
}

impl SplitterConfig {
    pub fn indexed(mut self, indexed: bool) -> Self {
        self.indexed = indexed;
        self
    }

    pub fn verify_crc(mut self, verify_crc: bool) -> Self {
        self.verify_crc = verify_crc;
        self
    }
}
