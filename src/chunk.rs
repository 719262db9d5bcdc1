//! PNG chunk framing
//!
//! Every PNG stream starts with an 8-byte signature followed by chunks:
//!
//! ```text
//! +--------+--------+-------------------+-------+
//! | length |  type  |  data (length B)  |  CRC  |
//! |  u32BE | 4 x u8 |                   | u32BE |
//! +--------+--------+-------------------+-------+
//! ```
//!
//! Reference: <https://www.w3.org/TR/png/#5Chunk-layout>

use std::fmt;

use crc32fast::Hasher;

/// The 8-byte PNG magic
pub const SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Size of the length + type prefix of every chunk
pub const CHUNK_HEADER_LEN: usize = 8;

/// Size of the trailing checksum of every chunk
pub const CRC_LEN: usize = 4;

/// Chunk types recognized by the splitter
///
/// Anything not listed is carried as [`ChunkType::Other`] and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkType {
    /// Image header
    Ihdr,
    /// Palette
    Plte,
    /// Transparency
    Trns,
    /// Latin-1 text
    Text,
    /// Animation control (APNG)
    Actl,
    /// Frame control (APNG)
    Fctl,
    /// Image data
    Idat,
    /// Frame data (APNG)
    Fdat,
    /// Image trailer
    Iend,
    /// Any other chunk
    Other([u8; 4]),
}

impl ChunkType {
    /// Classify a raw 4-byte tag
    pub fn from_tag(tag: [u8; 4]) -> Self {
        match &tag {
            b"IHDR" => ChunkType::Ihdr,
            b"PLTE" => ChunkType::Plte,
            b"tRNS" => ChunkType::Trns,
            b"tEXt" => ChunkType::Text,
            b"acTL" => ChunkType::Actl,
            b"fcTL" => ChunkType::Fctl,
            b"IDAT" => ChunkType::Idat,
            b"fdAT" => ChunkType::Fdat,
            b"IEND" => ChunkType::Iend,
            _ => ChunkType::Other(tag),
        }
    }

    /// The raw 4-byte tag
    pub fn tag(self) -> [u8; 4] {
        match self {
            ChunkType::Ihdr => *b"IHDR",
            ChunkType::Plte => *b"PLTE",
            ChunkType::Trns => *b"tRNS",
            ChunkType::Text => *b"tEXt",
            ChunkType::Actl => *b"acTL",
            ChunkType::Fctl => *b"fcTL",
            ChunkType::Idat => *b"IDAT",
            ChunkType::Fdat => *b"fdAT",
            ChunkType::Iend => *b"IEND",
            ChunkType::Other(tag) => tag,
        }
    }

    /// Select the body handler for this chunk type
    pub(crate) fn handler(self) -> Handler {
        match self {
            ChunkType::Ihdr => Handler::Header,
            ChunkType::Plte => Handler::Palette,
            ChunkType::Trns => Handler::Transparency,
            ChunkType::Text => Handler::Text,
            ChunkType::Actl => Handler::AnimationControl,
            ChunkType::Fctl => Handler::FrameControl,
            ChunkType::Idat => Handler::ImageData,
            ChunkType::Fdat => Handler::FrameData,
            ChunkType::Iend | ChunkType::Other(_) => Handler::Skip,
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.tag() {
            if byte.is_ascii_graphic() {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{:02x}", byte)?;
            }
        }
        Ok(())
    }
}

/// Body handler selected for a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Handler {
    Header,
    Palette,
    Transparency,
    Text,
    AnimationControl,
    FrameControl,
    ImageData,
    FrameData,
    /// Consume and discard
    Skip,
}

/// Position inside the chunk currently being read
#[derive(Debug, Clone)]
pub(crate) struct ChunkCursor {
    /// Length declared in the chunk header
    pub length: u32,
    pub chunk_type: ChunkType,
    /// Body bytes consumed so far, never above `length`
    pub consumed: u32,
    /// Running checksum over type and consumed body bytes
    crc: Hasher,
}

impl ChunkCursor {
    /// Parse a cursor from the 8-byte chunk header
    pub fn from_header(header: &[u8]) -> Self {
        let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let tag = [header[4], header[5], header[6], header[7]];

        let mut crc = Hasher::new();
        crc.update(&tag);

        Self {
            length,
            chunk_type: ChunkType::from_tag(tag),
            consumed: 0,
            crc,
        }
    }

    /// Bytes of the body not yet consumed
    pub fn remaining(&self) -> u32 {
        self.length - self.consumed
    }

    pub fn is_complete(&self) -> bool {
        self.consumed == self.length
    }

    /// Record `body` as consumed
    ///
    /// Returns `false` without touching the cursor when `body` would run past
    /// the declared length.
    pub fn advance(&mut self, body: &[u8]) -> bool {
        match u32::try_from(body.len()) {
            Ok(n) if n <= self.remaining() => {
                self.crc.update(body);
                self.consumed += n;
                true
            },
            _ => false,
        }
    }

    /// CRC-32 over the chunk type and the body consumed so far
    pub fn checksum(&self) -> u32 {
        self.crc.clone().finalize()
    }
}

/// Read a big-endian u32 at `offset`
pub(crate) fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Read a big-endian u16 at `offset`
pub(crate) fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}
