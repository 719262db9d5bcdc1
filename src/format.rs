//! Image format and animation metadata
//!
//! These are the structural facts collected while scanning one image. They
//! are published as events; no pixel data is ever decoded.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::chunk::{read_u16, read_u32};
use crate::error::{Error, Result};

/// Color type codes from IHDR
pub const COLOR_TYPE_GRAY: u8 = 0;
pub const COLOR_TYPE_RGB: u8 = 2;
pub const COLOR_TYPE_INDEXED: u8 = 3;
pub const COLOR_TYPE_GRAYA: u8 = 4;
pub const COLOR_TYPE_RGBA: u8 = 6;

/// Pixel component interpretation reported downstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    #[default]
    Gray,
    #[serde(rename = "graya")]
    GrayAlpha,
    Rgb,
    Rgba,
    Indexed,
}

/// Loop count of an animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatCount {
    Finite(u32),
    Infinite,
}

impl Default for RepeatCount {
    fn default() -> Self {
        RepeatCount::Finite(0)
    }
}

impl RepeatCount {
    /// Interpret an acTL `num_plays` value, where 0 means forever
    pub fn from_num_plays(num_plays: u32) -> Self {
        if num_plays == 0 {
            RepeatCount::Infinite
        } else {
            RepeatCount::Finite(num_plays)
        }
    }
}

/// Contents of the IHDR chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    /// Raw color type code
    pub color_type: u8,
    pub compression_method: u8,
    pub filter_method: u8,
    pub interlace_method: u8,
}

impl ImageHeader {
    /// Size of the IHDR payload
    pub const LEN: usize = 13;

    /// Parse the 13-byte IHDR payload
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = Self {
            width: read_u32(data, 0),
            height: read_u32(data, 4),
            bit_depth: data[8],
            color_type: data[9],
            compression_method: data[10],
            filter_method: data[11],
            interlace_method: data[12],
        };
        // Reject unknown color types up front
        header.colors()?;
        Ok(header)
    }

    /// Number of samples per pixel
    pub fn colors(&self) -> Result<u8> {
        match self.color_type {
            COLOR_TYPE_GRAY | COLOR_TYPE_INDEXED => Ok(1),
            COLOR_TYPE_GRAYA => Ok(2),
            COLOR_TYPE_RGB => Ok(3),
            COLOR_TYPE_RGBA => Ok(4),
            other => Err(Error::InvalidColorType(other)),
        }
    }

    /// Bytes per complete pixel, rounded up for sub-byte depths
    pub fn bytes_per_pixel(&self) -> usize {
        let colors = self.colors().unwrap_or(1) as usize;
        let pixel_bits = self.bit_depth as usize * colors;
        pixel_bits.div_ceil(8)
    }

    /// Color space before any tRNS revision
    pub fn color_space(&self, indexed: bool) -> ColorSpace {
        match self.color_type {
            COLOR_TYPE_GRAYA => ColorSpace::GrayAlpha,
            COLOR_TYPE_RGB => ColorSpace::Rgb,
            COLOR_TYPE_RGBA => ColorSpace::Rgba,
            COLOR_TYPE_INDEXED if indexed => ColorSpace::Indexed,
            COLOR_TYPE_INDEXED => ColorSpace::Rgb,
            _ => ColorSpace::Gray,
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.color_type == COLOR_TYPE_INDEXED
    }

    pub fn is_interlaced(&self) -> bool {
        self.interlace_method != 0
    }
}

/// Image format published once per image, before its image data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatDescriptor {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_space: ColorSpace,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha_palette: Option<Vec<u8>>,
    pub animated: bool,
    pub num_frames: u32,
    pub repeat_count: RepeatCount,
}

impl Default for FormatDescriptor {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            bit_depth: 0,
            color_space: ColorSpace::default(),
            palette: None,
            alpha_palette: None,
            animated: false,
            num_frames: 1,
            repeat_count: RepeatCount::default(),
        }
    }
}

/// Text metadata from tEXt chunks, last write wins
pub type Metadata = BTreeMap<String, String>;

/// Split a tEXt payload into keyword and text
///
/// Both halves are Latin-1. Returns `None` when there is no NUL separator.
pub fn parse_text(data: &[u8]) -> Option<(String, String)> {
    let sep = data.iter().position(|&b| b == 0)?;
    let latin1 = |bytes: &[u8]| bytes.iter().map(|&b| b as char).collect::<String>();
    Some((latin1(&data[..sep]), latin1(&data[sep + 1..])))
}

/// Contents of an acTL chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationControl {
    pub num_frames: u32,
    pub repeat_count: RepeatCount,
}

impl AnimationControl {
    pub const LEN: usize = 8;

    pub fn parse(data: &[u8]) -> Self {
        Self {
            num_frames: read_u32(data, 0),
            repeat_count: RepeatCount::from_num_plays(read_u32(data, 4)),
        }
    }
}

/// Geometry and timing of one animation frame (fcTL)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameDescriptor {
    pub sequence_number: u32,
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
    /// Frame delay in milliseconds
    pub delay_ms: f64,
    pub dispose_op: u8,
    pub blend_op: u8,
}

impl FrameDescriptor {
    pub const LEN: usize = 26;

    pub fn parse(data: &[u8]) -> Self {
        let delay_num = read_u16(data, 20);
        let delay_den = match read_u16(data, 22) {
            0 => 100,
            den => den,
        };

        Self {
            sequence_number: read_u32(data, 0),
            width: read_u32(data, 4),
            height: read_u32(data, 8),
            x: read_u32(data, 12),
            y: read_u32(data, 16),
            delay_ms: f64::from(delay_num) / f64::from(delay_den) * 1000.0,
            dispose_op: data[24],
            blend_op: data[25],
        }
    }
}
