//! Events produced by the splitter
//!
//! Events are delivered in stream order. For each image, `Format` and
//! `Metadata` always precede its first `ImageData`, and `Image` is last.

use serde::{Serialize, Serializer};

use crate::format::{FormatDescriptor, FrameDescriptor, Metadata};

/// Output of the splitter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Event {
    /// Format of the current image, once, before its image data
    Format(FormatDescriptor),

    /// Text metadata of the current image, right after `Format`
    Metadata(Metadata),

    /// One fcTL chunk, as it is seen
    Frame(FrameDescriptor),

    /// Number of compressed image-data bytes (IDAT/fdAT payload) relayed
    /// by one step; the bytes themselves are part of the next `Image`
    ImageData(usize),

    /// A complete image, signature through IEND CRC, byte-exact
    #[serde(serialize_with = "serialize_len")]
    Image(Vec<u8>),
}

impl Event {
    /// The completed image bytes, if this is an `Image` event
    pub fn into_image(self) -> Option<Vec<u8>> {
        match self {
            Event::Image(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Short event name, as used in serialized output
    pub fn name(&self) -> &'static str {
        match self {
            Event::Format(_) => "format",
            Event::Metadata(_) => "metadata",
            Event::Frame(_) => "frame",
            Event::ImageData(_) => "image_data",
            Event::Image(_) => "image",
        }
    }
}

fn serialize_len<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(bytes.len() as u64)
}
