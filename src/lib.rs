//! PNG stream splitter
//!
//! Splits a byte stream of concatenated PNG (and APNG) images into complete,
//! byte-exact images, reporting structural metadata along the way:
//!
//! - `splitter`: the streaming chunk state machine and its events
//! - `chunk`: chunk framing and the recognized chunk types
//! - `format`: image header, color space, text and animation metadata
//! - `stream`: iterator adapter over `std::io::Read`
//!
//! Input may be fed in slices of any size; output does not depend on where
//! the slices are cut. Pixel data is never decoded.
//!
//! ```
//! use png_split::{Event, Splitter};
//!
//! let mut splitter = Splitter::new();
//! let mut images = Vec::new();
//! splitter
//!     .feed(b"\x89PNG\r\n", |event| {
//!         if let Event::Image(bytes) = event {
//!             images.push(bytes);
//!         }
//!     })
//!     .unwrap();
//! assert!(images.is_empty());
//! ```

pub mod chunk;
pub mod config;
pub mod error;
pub mod format;
pub mod splitter;
pub mod stream;

pub use chunk::{ChunkType, SIGNATURE};
pub use config::SplitterConfig;
pub use error::{Error, Result};
pub use format::{ColorSpace, FormatDescriptor, FrameDescriptor, ImageHeader, Metadata, RepeatCount};
pub use splitter::{Event, ParserState, Splitter};
pub use stream::SplitReader;
