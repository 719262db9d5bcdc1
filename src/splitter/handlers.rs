//! Chunk body handlers
//!
//! Each handler looks at the currently buffered bytes of a chunk body and
//! reports how many it consumed, plus any events to deliver before the driver
//! advances. A handler that lacks data returns [`Handled::wait`] and leaves
//! all state untouched; the driver calls it again once more bytes arrive.
//!
//! Handlers never report more bytes than are buffered or remain in the
//! chunk. A chunk declared shorter than a handler's fixed record fails with
//! [`Error::BadChunkSize`] as soon as its header is known.

use tracing::trace;

use crate::chunk::{ChunkCursor, Handler};
use crate::config::SplitterConfig;
use crate::error::{Error, Result};
use crate::format::{
    parse_text, AnimationControl, ColorSpace, FormatDescriptor, FrameDescriptor, ImageHeader,
    Metadata,
};

use super::event::Event;

/// Length of the sequence number prefix of fdAT
const FDAT_SEQUENCE_LEN: usize = 4;

/// Facts collected for the image being scanned
///
/// Reset as a whole at every image boundary.
#[derive(Debug, Default)]
pub(crate) struct ImageState {
    pub header: Option<ImageHeader>,
    pub format: FormatDescriptor,
    pub metadata: Metadata,
    /// Raw PLTE entries, kept whether or not they are reported
    pub palette: Option<Vec<u8>>,
    /// Raw tRNS table of an indexed image
    pub transparency: Option<Vec<u8>>,
    /// Format and metadata have been published
    pub published: bool,
    /// Bytes of this image consumed so far, signature included
    pub length: usize,
}

impl ImageState {
    /// Publish format and metadata, once
    fn publish(&mut self, handled: &mut Handled) {
        if !self.published {
            self.published = true;
            handled.emit.push(Event::Format(self.format.clone()));
            handled.emit.push(Event::Metadata(self.metadata.clone()));
        }
    }
}

/// Outcome of one handler invocation
#[derive(Debug, Default)]
pub(crate) struct Handled {
    /// Bytes of the chunk body consumed
    pub consumed: usize,
    /// Events to deliver before the bytes are consumed
    pub emit: Vec<Event>,
}

impl Handled {
    /// Not enough data yet
    pub fn wait() -> Self {
        Self::default()
    }

    pub fn consumed(consumed: usize) -> Self {
        Self {
            consumed,
            emit: Vec::new(),
        }
    }

    fn with(mut self, event: Event) -> Self {
        self.emit.push(event);
        self
    }
}

/// Route a chunk body to its handler
pub(crate) fn dispatch(
    image: &mut ImageState,
    cursor: &ChunkCursor,
    data: &[u8],
    config: &SplitterConfig,
) -> Result<Handled> {
    match cursor.chunk_type.handler() {
        Handler::Header => read_header(image, cursor, data, config),
        Handler::Palette => Ok(read_whole(cursor, data, |palette| {
            image.palette = Some(palette.to_vec());
            if config.indexed {
                image.format.palette = image.palette.clone();
            }
            None
        })),
        Handler::Transparency => Ok(read_whole(cursor, data, |table| {
            read_transparency(image, table, config);
            None
        })),
        Handler::Text => Ok(read_whole(cursor, data, |payload| {
            if let Some((key, value)) = parse_text(payload) {
                image.metadata.insert(key, value);
            }
            None
        })),
        Handler::AnimationControl => read_fixed(cursor, data, AnimationControl::LEN, |body| {
            let actl = AnimationControl::parse(body);
            image.format.animated = true;
            image.format.num_frames = actl.num_frames;
            image.format.repeat_count = actl.repeat_count;
            None
        }),
        Handler::FrameControl => read_fixed(cursor, data, FrameDescriptor::LEN, |body| {
            Some(Event::Frame(FrameDescriptor::parse(body)))
        }),
        Handler::ImageData => Ok(read_image_data(image, cursor, data, 0)),
        Handler::FrameData => read_frame_data(image, cursor, data),
        Handler::Skip => Ok(skip(cursor, data)),
    }
}

/// Discard whatever part of the body is buffered
fn skip(cursor: &ChunkCursor, data: &[u8]) -> Handled {
    let n = data.len().min(cursor.remaining() as usize);
    if n > 0 {
        trace!("skipping {} bytes of {}", n, cursor.chunk_type);
    }
    Handled::consumed(n)
}

/// Handle a chunk once its whole body is buffered
fn read_whole<F>(cursor: &ChunkCursor, data: &[u8], f: F) -> Handled
where
    F: FnOnce(&[u8]) -> Option<Event>,
{
    let len = cursor.remaining() as usize;
    if data.len() < len {
        return Handled::wait();
    }
    finish(len, f(&data[..len]))
}

/// Fail if the chunk cannot hold a `required`-byte record
fn ensure_fits(cursor: &ChunkCursor, required: usize) -> Result<()> {
    if (cursor.remaining() as usize) < required {
        return Err(Error::BadChunkSize {
            chunk: cursor.chunk_type,
            declared: cursor.length,
            consumed: u64::from(cursor.consumed) + required as u64,
        });
    }
    Ok(())
}

/// Handle the first `required` bytes of a chunk, skipping any excess
fn read_fixed<F>(cursor: &ChunkCursor, data: &[u8], required: usize, f: F) -> Result<Handled>
where
    F: FnOnce(&[u8]) -> Option<Event>,
{
    if cursor.consumed > 0 {
        return Ok(skip(cursor, data));
    }
    ensure_fits(cursor, required)?;
    if data.len() < required {
        return Ok(Handled::wait());
    }
    Ok(finish(required, f(&data[..required])))
}

fn finish(consumed: usize, event: Option<Event>) -> Handled {
    let handled = Handled::consumed(consumed);
    match event {
        Some(event) => handled.with(event),
        None => handled,
    }
}

fn read_header(
    image: &mut ImageState,
    cursor: &ChunkCursor,
    data: &[u8],
    config: &SplitterConfig,
) -> Result<Handled> {
    if cursor.consumed > 0 {
        return Ok(skip(cursor, data));
    }
    ensure_fits(cursor, ImageHeader::LEN)?;
    if data.len() < ImageHeader::LEN {
        return Ok(Handled::wait());
    }

    let header = ImageHeader::parse(&data[..ImageHeader::LEN])?;
    trace!(
        "IHDR {}x{} depth {} color type {}",
        header.width,
        header.height,
        header.bit_depth,
        header.color_type
    );

    // Format is published later, tRNS may still change the color space
    image.format.width = header.width;
    image.format.height = header.height;
    image.format.bit_depth = header.bit_depth;
    image.format.color_space = header.color_space(config.indexed);
    image.header = Some(header);

    Ok(Handled::consumed(ImageHeader::LEN))
}

fn read_transparency(image: &mut ImageState, table: &[u8], config: &SplitterConfig) {
    // Only the indexed form changes anything we report
    if !image.header.is_some_and(|h| h.is_indexed()) {
        return;
    }
    image.transparency = Some(table.to_vec());
    if config.indexed {
        image.format.alpha_palette = image.transparency.clone();
    } else {
        image.format.color_space = ColorSpace::Rgba;
    }
}

/// Relay IDAT payload, starting `prefix` bytes into `data`
fn read_image_data(
    image: &mut ImageState,
    cursor: &ChunkCursor,
    data: &[u8],
    prefix: usize,
) -> Handled {
    let mut handled = Handled::default();
    image.publish(&mut handled);

    let remaining = cursor.remaining() as usize - prefix;
    let n = (data.len() - prefix).min(remaining);
    if n > 0 {
        handled.emit.push(Event::ImageData(n));
    }
    handled.consumed = prefix + n;
    handled
}

fn read_frame_data(image: &mut ImageState, cursor: &ChunkCursor, data: &[u8]) -> Result<Handled> {
    if cursor.consumed > 0 {
        return Ok(read_image_data(image, cursor, data, 0));
    }
    // Sequence number comes first, strip it before relaying
    ensure_fits(cursor, FDAT_SEQUENCE_LEN)?;
    if data.len() < FDAT_SEQUENCE_LEN {
        return Ok(Handled::wait());
    }
    Ok(read_image_data(image, cursor, data, FDAT_SEQUENCE_LEN))
}
