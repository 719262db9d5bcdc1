//! Splitter state machine
//!
//! Drives the chunk-level state machine over a stream of concatenated PNG
//! images. Input may arrive in slices of any size; the splitter advances as
//! far as the buffered bytes allow and resumes exactly there on the next feed.
//!
//! # State Machine
//!
//! ```text
//!   AwaitingSignature --8 bytes--> AwaitingChunkHeader --8 bytes--> InChunkBody
//!          ^                              ^                              |
//!          |                              |                      body consumed
//!          |                              +------- not IEND ---- AwaitingCrc
//!          +----------------------- IEND: emit image ---------------+
//! ```

use tracing::{debug, trace};

use crate::chunk::{read_u32, ChunkCursor, ChunkType, CHUNK_HEADER_LEN, CRC_LEN, SIGNATURE};
use crate::config::SplitterConfig;
use crate::error::{Error, Result};
use crate::format::{FormatDescriptor, ImageHeader, Metadata};

use super::buffer::IngestBuffer;
use super::event::Event;
use super::handlers::{self, ImageState};

/// Externally visible parser state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Waiting for the 8-byte PNG magic
    AwaitingSignature,
    /// Waiting for a chunk length and type
    AwaitingChunkHeader,
    /// Inside a chunk body
    InChunkBody,
    /// Waiting for the 4-byte chunk CRC
    AwaitingCrc,
}

#[derive(Debug)]
enum State {
    Signature,
    Header,
    Body(ChunkCursor),
    Crc(ChunkCursor),
}

/// Streaming splitter for concatenated PNG images
#[derive(Debug)]
pub struct Splitter {
    config: SplitterConfig,
    state: State,
    /// Bytes not yet consumed by the state machine
    buffer: IngestBuffer,
    /// Every byte fed since the current image started
    accumulator: Vec<u8>,
    /// Per-image facts
    image: ImageState,
    /// Images emitted so far
    images: u64,
    /// A fatal error occurred
    halted: bool,
}

impl Default for Splitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Splitter {
    /// Create a splitter with default configuration
    pub fn new() -> Self {
        Self::with_config(SplitterConfig::default())
    }

    pub fn with_config(config: SplitterConfig) -> Self {
        Self {
            config,
            state: State::Signature,
            buffer: IngestBuffer::new(),
            accumulator: Vec::new(),
            image: ImageState::default(),
            images: 0,
            halted: false,
        }
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Get current parser state
    pub fn state(&self) -> ParserState {
        match self.state {
            State::Signature => ParserState::AwaitingSignature,
            State::Header => ParserState::AwaitingChunkHeader,
            State::Body(_) => ParserState::InChunkBody,
            State::Crc(_) => ParserState::AwaitingCrc,
        }
    }

    /// Type of the chunk being read, if any
    pub fn current_chunk(&self) -> Option<ChunkType> {
        match &self.state {
            State::Body(cursor) | State::Crc(cursor) => Some(cursor.chunk_type),
            _ => None,
        }
    }

    /// Whether a fatal error stopped this splitter
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// IHDR of the image being scanned
    pub fn header(&self) -> Option<&ImageHeader> {
        self.image.header.as_ref()
    }

    /// Format of the image being scanned, as resolved so far
    pub fn format(&self) -> &FormatDescriptor {
        &self.image.format
    }

    /// Text metadata of the image being scanned
    pub fn metadata(&self) -> &Metadata {
        &self.image.metadata
    }

    /// Number of images emitted
    pub fn image_count(&self) -> u64 {
        self.images
    }

    /// Bytes fed but not yet consumed by the state machine
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Whether an image has been started but not completed
    pub fn has_partial_image(&self) -> bool {
        !self.accumulator.is_empty()
    }

    /// Bytes of the unfinished image fed so far, signature included
    pub fn partial_len(&self) -> usize {
        self.accumulator.len()
    }

    /// Return to the freshly constructed state, keeping the configuration
    pub fn reset(&mut self) {
        *self = Self::with_config(self.config);
    }

    /// Feed a chunk of bytes, calling the callback for each event
    ///
    /// Events produced before a fatal error are delivered before the error
    /// is returned. After a fatal error, further input is ignored.
    pub fn feed<F>(&mut self, data: &[u8], mut callback: F) -> Result<()>
    where
        F: FnMut(Event),
    {
        if self.halted {
            trace!("ignoring {} bytes, splitter halted", data.len());
            return Ok(());
        }

        self.buffer.extend(data);
        self.accumulator.extend_from_slice(data);

        loop {
            match self.step(&mut callback) {
                Ok(true) => {},
                Ok(false) => return Ok(()),
                Err(err) => {
                    debug!("splitter halted: {}", err);
                    self.halt();
                    return Err(err);
                },
            }
        }
    }

    /// Feed a chunk and collect events into a vector
    pub fn feed_collect(&mut self, data: &[u8]) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        self.feed(data, |event| events.push(event))?;
        Ok(events)
    }

    fn halt(&mut self) {
        self.halted = true;
        self.buffer.clear();
        self.accumulator = Vec::new();
    }

    /// Run one step; false when no progress is possible without more input
    fn step<F>(&mut self, callback: &mut F) -> Result<bool>
    where
        F: FnMut(Event),
    {
        match std::mem::replace(&mut self.state, State::Signature) {
            State::Signature => self.read_signature(),
            State::Header => self.read_chunk_header(),
            State::Body(cursor) => self.read_chunk_body(cursor, callback),
            State::Crc(cursor) => self.read_crc(cursor, callback),
        }
    }

    /// Drop `n` bytes from the buffer, counting them towards the image
    fn consume(&mut self, n: usize) {
        self.buffer.consume(n);
        self.image.length += n;
    }

    fn read_signature(&mut self) -> Result<bool> {
        let data = self.buffer.as_slice();
        // Reject on the first mismatching byte, even before all 8 arrive
        let n = data.len().min(SIGNATURE.len());
        if data[..n] != SIGNATURE[..n] {
            return Err(Error::InvalidSignature);
        }
        if n < SIGNATURE.len() {
            return Ok(false);
        }

        self.consume(SIGNATURE.len());
        self.state = State::Header;
        Ok(true)
    }

    fn read_chunk_header(&mut self) -> Result<bool> {
        let data = self.buffer.as_slice();
        if data.len() < CHUNK_HEADER_LEN {
            self.state = State::Header;
            return Ok(false);
        }

        let cursor = ChunkCursor::from_header(&data[..CHUNK_HEADER_LEN]);
        trace!("chunk {} ({} bytes)", cursor.chunk_type, cursor.length);

        self.consume(CHUNK_HEADER_LEN);
        self.state = State::Body(cursor);
        Ok(true)
    }

    fn read_chunk_body<F>(&mut self, mut cursor: ChunkCursor, callback: &mut F) -> Result<bool>
    where
        F: FnMut(Event),
    {
        let data = self.buffer.as_slice();
        if data.is_empty() && !cursor.is_complete() {
            self.state = State::Body(cursor);
            return Ok(false);
        }

        let handled = handlers::dispatch(&mut self.image, &cursor, data, &self.config)?;
        let n = handled.consumed;
        debug_assert!(n <= data.len());
        if !cursor.advance(&data[..n]) {
            return Err(Error::BadChunkSize {
                chunk: cursor.chunk_type,
                declared: cursor.length,
                consumed: u64::from(cursor.consumed) + n as u64,
            });
        }

        // Deliver before the bytes are consumed
        for event in handled.emit {
            callback(event);
        }
        self.consume(n);

        if cursor.is_complete() {
            self.state = State::Crc(cursor);
            return Ok(true);
        }
        self.state = State::Body(cursor);
        Ok(n > 0)
    }

    fn read_crc<F>(&mut self, cursor: ChunkCursor, callback: &mut F) -> Result<bool>
    where
        F: FnMut(Event),
    {
        let data = self.buffer.as_slice();
        if data.len() < CRC_LEN {
            self.state = State::Crc(cursor);
            return Ok(false);
        }

        if self.config.verify_crc {
            let stored = read_u32(data, 0);
            let computed = cursor.checksum();
            if stored != computed {
                return Err(Error::CrcMismatch {
                    chunk: cursor.chunk_type,
                    stored,
                    computed,
                });
            }
        }
        self.consume(CRC_LEN);

        if cursor.chunk_type == ChunkType::Iend {
            self.emit_image(callback);
            self.state = State::Signature;
        } else {
            self.state = State::Header;
        }
        Ok(true)
    }

    /// Hand out the finished image and start over
    fn emit_image<F>(&mut self, callback: &mut F)
    where
        F: FnMut(Event),
    {
        let length = self.image.length;
        let rest = self.accumulator.split_off(length);
        let image = std::mem::replace(&mut self.accumulator, rest);

        self.images += 1;
        debug!("image {} complete, {} bytes", self.images, length);

        self.image = ImageState::default();
        callback(Event::Image(image));
    }
}
