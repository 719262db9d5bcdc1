//! Reader adapter
//!
//! Pulls blocks from any [`Read`] source through a [`Splitter`] and yields
//! the resulting events as an iterator.

use std::collections::VecDeque;
use std::io::{self, Read};

use tracing::warn;

use crate::config::SplitterConfig;
use crate::splitter::{Event, Splitter};

/// Default read size
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Iterator of splitter events over a reader
///
/// Iteration ends at end of input or after the first error. A parse error is
/// reported as [`io::ErrorKind::InvalidData`] once every event produced
/// before it has been yielded.
pub struct SplitReader<R> {
    reader: R,
    splitter: Splitter,
    block: Vec<u8>,
    pending: VecDeque<Event>,
    error: Option<io::Error>,
    done: bool,
}

impl<R: Read> SplitReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, SplitterConfig::default())
    }

    pub fn with_config(reader: R, config: SplitterConfig) -> Self {
        Self {
            reader,
            splitter: Splitter::with_config(config),
            block: vec![0; DEFAULT_BLOCK_SIZE],
            pending: VecDeque::new(),
            error: None,
            done: false,
        }
    }

    /// Read at most `size` bytes at a time
    pub fn with_block_size(mut self, size: usize) -> Self {
        self.block = vec![0; size.max(1)];
        self
    }

    /// The underlying splitter
    pub fn splitter(&self) -> &Splitter {
        &self.splitter
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Only the completed images
    pub fn images(self) -> impl Iterator<Item = io::Result<Vec<u8>>> {
        self.filter_map(|event| match event {
            Ok(event) => event.into_image().map(Ok),
            Err(err) => Some(Err(err)),
        })
    }

    /// Read one block and feed it; marks the reader done at EOF or error
    fn fill(&mut self) {
        let n = match self.reader.read(&mut self.block) {
            Ok(0) => {
                self.done = true;
                if self.splitter.has_partial_image() {
                    warn!(
                        "input ended inside an image, {} bytes unemitted",
                        self.splitter.partial_len()
                    );
                }
                return;
            },
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => return,
            Err(err) => {
                self.done = true;
                self.error = Some(err);
                return;
            },
        };

        let pending = &mut self.pending;
        if let Err(err) = self.splitter.feed(&self.block[..n], |event| pending.push_back(event)) {
            self.done = true;
            self.error = Some(err.into());
        }
    }
}

impl<R: Read> Iterator for SplitReader<R> {
    type Item = io::Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if let Some(err) = self.error.take() {
                return Some(Err(err));
            }
            if self.done {
                return None;
            }
            self.fill();
        }
    }
}
