//! Streaming PNG splitter
//!
//! A stateful parser that turns a byte stream of concatenated PNG images
//! into discrete images plus format, metadata and animation events.
//! Reference: <https://www.w3.org/TR/png/>

mod buffer;
mod event;
mod handlers;
mod state;

pub use event::Event;
pub use state::{ParserState, Splitter};
