//! Chunked message framing over a stream transport.
//!
//! - [`envelope`]: the structured messages (`SEND`, `JOIN`, `LEAVE`, ...)
//! - [`frame`]: splitting an envelope into length-tagged chunks and
//!   reassembling them
//! - [`reader`]: pulling envelopes off an async byte stream

pub mod envelope;
pub mod frame;
pub mod reader;

pub use envelope::{Envelope, Meta};
pub use frame::{DEFAULT_CHUNK_SIZE, Frame, FrameCodec, HEADER_LENGTH, Reassembler};
pub use reader::FrameReader;
