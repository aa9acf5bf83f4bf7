//! Error types for the wire protocol.

use thiserror::Error;

/// Faults in the framing or in the payload it carries.
///
/// A protocol error is always local to the connection it was observed on.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The codec was configured with a zero chunk size
    #[error("chunk size must be at least 1 byte")]
    InvalidChunkSize,

    /// The `{index}/{total}` text does not fit into the fixed-width header
    #[error("frame header '{0}' exceeds {len} bytes", len = crate::protocol::HEADER_LENGTH)]
    HeaderOverflow(String),

    /// The header has no `/` separator (or more than one)
    #[error("frame header '{0}' is missing the index/total separator")]
    MissingSeparator(String),

    /// One side of the header is not an unsigned integer
    #[error("frame header '{0}' is not made of integers")]
    NonIntegerHeader(String),

    /// The header is not valid ASCII/UTF-8 text
    #[error("frame header is not valid text")]
    NonTextHeader,

    /// Index outside of `[1, total]`, or a zero total
    #[error("frame index {index} is out of range for total {total}")]
    IndexOutOfRange { index: usize, total: usize },

    /// The same index arrived twice for one message
    #[error("frame index {0} received twice")]
    DuplicateIndex(usize),

    /// A frame belongs to a different message than the one in flight
    #[error("frame announces {found} chunks while {expected} are expected")]
    TotalMismatch { expected: usize, found: usize },

    /// The reassembled payload is not a valid envelope
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// The payload is valid JSON but not a known envelope shape
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),
}

/// Errors surfaced while reading frames from a transport.
#[derive(Debug, Error)]
pub enum CodecError {
    /// I/O failure on the connection
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Malformed frame or payload
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl CodecError {
    /// Whether this error came from the frames themselves rather than the socket
    pub fn is_protocol(&self) -> bool {
        matches!(self, CodecError::Protocol(_))
    }
}
