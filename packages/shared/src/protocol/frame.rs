//! Chunked framing of envelopes.
//!
//! An encoded envelope is split into chunks of at most `chunk_size` bytes.
//! Each chunk travels behind a fixed-width ASCII header `"{index}/{total}"`
//! right-padded with spaces to [`HEADER_LENGTH`] bytes. Indices start at 1.

use serde_json::error::Category;

use crate::error::ProtocolError;

use super::Envelope;

/// Width of the ASCII frame header in bytes
pub const HEADER_LENGTH: usize = 16;

/// Default payload bytes per frame
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// One transmission unit of an encoded envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub index: usize,
    pub total: usize,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Header bytes followed by the payload, ready to be written
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut bytes = encode_header(self.index, self.total)?.to_vec();
        bytes.extend_from_slice(&self.payload);
        Ok(bytes)
    }
}

/// Render `"{index}/{total}"` padded with spaces to [`HEADER_LENGTH`] bytes
pub fn encode_header(index: usize, total: usize) -> Result<[u8; HEADER_LENGTH], ProtocolError> {
    let text = format!("{index}/{total}");
    if text.len() > HEADER_LENGTH {
        return Err(ProtocolError::HeaderOverflow(text));
    }
    let mut header = [b' '; HEADER_LENGTH];
    header[..text.len()].copy_from_slice(text.as_bytes());
    Ok(header)
}

/// Parse a fixed-width header into `(index, total)`
pub fn decode_header(header: &[u8]) -> Result<(usize, usize), ProtocolError> {
    let text = std::str::from_utf8(header)
        .map_err(|_| ProtocolError::NonTextHeader)?
        .trim();

    let mut parts = text.split('/');
    let (Some(index), Some(total), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ProtocolError::MissingSeparator(text.to_string()));
    };

    let parse = |part: &str| {
        part.trim()
            .parse::<usize>()
            .map_err(|_| ProtocolError::NonIntegerHeader(text.to_string()))
    };
    let (index, total) = (parse(index)?, parse(total)?);

    if total == 0 || index == 0 || index > total {
        return Err(ProtocolError::IndexOutOfRange { index, total });
    }
    Ok((index, total))
}

/// Splits envelopes into frames of a fixed maximum payload size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    chunk_size: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl FrameCodec {
    pub fn new(chunk_size: usize) -> Result<Self, ProtocolError> {
        if chunk_size == 0 {
            return Err(ProtocolError::InvalidChunkSize);
        }
        Ok(Self { chunk_size })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Serialize `envelope` and split it into frames
    pub fn encode(&self, envelope: &Envelope) -> Result<Vec<Frame>, ProtocolError> {
        let payload = serde_json::to_vec(envelope)?;
        let total = payload.len().div_ceil(self.chunk_size);

        // the last header is the widest one
        encode_header(total, total)?;

        Ok(payload
            .chunks(self.chunk_size)
            .enumerate()
            .map(|(i, chunk)| Frame {
                index: i + 1,
                total,
                payload: chunk.to_vec(),
            })
            .collect())
    }
}

/// Accumulates the frames of a single in-flight message.
///
/// The first frame fixes the expected total. A connection carries one
/// message at a time, so a frame announcing a different total is rejected
/// rather than started as a second message.
#[derive(Debug, Default)]
pub struct Reassembler {
    expected: Option<usize>,
    parts: Vec<(usize, Vec<u8>)>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no frame of a message has been received yet
    pub fn is_idle(&self) -> bool {
        self.expected.is_none()
    }

    /// Payload bytes received so far, ordered by index
    pub fn received_payload(&self) -> Vec<u8> {
        let mut parts: Vec<&(usize, Vec<u8>)> = self.parts.iter().collect();
        parts.sort_by_key(|(index, _)| *index);
        parts
            .into_iter()
            .flat_map(|(_, bytes)| bytes.iter().copied())
            .collect()
    }

    /// Add a frame; returns the envelope once every chunk has arrived.
    ///
    /// On error the partial message is discarded.
    pub fn push(&mut self, frame: Frame) -> Result<Option<Envelope>, ProtocolError> {
        match self.accept(frame) {
            Ok(done) if !done => Ok(None),
            Ok(_) => {
                let payload = self.received_payload();
                self.reset();
                decode_payload(&payload).map(Some)
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    fn accept(&mut self, frame: Frame) -> Result<bool, ProtocolError> {
        let Frame {
            index,
            total,
            payload,
        } = frame;
        if total == 0 || index == 0 || index > total {
            return Err(ProtocolError::IndexOutOfRange { index, total });
        }

        let expected = *self.expected.get_or_insert(total);
        if expected != total {
            return Err(ProtocolError::TotalMismatch {
                expected,
                found: total,
            });
        }
        if self.parts.iter().any(|(seen, _)| *seen == index) {
            return Err(ProtocolError::DuplicateIndex(index));
        }

        self.parts.push((index, payload));
        Ok(self.parts.len() == expected)
    }

    fn reset(&mut self) {
        self.expected = None;
        self.parts.clear();
    }
}

/// Parse a reassembled payload, telling broken JSON apart from a wrong shape
fn decode_payload(payload: &[u8]) -> Result<Envelope, ProtocolError> {
    serde_json::from_slice(payload).map_err(|e| match e.classify() {
        Category::Data => ProtocolError::InvalidEnvelope(e.to_string()),
        _ => ProtocolError::MalformedPayload(e),
    })
}
