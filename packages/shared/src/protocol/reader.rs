//! Reading framed envelopes from a byte stream.
//!
//! Frames are delimited without relying on transport read boundaries:
//! every non-final frame carries exactly `chunk_size` payload bytes, and the
//! final frame ends where the JSON value formed by the reassembled payload
//! ends. Senders therefore must write the frames of a message in index order.

use std::io;

use serde::de::IgnoredAny;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::CodecError;

use super::{
    Envelope, FrameCodec,
    frame::{Frame, HEADER_LENGTH, Reassembler, decode_header},
};

/// Decodes envelopes from a buffered async reader
pub struct FrameReader<R> {
    reader: R,
    chunk_size: usize,
    reassembler: Reassembler,
}

impl<R> FrameReader<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R, codec: FrameCodec) -> Self {
        Self {
            reader,
            chunk_size: codec.chunk_size(),
            reassembler: Reassembler::new(),
        }
    }

    /// Read frames until one envelope is complete.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly between messages.
    pub async fn next_envelope(&mut self) -> Result<Option<Envelope>, CodecError> {
        self.read_envelope().await.inspect_err(|e| {
            if e.is_protocol() {
                tracing::warn!("Dropping malformed message: {}", e);
            }
        })
    }

    async fn read_envelope(&mut self) -> Result<Option<Envelope>, CodecError> {
        loop {
            let Some(frame) = self.next_frame().await? else {
                return Ok(None);
            };
            if let Some(envelope) = self.reassembler.push(frame)? {
                return Ok(Some(envelope));
            }
        }
    }

    /// Read a single frame.
    ///
    /// Returns `Ok(None)` on end of stream at a frame boundary with no message
    /// in flight.
    pub async fn next_frame(&mut self) -> Result<Option<Frame>, CodecError> {
        if self.reader.fill_buf().await?.is_empty() {
            if self.reassembler.is_idle() {
                return Ok(None);
            }
            return Err(unexpected_eof("stream ended inside a message"));
        }

        let mut header = [0u8; HEADER_LENGTH];
        self.reader.read_exact(&mut header).await?;
        let (index, total) = decode_header(&header)?;

        let payload = if index < total {
            let mut payload = vec![0u8; self.chunk_size];
            self.reader.read_exact(&mut payload).await?;
            payload
        } else {
            self.read_final_chunk().await?
        };

        Ok(Some(Frame {
            index,
            total,
            payload,
        }))
    }

    async fn read_final_chunk(&mut self) -> Result<Vec<u8>, CodecError> {
        let prefix = self.reassembler.received_payload();
        let mut chunk = Vec::new();

        while chunk.len() < self.chunk_size {
            let available = {
                let buf = self.reader.fill_buf().await?;
                if buf.is_empty() {
                    return Err(unexpected_eof("stream ended inside a frame"));
                }
                let room = self.chunk_size - chunk.len();
                buf[..buf.len().min(room)].to_vec()
            };

            let mut candidate = Vec::with_capacity(prefix.len() + chunk.len() + available.len());
            candidate.extend_from_slice(&prefix);
            candidate.extend_from_slice(&chunk);
            candidate.extend_from_slice(&available);

            match json_value_end(&candidate) {
                ValueEnd::Complete(end) => {
                    let used = end
                        .saturating_sub(prefix.len() + chunk.len())
                        .min(available.len());
                    chunk.extend_from_slice(&available[..used]);
                    self.reader.consume(used);
                    return Ok(chunk);
                }
                ValueEnd::Incomplete => {
                    chunk.extend_from_slice(&available);
                    self.reader.consume(available.len());
                }
                // reassembly reports the malformed payload
                ValueEnd::Invalid => {
                    chunk.extend_from_slice(&available);
                    self.reader.consume(available.len());
                    return Ok(chunk);
                }
            }
        }

        Ok(chunk)
    }
}

enum ValueEnd {
    Complete(usize),
    Incomplete,
    Invalid,
}

fn json_value_end(bytes: &[u8]) -> ValueEnd {
    let mut values = serde_json::Deserializer::from_slice(bytes).into_iter::<IgnoredAny>();
    match values.next() {
        Some(Ok(_)) => ValueEnd::Complete(values.byte_offset()),
        Some(Err(e)) if e.is_eof() => ValueEnd::Incomplete,
        None => ValueEnd::Incomplete,
        Some(Err(_)) => ValueEnd::Invalid,
    }
}

fn unexpected_eof(message: &'static str) -> CodecError {
    CodecError::Transport(io::Error::new(io::ErrorKind::UnexpectedEof, message))
}

#[cfg(test)]
mod tests {
    use tokio::io::BufReader;

    use super::*;
    use crate::error::ProtocolError;

    fn wire_bytes(codec: &FrameCodec, envelopes: &[Envelope]) -> Vec<u8> {
        envelopes
            .iter()
            .flat_map(|envelope| codec.encode(envelope).unwrap())
            .flat_map(|frame| frame.to_bytes().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_reads_back_to_back_messages() {
        // テスト項目: 連続して書き込まれた複数メッセージを境界を誤らずに読み出せる
        // given (前提条件):
        let codec = FrameCodec::new(7).unwrap();
        let envelopes = vec![
            Envelope::send("bob", "hi"),
            Envelope::join("carol"),
            Envelope::BatchJoin {
                usernames: vec!["alice".into(), "bob".into()],
            },
        ];
        let bytes = wire_bytes(&codec, &envelopes);
        // a tiny buffer forces many partial fills
        let mut reader = FrameReader::new(BufReader::with_capacity(3, &bytes[..]), codec);

        // when (操作):
        let mut decoded = Vec::new();
        while let Some(envelope) = reader.next_envelope().await.unwrap() {
            decoded.push(envelope);
        }

        // then (期待する結果):
        assert_eq!(decoded, envelopes);
    }

    #[tokio::test]
    async fn test_final_chunk_exactly_chunk_size() {
        // テスト項目: 最終チャンクがちょうど chunk_size の場合も正しく読める
        // given (前提条件):
        let envelope = Envelope::send("bob", "hello there");
        let payload_len = serde_json::to_vec(&envelope).unwrap().len();
        let codec = FrameCodec::new(payload_len).unwrap();
        let bytes = wire_bytes(&codec, &[envelope.clone(), envelope.clone()]);
        let mut reader = FrameReader::new(BufReader::new(&bytes[..]), codec);

        // when (操作):
        let first = reader.next_envelope().await.unwrap();
        let second = reader.next_envelope().await.unwrap();
        let end = reader.next_envelope().await.unwrap();

        // then (期待する結果):
        assert_eq!(first, Some(envelope.clone()));
        assert_eq!(second, Some(envelope));
        assert_eq!(end, None);
    }

    #[tokio::test]
    async fn test_clean_eof_returns_none() {
        // テスト項目: メッセージ境界での EOF は正常終了として None を返す
        // given (前提条件):
        let bytes: Vec<u8> = Vec::new();
        let mut reader = FrameReader::new(BufReader::new(&bytes[..]), FrameCodec::default());

        // when (操作):
        let result = reader.next_envelope().await;

        // then (期待する結果):
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_eof_inside_message_is_transport_error() {
        // テスト項目: メッセージ途中での EOF はトランスポートエラーになる
        // given (前提条件):
        let codec = FrameCodec::new(4).unwrap();
        let mut bytes = wire_bytes(&codec, &[Envelope::send("bob", "cut short")]);
        bytes.truncate(HEADER_LENGTH * 2 + 6);
        let mut reader = FrameReader::new(BufReader::new(&bytes[..]), codec);

        // when (操作):
        let result = reader.next_envelope().await;

        // then (期待する結果):
        let err = result.unwrap_err();
        assert!(!err.is_protocol());
        assert!(matches!(err, CodecError::Transport(e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[tokio::test]
    async fn test_malformed_header_is_protocol_error() {
        // テスト項目: 不正なヘッダーはプロトコルエラーになり部分的な結果は返らない
        // given (前提条件):
        let bytes = b"one/two         {\"meta\":1,\"username\":\"bob\"}".to_vec();
        let mut reader = FrameReader::new(BufReader::new(&bytes[..]), FrameCodec::default());

        // when (操作):
        let result = reader.next_envelope().await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(CodecError::Protocol(ProtocolError::NonIntegerHeader(_)))
        ));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_protocol_error() {
        // テスト項目: JSON として不正なペイロードはプロトコルエラーになる
        // given (前提条件):
        let bytes = b"1/1             not json at all".to_vec();
        let mut reader = FrameReader::new(BufReader::new(&bytes[..]), FrameCodec::default());

        // when (操作):
        let result = reader.next_envelope().await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(CodecError::Protocol(ProtocolError::MalformedPayload(_)))
        ));
    }

    #[tokio::test]
    async fn test_unknown_envelope_is_protocol_error() {
        // テスト項目: JSON として正しくても未知のエンベロープはプロトコルエラーになる
        // given (前提条件):
        let bytes = b"1/1             {\"meta\":7}".to_vec();
        let mut reader = FrameReader::new(BufReader::new(&bytes[..]), FrameCodec::default());

        // when (操作):
        let result = reader.next_envelope().await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(CodecError::Protocol(ProtocolError::InvalidEnvelope(_)))
        ));
    }
}
