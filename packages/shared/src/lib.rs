//! Shared building blocks for the Chunkchat server and client.
//!
//! The interesting part lives in [`protocol`]: the chunked framing used on
//! every server-to-client connection, and the envelopes carried inside it.

pub mod error;
pub mod logger;
pub mod protocol;
pub mod time;
