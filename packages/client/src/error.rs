//! Error types for the chat client.

use std::io;

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("client is already connected")]
    AlreadyConnected,

    #[error("client is not connected")]
    NotConnected,

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(#[from] io::Error),
}
