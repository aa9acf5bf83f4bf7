//! Server lifecycle errors.

use std::io;

use chunkchat_shared::error::ProtocolError;
use thiserror::Error;

/// An operation was called in the wrong lifecycle state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("server is already bound")]
    AlreadyBound,

    #[error("server is not bound; call bind() first")]
    NotBound,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] ProtocolError),
}
