//! Domain errors.

use thiserror::Error;

/// Username policy violations.
///
/// The `Display` text is the explanation sent back to the rejected client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsernameError {
    #[error("Username must be provided.")]
    Empty,

    #[error("\"{name}\" is too long. Maximum length is {max}.")]
    TooLong { name: String, max: usize },

    #[error("\"{name}\" has invalid characters. The following char is invalid \"{invalid}\"")]
    InvalidChar { name: String, invalid: char },

    #[error("\"{0}\" is an invalid username.")]
    Reserved(String),
}

/// Registry mutation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("username '{0}' is already held by a live session")]
    NameTaken(String),

    #[error("session '{0}' is already registered")]
    DuplicateSession(String),
}

/// Why a message could not be queued for a connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The connection's writer has gone away
    #[error("connection is no longer writable")]
    Closed,

    /// The peer stopped reading and its queue is full
    #[error("connection has too many undelivered messages")]
    Backlogged,

    #[error("message could not be encoded")]
    Unencodable,
}
