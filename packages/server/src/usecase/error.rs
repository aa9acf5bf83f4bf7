//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::UsernameError;

/// Reasons a connection's handshake is refused.
///
/// The `Display` text is the explanation sent back to the rejected client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error(transparent)]
    Invalid(#[from] UsernameError),

    #[error("\"{0}\" is already taken.")]
    NameTaken(String),
}
