//! Domain layer: sessions, usernames and the registry abstraction.
//!
//! Nothing in here touches sockets. The registry is only reachable through
//! the [`SessionRepository`] trait, whose operations are each atomic.

pub mod entity;
pub mod error;
pub mod repository;
pub mod value_object;

pub use entity::{EncodedMessage, Outbox, Session};
pub use error::{DeliveryError, RepositoryError, UsernameError};
pub use repository::SessionRepository;
pub use value_object::{
    BUILTIN_RESERVED_NAMES, DEFAULT_MAX_USERNAME_LEN, DISALLOWED_CHARS, SessionId, Username,
    UsernamePolicy,
};
