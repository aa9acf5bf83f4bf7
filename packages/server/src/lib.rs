//! Chunkchat relay server.
//!
//! Accepts TCP connections, registers each under a validated username and
//! relays chat lines to every other session as chunked, framed envelopes.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
pub mod error;

pub use config::ServerConfig;
pub use error::{ServerError, StateError};
pub use ui::{Server, ServerHandle};
