//! Chunkchat terminal client.
//!
//! Sends raw lines to a Chunkchat server and renders the framed envelopes it
//! relays back.

pub mod connection;
pub mod error;
pub mod formatter;
pub mod presence;
mod runner;
mod ui;

pub use connection::{ChatConnection, ChatEvents};
pub use error::ClientError;
pub use runner::run_client;
