//! Network-facing layer: the connection acceptor and per-connection handlers.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::{Server, ServerHandle};
pub use signal::shutdown_signal;
