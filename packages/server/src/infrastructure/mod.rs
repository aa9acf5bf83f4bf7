//! Infrastructure layer: the in-memory registry and everything that writes to sockets.

pub mod dispatcher;
pub mod outbox;
pub mod repository;

pub use dispatcher::BroadcastDispatcher;
pub use outbox::spawn_writer;
pub use repository::InMemorySessionRepository;
