//! UseCase layer: the handshake, relaying and departure flows.

mod connect_session;
mod disconnect_session;
pub mod error;
mod relay_message;

pub use connect_session::ConnectSessionUseCase;
pub use disconnect_session::DisconnectSessionUseCase;
pub use error::ConnectError;
pub use relay_message::RelayMessageUseCase;
