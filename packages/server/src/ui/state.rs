//! Shared application state handed to every connection handler.

use std::{sync::Arc, time::Duration};

use chunkchat_shared::protocol::FrameCodec;

use crate::{
    config::ServerConfig,
    domain::SessionRepository,
    infrastructure::{BroadcastDispatcher, InMemorySessionRepository},
    usecase::{ConnectSessionUseCase, DisconnectSessionUseCase, RelayMessageUseCase},
};

pub struct AppState {
    /// Repository（セッションレジストリの抽象化）
    pub repository: Arc<dyn SessionRepository>,
    pub dispatcher: Arc<BroadcastDispatcher>,
    pub connect_usecase: ConnectSessionUseCase,
    pub disconnect_usecase: DisconnectSessionUseCase,
    pub relay_usecase: RelayMessageUseCase,
    /// Sender identity of explanatory messages
    pub server_name: String,
    pub frame_pacing: Duration,
    pub handshake_timeout: Duration,
}

impl AppState {
    /// Wire up the registry, dispatcher and use cases in dependency order
    pub fn new(config: &ServerConfig, codec: FrameCodec) -> Self {
        // 1. Repository
        let repository: Arc<dyn SessionRepository> = Arc::new(InMemorySessionRepository::new());

        // 2. Dispatcher
        let dispatcher = Arc::new(BroadcastDispatcher::new(repository.clone(), codec));

        // 3. UseCases
        let connect_usecase = ConnectSessionUseCase::new(
            repository.clone(),
            dispatcher.clone(),
            config.username_policy(),
        );
        let disconnect_usecase = DisconnectSessionUseCase::new(dispatcher.clone());
        let relay_usecase = RelayMessageUseCase::new(repository.clone(), dispatcher.clone());

        Self {
            repository,
            dispatcher,
            connect_usecase,
            disconnect_usecase,
            relay_usecase,
            server_name: config.server_name.clone(),
            frame_pacing: config.frame_pacing,
            handshake_timeout: config.handshake_timeout,
        }
    }
}
