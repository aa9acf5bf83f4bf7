//! Connection acceptor.

use std::{io, net::SocketAddr, sync::Arc};

use tokio::{net::TcpListener, sync::watch, task::JoinSet};

use crate::{
    config::ServerConfig,
    error::{ServerError, StateError},
};

use super::{handler::handle_connection, state::AppState};

/// Chat relay server
///
/// # Example
///
/// ```ignore
/// let mut server = Server::new(ServerConfig::default())?;
/// let addr = server.bind().await?;
/// let handle = server.handle();
/// tokio::spawn(async move { shutdown_signal().await; handle.stop().await });
/// server.serve().await?;
/// ```
pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
    listener: Option<TcpListener>,
    shutdown: Arc<watch::Sender<bool>>,
    running: Arc<watch::Sender<bool>>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let codec = config.frame_codec()?;
        let state = Arc::new(AppState::new(&config, codec));
        let (shutdown, _) = watch::channel(false);
        let (running, _) = watch::channel(false);

        Ok(Self {
            config,
            state,
            listener: None,
            shutdown: Arc::new(shutdown),
            running: Arc::new(running),
        })
    }

    /// Bind the listening socket, returning the actual address (useful with port 0)
    pub async fn bind(&mut self) -> Result<SocketAddr, ServerError> {
        if self.listener.is_some() {
            return Err(StateError::AlreadyBound.into());
        }

        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        let addr = listener.local_addr()?;
        tracing::info!("Chat server listening on {}", addr);
        self.listener = Some(listener);
        Ok(addr)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            state: Arc::clone(&self.state),
            shutdown: Arc::clone(&self.shutdown),
            running: Arc::clone(&self.running),
        }
    }

    /// Accept connections until [`ServerHandle::stop`] is called or the
    /// listener fails, then wait for every handler to finish.
    pub async fn serve(self) -> Result<(), ServerError> {
        let Server {
            state,
            listener,
            shutdown,
            running,
            ..
        } = self;
        let Some(listener) = listener else {
            return Err(StateError::NotBound.into());
        };

        running.send_replace(true);
        let mut stop = shutdown.subscribe();
        let mut handlers = JoinSet::new();

        let result = loop {
            tokio::select! {
                _ = stop.wait_for(|stopped| *stopped) => {
                    tracing::info!("Shutdown requested, no longer accepting connections");
                    break Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::info!("Accepted connection from {}", peer);
                        handlers.spawn(handle_connection(
                            stream,
                            peer,
                            Arc::clone(&state),
                            shutdown.subscribe(),
                        ));
                    }
                    Err(e) if is_transient(&e) => {
                        tracing::warn!("Failed to accept connection: {}", e);
                    }
                    Err(e) => {
                        tracing::error!("Listener failed, shutting down: {}", e);
                        break Err(e.into());
                    }
                },
                Some(joined) = handlers.join_next(), if !handlers.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!("Connection handler panicked: {}", e);
                    }
                }
            }
        };

        drop(listener);
        shutdown.send_replace(true);

        tracing::info!("Waiting for {} connection handlers to finish", handlers.len());
        while let Some(joined) = handlers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Connection handler panicked: {}", e);
            }
        }

        running.send_replace(false);
        tracing::info!("Server shutdown complete");
        result
    }
}

/// Cloneable control handle for a [`Server`]
#[derive(Clone)]
pub struct ServerHandle {
    state: Arc<AppState>,
    shutdown: Arc<watch::Sender<bool>>,
    running: Arc<watch::Sender<bool>>,
}

impl ServerHandle {
    /// Close the listener, end every handler and wait until they have finished.
    ///
    /// Returns immediately if the server is not serving.
    pub async fn stop(&self) {
        self.shutdown.send_replace(true);

        let mut running = self.running.subscribe();
        // the sender lives in `self`, so this only ends when serving stops
        let _ = running.wait_for(|running| !*running).await;
    }

    /// Usernames of the live sessions, in join order
    pub async fn usernames(&self) -> Vec<String> {
        self.state
            .repository
            .list()
            .await
            .into_iter()
            .map(|session| session.username.into_string())
            .collect()
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
    )
}
