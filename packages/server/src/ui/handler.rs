//! Client session handler
//!
//! ## 責務
//!
//! 一つの TCP コネクションのライフサイクルを管理します。
//!
//! ```text
//! Connected -> AwaitingName -> Validating -> Active -> Closing -> Closed
//!                   |               |
//!                   +---------------+--> Closing
//! ```
//!
//! - 最初の一行をユーザー名として受け取り、検証・登録する
//! - 以降の行を SEND として他の参加者へ中継する
//! - どの経路で終了しても、登録済みのセッションはちょうど一度だけ外される

use std::{fmt, io, net::SocketAddr, sync::Arc, time::Duration};

use chunkchat_shared::protocol::Envelope;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader},
    net::TcpStream,
    sync::watch,
    task::JoinHandle,
    time::timeout,
};

use crate::{
    domain::{Outbox, Session},
    infrastructure::spawn_writer,
};

use super::state::AppState;

/// Upper bound on flushing queued frames once a connection is closing
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Longest accepted client line in bytes, excluding the `\n`
const MAX_LINE_LENGTH: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Connected,
    AwaitingName,
    Validating,
    Active,
    Closing,
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Connected => "CONNECTED",
            Phase::AwaitingName => "AWAITING_NAME",
            Phase::Validating => "VALIDATING",
            Phase::Active => "ACTIVE",
            Phase::Closing => "CLOSING",
            Phase::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}

struct Lifecycle {
    peer: SocketAddr,
    phase: Phase,
}

impl Lifecycle {
    fn new(peer: SocketAddr) -> Self {
        Self {
            peer,
            phase: Phase::Connected,
        }
    }

    fn advance(&mut self, next: Phase) {
        tracing::debug!("[{}] {} -> {}", self.peer, self.phase, next);
        self.phase = next;
    }
}

/// Drive one connection from accept to close
pub(super) async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut lifecycle = Lifecycle::new(peer);
    let (read_half, write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let (outbox, writer) = spawn_writer(write_half, state.frame_pacing);
    let mut writer = Some(writer);

    lifecycle.advance(Phase::AwaitingName);
    let raw_name = tokio::select! {
        _ = stopped(&mut shutdown) => None,
        line = timeout(state.handshake_timeout, read_line(&mut reader)) => match line {
            Ok(Ok(Some(name))) => Some(name),
            Ok(Ok(None)) => {
                tracing::info!("[{}] Closed before sending a username", peer);
                None
            }
            Ok(Err(e)) => {
                tracing::warn!("[{}] Failed to read username: {}", peer, e);
                None
            }
            Err(_) => {
                tracing::info!("[{}] No username within {:?}", peer, state.handshake_timeout);
                None
            }
        },
    };

    let session = match raw_name {
        Some(name) => {
            lifecycle.advance(Phase::Validating);
            register(&state, peer, &name, &outbox).await
        }
        None => None,
    };

    if let Some(session) = &session {
        lifecycle.advance(Phase::Active);
        relay_lines(&state, session, &outbox, &mut reader, &mut writer, &mut shutdown).await;
    }

    lifecycle.advance(Phase::Closing);
    if let Some(session) = session {
        state.disconnect_usecase.execute(&session.id).await;
    }

    // the writer exits once every outbox clone is gone
    drop(outbox);
    if let Some(mut handle) = writer {
        if timeout(WRITER_DRAIN_TIMEOUT, &mut handle).await.is_err() {
            tracing::warn!("[{}] Gave up flushing queued frames", peer);
            handle.abort();
        }
    }
    lifecycle.advance(Phase::Closed);
}

async fn register(state: &AppState, peer: SocketAddr, name: &str, outbox: &Outbox) -> Option<Session> {
    match state.connect_usecase.execute(name, outbox.clone()).await {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::info!("[{}] Rejected username: {}", peer, e);
            let explanation = Envelope::send(state.server_name.as_str(), e.to_string());
            if let Err(e) = state.dispatcher.notify(outbox, &explanation) {
                tracing::debug!("[{}] Could not send rejection: {}", peer, e);
            }
            None
        }
    }
}

async fn relay_lines<R>(
    state: &AppState,
    session: &Session,
    outbox: &Outbox,
    reader: &mut R,
    writer: &mut Option<JoinHandle<()>>,
    shutdown: &mut watch::Receiver<bool>,
) where
    R: AsyncBufRead + Unpin,
{
    loop {
        tokio::select! {
            _ = stopped(shutdown) => {
                tracing::info!("Closing session '{}' for shutdown", session.username);
                break;
            }
            _ = outbox.overflowed() => {
                tracing::warn!("'{}' fell too far behind and was evicted", session.username);
                break;
            }
            _ = writer_finished(writer) => {
                tracing::info!("Connection of '{}' is no longer writable", session.username);
                break;
            }
            line = read_line(reader) => match line {
                Ok(Some(line)) => {
                    state.relay_usecase.execute(session, &line).await;
                }
                Ok(None) => {
                    tracing::info!("'{}' disconnected", session.username);
                    break;
                }
                Err(e) => {
                    tracing::warn!("Failed to read from '{}': {}", session.username, e);
                    break;
                }
            },
        }
    }
}

/// Resolves once the server is stopping (or the stop signal is gone)
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stopped| *stopped).await;
}

/// Resolves when the writer task ends, clearing the handle
async fn writer_finished(writer: &mut Option<JoinHandle<()>>) {
    let Some(handle) = writer.as_mut() else {
        return std::future::pending().await;
    };
    if let Err(e) = handle.await {
        tracing::error!("Connection writer panicked: {}", e);
    }
    *writer = None;
}

/// Read one `\n`-terminated line, trimmed. `None` at end of stream.
///
/// Lines longer than [`MAX_LINE_LENGTH`] fail with `InvalidData` without
/// buffering the rest of the line.
async fn read_line<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let limit = MAX_LINE_LENGTH as u64 + 1;
    if (&mut *reader).take(limit).read_until(b'\n', &mut buf).await? == 0 {
        return Ok(None);
    }
    if buf.len() > MAX_LINE_LENGTH && buf.last() != Some(&b'\n') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line exceeds {} bytes", MAX_LINE_LENGTH),
        ));
    }
    Ok(Some(String::from_utf8_lossy(&buf).trim().to_string()))
}
