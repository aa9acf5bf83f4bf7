//! Entities: a live session and its outbound queue.

use std::sync::Arc;

use chunkchat_shared::time::now_millis;
use tokio::sync::{Notify, mpsc, mpsc::error::TrySendError};

use super::{
    error::DeliveryError,
    value_object::{SessionId, Username},
};

/// One encoded message: the wire bytes of each frame, in index order
pub type EncodedMessage = Arc<[Vec<u8>]>;

/// Handle for queueing whole messages to one connection.
///
/// A single writer drains the queue, so frames of two messages never
/// interleave on the connection. The queue is bounded; a peer that lets it
/// fill up is treated as unreachable.
#[derive(Debug, Clone)]
pub struct Outbox {
    sender: mpsc::Sender<EncodedMessage>,
    overflow: Arc<Notify>,
}

impl Outbox {
    pub fn new(sender: mpsc::Sender<EncodedMessage>) -> Self {
        Self {
            sender,
            overflow: Arc::new(Notify::new()),
        }
    }

    /// Queue a message without waiting.
    ///
    /// Fails once the connection's writer has gone away or the queue is full.
    pub fn push(&self, message: EncodedMessage) -> Result<(), DeliveryError> {
        match self.sender.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.overflow.notify_one();
                Err(DeliveryError::Backlogged)
            }
            Err(TrySendError::Closed(_)) => Err(DeliveryError::Closed),
        }
    }

    /// Resolves after a push was refused because the queue was full
    pub async fn overflowed(&self) {
        self.overflow.notified().await;
    }
}

/// A live connection paired with its validated display name
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub username: Username,
    /// Unix timestamp when the session was registered (UTC, milliseconds)
    pub connected_at: i64,
    pub outbox: Outbox,
}

impl Session {
    pub fn new(username: Username, outbox: Outbox) -> Self {
        Self {
            id: SessionId::generate(),
            username,
            connected_at: now_millis(),
            outbox,
        }
    }
}
