//! Broadcast Dispatcher
//!
//! ## 責務
//!
//! - エンベロープを一度だけエンコードし、対象セッションの `Outbox` へ配る
//! - 配送に失敗したセッションを、配送が一通り終わった後でレジストリから外す
//! - 外したセッションの LEAVE を残りのセッションへ通知する
//!
//! ## 設計ノート
//!
//! 対象リストは呼び出し側が取ったスナップショットで、配送中にロックは保持しません。
//! 配送中に起きた参加・退出は次のブロードキャストから反映されます。
//! 退出通知そのものが新たな配送失敗を生むことがあるため、追い出し処理は
//! 再帰ではなく作業リストで順に処理します。

use std::sync::Arc;

use chunkchat_shared::protocol::{Envelope, FrameCodec};

use crate::domain::{
    DeliveryError, EncodedMessage, Outbox, Session, SessionId, SessionRepository,
};

/// Fans encoded envelopes out to sessions, evicting unreachable ones
pub struct BroadcastDispatcher {
    repository: Arc<dyn SessionRepository>,
    codec: FrameCodec,
}

impl BroadcastDispatcher {
    pub fn new(repository: Arc<dyn SessionRepository>, codec: FrameCodec) -> Self {
        Self { repository, codec }
    }

    /// Encode an envelope into wire frames
    pub fn encode(&self, envelope: &Envelope) -> Option<EncodedMessage> {
        let frames = match self.codec.encode(envelope) {
            Ok(frames) => frames,
            Err(e) => {
                tracing::error!("Failed to encode {:?} envelope: {}", envelope.meta(), e);
                return None;
            }
        };

        match frames.iter().map(|frame| frame.to_bytes()).collect::<Result<Vec<_>, _>>() {
            Ok(bytes) => Some(bytes.into()),
            Err(e) => {
                tracing::error!("Failed to render frame headers: {}", e);
                None
            }
        }
    }

    /// Deliver `envelope` to every target, then evict the ones that failed.
    ///
    /// Returns the number of targets the message was handed to.
    pub async fn send_to(&self, targets: &[Session], envelope: &Envelope) -> usize {
        let Some(message) = self.encode(envelope) else {
            return 0;
        };

        let failed = self.deliver(targets, &message);
        let delivered = targets.len() - failed.len();
        tracing::debug!(
            "Delivered {:?} envelope to {}/{} sessions",
            envelope.meta(),
            delivered,
            targets.len()
        );

        self.evict_all(failed).await;
        delivered
    }

    /// Deliver `envelope` to a single session, evicting it on failure
    pub async fn send_one(&self, session: &Session, envelope: &Envelope) -> bool {
        self.send_to(std::slice::from_ref(session), envelope).await == 1
    }

    /// Queue `envelope` on a connection that is not (or no longer) registered
    pub fn notify(&self, outbox: &Outbox, envelope: &Envelope) -> Result<(), DeliveryError> {
        let message = self.encode(envelope).ok_or(DeliveryError::Unencodable)?;
        outbox.push(message)
    }

    /// Deregister a session and tell the remaining sessions it left.
    ///
    /// Returns the session only for the caller that actually removed it, so
    /// the LEAVE event goes out exactly once per session.
    pub async fn evict(&self, id: &SessionId) -> Option<Session> {
        self.evict_all(vec![*id]).await.into_iter().next()
    }

    fn deliver(&self, targets: &[Session], message: &EncodedMessage) -> Vec<SessionId> {
        targets
            .iter()
            .filter_map(|session| match session.outbox.push(Arc::clone(message)) {
                Ok(()) => None,
                Err(e) => {
                    tracing::warn!(
                        "Failed to deliver to '{}' ({}): {}",
                        session.username,
                        session.id,
                        e
                    );
                    Some(session.id)
                }
            })
            .collect()
    }

    async fn evict_all(&self, mut pending: Vec<SessionId>) -> Vec<Session> {
        let mut evicted = Vec::new();

        while !pending.is_empty() {
            let id = pending.remove(0);
            // already removed by its own handler or an earlier eviction
            let Some(session) = self.repository.remove(&id).await else {
                continue;
            };
            tracing::info!("Session '{}' ({}) left the chat", session.username, session.id);

            let remaining = self.repository.list().await;
            if let Some(message) = self.encode(&Envelope::leave(session.username.as_str())) {
                pending.extend(self.deliver(&remaining, &message));
            }
            evicted.push(session);
        }

        evicted
    }
}
