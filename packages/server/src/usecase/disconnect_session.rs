//! UseCase: セッション切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectSessionUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 切断したセッションがレジストリから外れ、残りの参加者に LEAVE が届くことを確認
//! - 追い出し済みのセッションを再度切断しても LEAVE が重複しないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者の切断と通知
//! - エッジケース：最後の参加者の切断（通知対象なし）
//! - 異常系：既にレジストリから外れているセッションの切断

use std::sync::Arc;

use crate::{
    domain::{Session, SessionId},
    infrastructure::BroadcastDispatcher,
};

/// セッション切断のユースケース
pub struct DisconnectSessionUseCase {
    dispatcher: Arc<BroadcastDispatcher>,
}

impl DisconnectSessionUseCase {
    pub fn new(dispatcher: Arc<BroadcastDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Returns the removed session, or `None` if something else removed it first
    pub async fn execute(&self, id: &SessionId) -> Option<Session> {
        let session = self.dispatcher.evict(id).await;
        if session.is_none() {
            tracing::debug!("Session {} was already removed", id);
        }
        session
    }
}

#[cfg(test)]
mod tests {
    use chunkchat_shared::protocol::{Envelope, FrameCodec};
    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        domain::{DEFAULT_MAX_USERNAME_LEN, Outbox, SessionRepository, UsernamePolicy},
        infrastructure::InMemorySessionRepository,
    };

    fn setup() -> (Arc<InMemorySessionRepository>, Arc<BroadcastDispatcher>) {
        let repository = Arc::new(InMemorySessionRepository::new());
        let dispatcher = Arc::new(BroadcastDispatcher::new(
            repository.clone(),
            FrameCodec::default(),
        ));
        (repository, dispatcher)
    }

    fn session(name: &str) -> (Session, mpsc::Receiver<crate::domain::EncodedMessage>) {
        let policy = UsernamePolicy::new("SERVER", DEFAULT_MAX_USERNAME_LEN);
        let (tx, rx) = mpsc::channel(16);
        (Session::new(policy.validate(name).unwrap(), Outbox::new(tx)), rx)
    }

    #[tokio::test]
    async fn test_disconnect_notifies_remaining() {
        // テスト項目: 切断したセッションは外れ、残りの参加者に LEAVE が一通届く
        // given (前提条件):
        let (repository, dispatcher) = setup();
        let usecase = DisconnectSessionUseCase::new(dispatcher.clone());
        let (alice, mut alice_inbox) = session("alice");
        let (bob, _bob_inbox) = session("bob");
        repository.add(alice.clone()).await.unwrap();
        repository.add(bob.clone()).await.unwrap();

        // when (操作):
        let removed = usecase.execute(&bob.id).await;

        // then (期待する結果):
        assert_eq!(removed.map(|s| s.username.into_string()), Some("bob".to_string()));
        assert!(!repository.contains(&bob.id).await);
        let expected = dispatcher.encode(&Envelope::leave("bob")).unwrap();
        assert_eq!(alice_inbox.try_recv().unwrap(), expected);
        assert!(alice_inbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_disconnect_last_session() {
        // テスト項目: 最後の参加者が切断してもエラーにならずレジストリが空になる
        // given (前提条件):
        let (repository, dispatcher) = setup();
        let usecase = DisconnectSessionUseCase::new(dispatcher);
        let (alice, _alice_inbox) = session("alice");
        repository.add(alice.clone()).await.unwrap();

        // when (操作):
        let removed = usecase.execute(&alice.id).await;

        // then (期待する結果):
        assert!(removed.is_some());
        assert!(repository.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_already_removed() {
        // テスト項目: 既に外れているセッションの切断は何もしない
        // given (前提条件):
        let (repository, dispatcher) = setup();
        let usecase = DisconnectSessionUseCase::new(dispatcher);
        let (alice, mut alice_inbox) = session("alice");
        let (bob, _bob_inbox) = session("bob");
        repository.add(alice.clone()).await.unwrap();

        // when (操作):
        let removed = usecase.execute(&bob.id).await;

        // then (期待する結果):
        assert!(removed.is_none());
        assert!(alice_inbox.try_recv().is_err());
    }
}
