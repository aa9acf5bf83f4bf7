//! UseCase: メッセージ中継処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RelayMessageUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 送信者以外の全員に SEND が届き、送信者には届かないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：複数の参加者への中継
//! - エッジケース：送信者しかいない場合、空行

use std::sync::Arc;

use chunkchat_shared::protocol::Envelope;

use crate::{
    domain::{Session, SessionRepository},
    infrastructure::BroadcastDispatcher,
};

/// メッセージ中継のユースケース
pub struct RelayMessageUseCase {
    repository: Arc<dyn SessionRepository>,
    dispatcher: Arc<BroadcastDispatcher>,
}

impl RelayMessageUseCase {
    pub fn new(repository: Arc<dyn SessionRepository>, dispatcher: Arc<BroadcastDispatcher>) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Wrap `line` as a SEND from `sender` and deliver it to every other session.
    ///
    /// Returns the number of sessions it was handed to. Blank lines are dropped.
    pub async fn execute(&self, sender: &Session, line: &str) -> usize {
        if line.is_empty() {
            return 0;
        }

        let targets: Vec<Session> = self
            .repository
            .list()
            .await
            .into_iter()
            .filter(|s| s.id != sender.id)
            .collect();

        tracing::debug!("Relaying message from '{}' to {} sessions", sender.username, targets.len());
        self.dispatcher
            .send_to(&targets, &Envelope::send(sender.username.as_str(), line))
            .await
    }
}
