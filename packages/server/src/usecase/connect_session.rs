//! UseCase: セッション接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectSessionUseCase::execute() メソッド
//! - ユーザー名の検証、レジストリへの登録、JOIN / BATCH_JOIN の通知
//!
//! ### なぜこのテストが必要か
//! - 不正な名前や使用中の名前のセッションが登録されないことを保証
//! - 既存の参加者と新しい参加者の双方に在室情報が届くことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：最初の参加者、二人目以降の参加者
//! - 異常系：不正なユーザー名、使用中のユーザー名
//! - エッジケース：名前の確認と登録の間に同じ名前が先に登録された場合

use std::sync::Arc;

use chunkchat_shared::{protocol::Envelope, time::millis_to_rfc3339};

use crate::{
    domain::{Outbox, RepositoryError, Session, SessionRepository, UsernamePolicy},
    infrastructure::BroadcastDispatcher,
};

use super::error::ConnectError;

/// セッション接続のユースケース
pub struct ConnectSessionUseCase {
    /// Repository（セッションレジストリの抽象化）
    repository: Arc<dyn SessionRepository>,
    dispatcher: Arc<BroadcastDispatcher>,
    policy: UsernamePolicy,
}

impl ConnectSessionUseCase {
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        dispatcher: Arc<BroadcastDispatcher>,
        policy: UsernamePolicy,
    ) -> Self {
        Self {
            repository,
            dispatcher,
            policy,
        }
    }

    /// ハンドシェイクで受け取った名前でセッションを登録する
    ///
    /// # Arguments
    ///
    /// * `raw_name` - クライアントが最初の行で送ってきたユーザー名（トリム済み）
    /// * `outbox` - このコネクションへの送信キュー
    ///
    /// # Returns
    ///
    /// * `Ok(Session)` - 登録されたセッション
    /// * `Err(ConnectError)` - 拒否理由（表示文字列がそのままクライアントへの説明になる）
    pub async fn execute(&self, raw_name: &str, outbox: Outbox) -> Result<Session, ConnectError> {
        // 1. 名前の検証
        let username = self.policy.validate(raw_name)?;
        if self.repository.is_name_taken(username.as_str()).await {
            return Err(ConnectError::NameTaken(username.into_string()));
        }

        // 2. 登録（確認と登録の間に同じ名前が入った場合もここで拒否される）
        let session = Session::new(username, outbox);
        self.repository
            .add(session.clone())
            .await
            .map_err(|e| match e {
                RepositoryError::NameTaken(name) => ConnectError::NameTaken(name),
                RepositoryError::DuplicateSession(_) => {
                    ConnectError::NameTaken(session.username.to_string())
                }
            })?;
        tracing::info!(
            "Session '{}' ({}) joined the chat at {}",
            session.username,
            session.id,
            millis_to_rfc3339(session.connected_at)
        );

        // 3. 既存の参加者へ JOIN を通知
        let others = self.others(&session).await;
        self.dispatcher
            .send_to(&others, &Envelope::join(session.username.as_str()))
            .await;

        // 4. 新しい参加者へ在室者一覧を通知（JOIN 配送で外れた参加者は含めない）
        let occupants: Vec<String> = self
            .others(&session)
            .await
            .into_iter()
            .map(|s| s.username.into_string())
            .collect();
        if !occupants.is_empty() {
            self.dispatcher
                .send_one(&session, &Envelope::BatchJoin { usernames: occupants })
                .await;
        }

        Ok(session)
    }

    async fn others(&self, session: &Session) -> Vec<Session> {
        self.repository
            .list()
            .await
            .into_iter()
            .filter(|s| s.id != session.id)
            .collect()
    }
}
