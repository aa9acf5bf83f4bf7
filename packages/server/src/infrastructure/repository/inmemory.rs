//! InMemory Session Repository 実装
//!
//! ドメイン層が定義する SessionRepository trait の具体的な実装。
//! 参加順を保つため Vec をインメモリ DB として使用します。
//! 全ての操作は単一の Mutex で直列化されます。

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{RepositoryError, Session, SessionId, SessionRepository, Username};

/// インメモリ Session Repository 実装
#[derive(Default)]
pub struct InMemorySessionRepository {
    /// 接続中のセッション（参加順）
    sessions: Mutex<Vec<Session>>,
}

impl InMemorySessionRepository {
    /// 新しい InMemorySessionRepository を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn add(&self, session: Session) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.lock().await;

        if sessions.iter().any(|s| s.id == session.id) {
            return Err(RepositoryError::DuplicateSession(session.id.to_string()));
        }
        if sessions.iter().any(|s| s.username == session.username) {
            return Err(RepositoryError::NameTaken(session.username.into_string()));
        }

        tracing::debug!(
            "Session '{}' registered as '{}'",
            session.id,
            session.username
        );
        sessions.push(session);
        Ok(())
    }

    async fn remove(&self, id: &SessionId) -> Option<Session> {
        let mut sessions = self.sessions.lock().await;
        let position = sessions.iter().position(|s| &s.id == id)?;
        let removed = sessions.remove(position);
        tracing::debug!("Session '{}' ('{}') deregistered", id, removed.username);
        Some(removed)
    }

    async fn list(&self) -> Vec<Session> {
        let sessions = self.sessions.lock().await;
        sessions.clone()
    }

    async fn name_of(&self, id: &SessionId) -> Option<Username> {
        let sessions = self.sessions.lock().await;
        sessions
            .iter()
            .find(|s| &s.id == id)
            .map(|s| s.username.clone())
    }

    async fn is_name_taken(&self, name: &str) -> bool {
        let sessions = self.sessions.lock().await;
        sessions.iter().any(|s| s.username.as_str() == name)
    }

    async fn contains(&self, id: &SessionId) -> bool {
        let sessions = self.sessions.lock().await;
        sessions.iter().any(|s| &s.id == id)
    }
}
