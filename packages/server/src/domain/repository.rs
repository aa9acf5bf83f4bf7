//! Repository trait 定義
//!
//! ドメイン層が必要とするセッションレジストリのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    entity::Session,
    error::RepositoryError,
    value_object::{SessionId, Username},
};

/// Session Repository trait
///
/// The authoritative set of live sessions. Every operation is atomic with
/// respect to every other; callers never see the underlying map or lock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Register a session; refuses a name already held by a live session
    async fn add(&self, session: Session) -> Result<(), RepositoryError>;

    /// Deregister a session, returning it if it was present
    async fn remove(&self, id: &SessionId) -> Option<Session>;

    /// Point-in-time copy of the live sessions, in join order
    async fn list(&self) -> Vec<Session>;

    async fn name_of(&self, id: &SessionId) -> Option<Username>;

    async fn is_name_taken(&self, name: &str) -> bool;

    async fn contains(&self, id: &SessionId) -> bool;
}
