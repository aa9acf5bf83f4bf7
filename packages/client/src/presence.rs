//! Who is in the chat, as seen from this client.

/// Presence roster maintained from JOIN / LEAVE events
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Roster {
    users: Vec<String>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `usernames` when `joined`, otherwise remove them (unknown names are ignored)
    pub fn apply(&mut self, usernames: &[String], joined: bool) {
        if joined {
            self.users.extend(usernames.iter().cloned());
        } else {
            for username in usernames {
                if let Some(pos) = self.users.iter().position(|u| u == username) {
                    self.users.remove(pos);
                }
            }
        }
    }

    pub fn users(&self) -> &[String] {
        &self.users
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_join_extends_roster() {
        // テスト項目: 参加したユーザーが参加順に追加される
        // given (前提条件):
        let mut roster = Roster::new();

        // when (操作):
        roster.apply(&names(&["alice", "bob"]), true);
        roster.apply(&names(&["carol"]), true);

        // then (期待する結果):
        assert_eq!(roster.users(), names(&["alice", "bob", "carol"]).as_slice());
    }

    #[test]
    fn test_leave_removes_named_users() {
        // テスト項目: 退出したユーザーだけが取り除かれ、知らない名前は無視される
        // given (前提条件):
        let mut roster = Roster::new();
        roster.apply(&names(&["alice", "bob", "carol"]), true);

        // when (操作):
        roster.apply(&names(&["bob", "mallory"]), false);

        // then (期待する結果):
        assert_eq!(roster.users(), names(&["alice", "carol"]).as_slice());
    }
}
