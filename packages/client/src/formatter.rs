//! Message formatting utilities for client display.

use chunkchat_shared::protocol::Envelope;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// The line shown for an incoming envelope
    ///
    /// # Examples
    ///
    /// ```
    /// use chunkchat_client::formatter::MessageFormatter;
    /// use chunkchat_shared::protocol::Envelope;
    ///
    /// let line = MessageFormatter::format(&Envelope::send("bob", "hi"));
    /// assert_eq!(line, "bob: hi");
    /// ```
    pub fn format(envelope: &Envelope) -> String {
        match envelope {
            Envelope::Send { sender, content } => format!("{}: {}", sender, content),
            Envelope::Join { username } => format!("{} has joined the chat.", username),
            Envelope::Leave { username } => format!("{} has left the chat.", username),
            Envelope::BatchJoin { usernames } => {
                format!("{} are in the chat.", usernames.join(", "))
            }
            Envelope::BatchLeave { usernames } => {
                format!("{} have left the chat.", usernames.join(", "))
            }
        }
    }

    /// Presence change carried by an envelope: the affected names and whether they joined
    pub fn presence_change(envelope: &Envelope) -> Option<(Vec<String>, bool)> {
        match envelope {
            Envelope::Send { .. } => None,
            Envelope::Join { username } => Some((vec![username.clone()], true)),
            Envelope::Leave { username } => Some((vec![username.clone()], false)),
            Envelope::BatchJoin { usernames } => Some((usernames.clone(), true)),
            Envelope::BatchLeave { usernames } => Some((usernames.clone(), false)),
        }
    }

    /// Format the roster line printed after presence changes
    pub fn format_users(users: &[String]) -> String {
        if users.is_empty() {
            "(No one else is here)".to_string()
        } else {
            format!("In the chat: {}", users.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_chat_message() {
        // テスト項目: SEND は「送信者: 本文」の形で表示される
        // given (前提条件):
        let envelope = Envelope::send("bob", "hi");

        // when (操作):
        let result = MessageFormatter::format(&envelope);

        // then (期待する結果):
        assert_eq!(result, "bob: hi");
    }

    #[test]
    fn test_format_presence_events() {
        // テスト項目: 参加・退出イベントがそれぞれの文面で表示される
        // given (前提条件):
        let cases = vec![
            (Envelope::join("carol"), "carol has joined the chat."),
            (Envelope::leave("carol"), "carol has left the chat."),
            (
                Envelope::BatchJoin {
                    usernames: vec!["alice".into(), "bob".into()],
                },
                "alice, bob are in the chat.",
            ),
            (
                Envelope::BatchLeave {
                    usernames: vec!["alice".into(), "bob".into()],
                },
                "alice, bob have left the chat.",
            ),
        ];

        for (envelope, expected) in cases {
            // when (操作):
            let result = MessageFormatter::format(&envelope);

            // then (期待する結果):
            assert_eq!(result, expected);
        }
    }

    #[test]
    fn test_presence_change() {
        // テスト項目: JOIN 系は joined = true、LEAVE 系は joined = false、SEND は変化なし
        // given (前提条件):
        let batch_leave = Envelope::BatchLeave {
            usernames: vec!["alice".into(), "bob".into()],
        };

        // when (操作) / then (期待する結果):
        assert_eq!(
            MessageFormatter::presence_change(&Envelope::join("carol")),
            Some((vec!["carol".to_string()], true))
        );
        assert_eq!(
            MessageFormatter::presence_change(&batch_leave),
            Some((vec!["alice".to_string(), "bob".to_string()], false))
        );
        assert_eq!(
            MessageFormatter::presence_change(&Envelope::send("bob", "hi")),
            None
        );
    }

    #[test]
    fn test_format_users() {
        // テスト項目: 在室者一覧が表示用に整形される
        // given (前提条件):
        let users = vec!["alice".to_string(), "bob".to_string()];

        // when (操作):
        let result = MessageFormatter::format_users(&users);

        // then (期待する結果):
        assert_eq!(result, "In the chat: alice, bob");
        assert_eq!(MessageFormatter::format_users(&[]), "(No one else is here)");
    }
}
