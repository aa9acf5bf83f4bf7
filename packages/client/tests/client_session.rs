//! The client against a real server on a loopback port.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chunkchat_client::{ChatConnection, ChatEvents, presence::Roster};
use chunkchat_server::{Server, ServerConfig, ServerHandle};
use tokio::{sync::mpsc, time::timeout};

const STEP: Duration = Duration::from_secs(3);

#[derive(Debug, PartialEq, Eq)]
enum Event {
    Line(String),
    Presence(Vec<String>, bool),
    Disconnected,
}

struct Recorder {
    events: mpsc::UnboundedSender<Event>,
    roster: Mutex<Roster>,
}

impl ChatEvents for Recorder {
    fn on_message_line(&self, line: String) {
        let _ = self.events.send(Event::Line(line));
    }

    fn on_presence_change(&self, usernames: Vec<String>, joined: bool) {
        self.roster.lock().unwrap().apply(&usernames, joined);
        let _ = self.events.send(Event::Presence(usernames, joined));
    }

    fn on_disconnected(&self) {
        let _ = self.events.send(Event::Disconnected);
    }
}

struct TestClient {
    connection: ChatConnection,
    recorder: Arc<Recorder>,
    events: mpsc::UnboundedReceiver<Event>,
}

impl TestClient {
    async fn join(port: u16, username: &str) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let recorder = Arc::new(Recorder {
            events: tx,
            roster: Mutex::new(Roster::new()),
        });
        let mut connection = ChatConnection::new(recorder.clone());
        connection.connect("127.0.0.1", port).await.unwrap();
        connection.send_raw(username).await.unwrap();
        Self {
            connection,
            recorder,
            events,
        }
    }

    async fn expect(&mut self, expected: Event) {
        let event = timeout(STEP, self.events.recv())
            .await
            .expect("no event arrived in time");
        assert_eq!(event, Some(expected));
    }

    fn users(&self) -> Vec<String> {
        self.recorder.roster.lock().unwrap().users().to_vec()
    }
}

async fn start_server() -> (u16, ServerHandle) {
    let mut server = Server::new(ServerConfig {
        frame_pacing: Duration::from_millis(1),
        ..Default::default()
    })
    .unwrap();
    let port = server.bind().await.unwrap().port();
    let handle = server.handle();
    tokio::spawn(server.serve());
    (port, handle)
}

async fn wait_for_user(handle: &ServerHandle, name: &str) {
    timeout(STEP, async {
        while !handle.usernames().await.iter().any(|u| u == name) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("user never registered");
}

#[tokio::test]
async fn test_alice_sees_bob_join_chat_and_leave() {
    // テスト項目: alice は bob の参加・発言・退出を表示行と在室者一覧で受け取る
    // given (前提条件):
    let (port, handle) = start_server().await;
    let mut alice = TestClient::join(port, "alice").await;
    wait_for_user(&handle, "alice").await;

    // when (操作): bob が参加する
    let mut bob = TestClient::join(port, "bob").await;

    // then (期待する結果):
    alice
        .expect(Event::Line("bob has joined the chat.".to_string()))
        .await;
    alice
        .expect(Event::Presence(vec!["bob".to_string()], true))
        .await;
    bob.expect(Event::Line("alice are in the chat.".to_string()))
        .await;
    bob.expect(Event::Presence(vec!["alice".to_string()], true))
        .await;
    assert_eq!(alice.users(), vec!["bob".to_string()]);

    // when (操作): bob が発言する
    bob.connection.send_raw("hi").await.unwrap();

    // then (期待する結果):
    alice.expect(Event::Line("bob: hi".to_string())).await;

    // when (操作): bob が退出する
    bob.connection.close().await;

    // then (期待する結果):
    alice
        .expect(Event::Line("bob has left the chat.".to_string()))
        .await;
    alice
        .expect(Event::Presence(vec!["bob".to_string()], false))
        .await;
    assert!(alice.users().is_empty());

    handle.stop().await;
}

#[tokio::test]
async fn test_rejected_username_is_shown_then_disconnected() {
    // テスト項目: 不正なユーザー名はサーバーの説明が表示され、その後切断が通知される
    // given (前提条件):
    let (port, handle) = start_server().await;

    // when (操作):
    let mut client = TestClient::join(port, "bob!").await;

    // then (期待する結果):
    client
        .expect(Event::Line(
            "SERVER: \"bob!\" has invalid characters. The following char is invalid \"!\""
                .to_string(),
        ))
        .await;
    client.expect(Event::Disconnected).await;

    handle.stop().await;
}

#[tokio::test]
async fn test_server_stop_disconnects_client() {
    // テスト項目: サーバーが停止するとクライアントに切断が通知される
    // given (前提条件):
    let (port, handle) = start_server().await;
    let mut alice = TestClient::join(port, "alice").await;
    wait_for_user(&handle, "alice").await;

    // when (操作):
    handle.stop().await;

    // then (期待する結果):
    alice.expect(Event::Disconnected).await;
}
