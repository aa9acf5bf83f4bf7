//! Terminal client execution logic.

use std::sync::{Arc, Mutex};

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::{Notify, mpsc};

use crate::{
    connection::{ChatConnection, ChatEvents},
    error::ClientError,
    formatter::MessageFormatter,
    presence::Roster,
    ui::{PROMPT, print_line, redisplay_prompt},
};

const QUIT_COMMAND: &str = "/quit";

/// Prints incoming traffic and tracks presence
struct Terminal {
    roster: Mutex<Roster>,
    disconnected: Notify,
}

impl ChatEvents for Terminal {
    fn on_message_line(&self, line: String) {
        print_line(&line);
    }

    fn on_presence_change(&self, usernames: Vec<String>, joined: bool) {
        let line = match self.roster.lock() {
            Ok(mut roster) => {
                roster.apply(&usernames, joined);
                MessageFormatter::format_users(roster.users())
            }
            Err(e) => {
                tracing::error!("Roster lock poisoned: {}", e);
                return;
            }
        };
        print_line(&line);
    }

    fn on_disconnected(&self) {
        self.disconnected.notify_one();
    }
}

/// Connect as `username` and chat until `/quit`, end of input or disconnection
pub async fn run_client(host: String, port: u16, username: String) -> Result<(), ClientError> {
    let terminal = Arc::new(Terminal {
        roster: Mutex::new(Roster::new()),
        disconnected: Notify::new(),
    });
    let mut connection = ChatConnection::new(terminal.clone());

    connection.connect(&host, port).await?;
    connection.send_raw(&username).await?;
    println!(
        "\nYou are '{}'. Type messages and press Enter to send. Type {} to exit.\n",
        username, QUIT_COMMAND
    );

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line).ok();
                    if input_tx.send(line.to_string()).is_err() {
                        // Channel closed, exit thread
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    let result = loop {
        tokio::select! {
            line = input_rx.recv() => {
                let Some(line) = line else {
                    break Ok(());
                };
                if line.eq_ignore_ascii_case(QUIT_COMMAND) {
                    break Ok(());
                }
                if let Err(e) = connection.send_raw(&line).await {
                    break Err(e);
                }
                redisplay_prompt();
            }
            _ = terminal.disconnected.notified() => {
                println!("\nDisconnected from server.");
                break Ok(());
            }
        }
    };

    connection.close().await;
    result
}
