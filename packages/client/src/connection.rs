//! Connection to a chat server.
//!
//! Outgoing traffic is raw `\n`-terminated lines; incoming traffic is framed
//! envelopes, decoded by a background receive task that reports through
//! [`ChatEvents`].

use std::sync::Arc;

use chunkchat_shared::protocol::{FrameCodec, FrameReader};
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    task::JoinHandle,
};

use crate::{error::ClientError, formatter::MessageFormatter};

/// Callbacks invoked by the receive task
pub trait ChatEvents: Send + Sync + 'static {
    /// A displayable line derived from an incoming envelope
    fn on_message_line(&self, line: String);

    /// Users joined (`joined == true`) or left
    fn on_presence_change(&self, usernames: Vec<String>, joined: bool);

    /// The server closed the connection or the stream became unreadable
    fn on_disconnected(&self) {}
}

pub struct ChatConnection {
    events: Arc<dyn ChatEvents>,
    codec: FrameCodec,
    writer: Option<OwnedWriteHalf>,
    receiver: Option<JoinHandle<()>>,
}

impl ChatConnection {
    pub fn new(events: Arc<dyn ChatEvents>) -> Self {
        Self::with_codec(events, FrameCodec::default())
    }

    /// Use a non-default chunk size; it must match the server's
    pub fn with_codec(events: Arc<dyn ChatEvents>, codec: FrameCodec) -> Self {
        Self {
            events,
            codec,
            writer: None,
            receiver: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.writer.is_some()
    }

    /// Open the connection and start the receive task
    pub async fn connect(&mut self, host: &str, port: u16) -> Result<(), ClientError> {
        if self.is_connected() {
            return Err(ClientError::AlreadyConnected);
        }

        let stream = TcpStream::connect((host, port)).await?;
        let (read_half, write_half) = stream.into_split();
        tracing::info!("Connected to {}:{}", host, port);

        self.receiver = Some(tokio::spawn(receive_loop(
            read_half,
            self.codec,
            Arc::clone(&self.events),
        )));
        self.writer = Some(write_half);
        Ok(())
    }

    /// Send one raw line (the first one is the username)
    pub async fn send_raw(&mut self, text: &str) -> Result<(), ClientError> {
        let writer = self.writer.as_mut().ok_or(ClientError::NotConnected)?;
        writer.write_all(format!("{}\n", text).as_bytes()).await?;
        Ok(())
    }

    /// Shut down the write side and stop receiving
    pub async fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                tracing::debug!("Failed to shut down connection: {}", e);
            }
        }
        if let Some(receiver) = self.receiver.take() {
            receiver.abort();
        }
    }
}

impl Drop for ChatConnection {
    fn drop(&mut self) {
        if let Some(receiver) = self.receiver.take() {
            receiver.abort();
        }
    }
}

async fn receive_loop(read_half: OwnedReadHalf, codec: FrameCodec, events: Arc<dyn ChatEvents>) {
    let mut reader = FrameReader::new(BufReader::new(read_half), codec);

    loop {
        match reader.next_envelope().await {
            Ok(Some(envelope)) => {
                events.on_message_line(MessageFormatter::format(&envelope));
                if let Some((usernames, joined)) = MessageFormatter::presence_change(&envelope) {
                    events.on_presence_change(usernames, joined);
                }
            }
            Ok(None) => {
                tracing::info!("Server closed the connection");
                break;
            }
            Err(e) => {
                tracing::warn!("Failed to receive message: {}", e);
                break;
            }
        }
    }

    events.on_disconnected();
}
