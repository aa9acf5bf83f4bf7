//! Server configuration.

use std::time::Duration;

use chunkchat_shared::{
    error::ProtocolError,
    protocol::{DEFAULT_CHUNK_SIZE, FrameCodec},
};

use crate::domain::{DEFAULT_MAX_USERNAME_LEN, UsernamePolicy};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_SERVER_NAME: &str = "SERVER";
pub const DEFAULT_FRAME_PACING: Duration = Duration::from_millis(10);
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Everything the server needs to know before it binds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    /// `0` binds an ephemeral port
    pub port: u16,
    /// Identity used as the sender of explanatory messages; also reserved
    pub server_name: String,
    pub max_username_len: usize,
    pub chunk_size: usize,
    /// Delay between successive frames of one message
    pub frame_pacing: Duration,
    /// How long a new connection may take to send its username
    pub handshake_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: 0,
            server_name: DEFAULT_SERVER_NAME.to_string(),
            max_username_len: DEFAULT_MAX_USERNAME_LEN,
            chunk_size: DEFAULT_CHUNK_SIZE,
            frame_pacing: DEFAULT_FRAME_PACING,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn username_policy(&self) -> UsernamePolicy {
        UsernamePolicy::new(&self.server_name, self.max_username_len)
    }

    pub fn frame_codec(&self) -> Result<FrameCodec, ProtocolError> {
        FrameCodec::new(self.chunk_size)
    }
}
