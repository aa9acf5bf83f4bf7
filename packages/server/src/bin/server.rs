//! Chunkchat relay server.
//!
//! Receives chat lines from clients and relays them to every other connected
//! client as chunked, framed envelopes.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin chunkchat-server
//! cargo run --bin chunkchat-server -- --host 0.0.0.0 --port 5000
//! ```

use std::time::Duration;

use chunkchat_server::{Server, ServerConfig, config, domain::DEFAULT_MAX_USERNAME_LEN, ui::shutdown_signal};
use chunkchat_shared::{logger::setup_logger, protocol::DEFAULT_CHUNK_SIZE};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "chunkchat-server")]
#[command(about = "Multi-user chat relay over chunked TCP frames", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = config::DEFAULT_HOST)]
    host: String,

    /// Port number to bind the server to (0 picks a free port)
    #[arg(short = 'p', long, default_value_t = 0)]
    port: u16,

    /// Name used as the sender of server messages; nobody may take it
    #[arg(short = 'n', long = "name", default_value = config::DEFAULT_SERVER_NAME)]
    server_name: String,

    /// Maximum username length, in characters
    #[arg(long, default_value_t = DEFAULT_MAX_USERNAME_LEN)]
    max_username_len: usize,

    /// Payload bytes per frame
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Delay between frames of one message, in milliseconds
    #[arg(long, default_value_t = 10)]
    pacing_ms: u64,

    /// How long a new connection may take to send its username, in milliseconds
    #[arg(long, default_value_t = 1000)]
    handshake_timeout_ms: u64,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            server_name: args.server_name,
            max_username_len: args.max_username_len,
            chunk_size: args.chunk_size,
            frame_pacing: Duration::from_millis(args.pacing_ms),
            handshake_timeout: Duration::from_millis(args.handshake_timeout_ms),
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let config = ServerConfig::from(Args::parse());

    let mut server = match Server::new(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Server error: {}", e);
            std::process::exit(1);
        }
    };

    match server.bind().await {
        Ok(addr) => {
            println!("Listening on {}", addr);
            tracing::info!("Press Ctrl+C to shutdown gracefully");
        }
        Err(e) => {
            tracing::error!("Server error: {}", e);
            std::process::exit(1);
        }
    }

    // Set up graceful shutdown signal handler
    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        handle.stop().await;
    });

    if let Err(e) = server.serve().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
