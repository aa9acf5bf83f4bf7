//! Chunkchat terminal client.
//!
//! Connects to a Chunkchat server under a username, sends each input line as
//! a chat message and prints what the server relays back.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin chunkchat-client -- --port 5000 --username alice
//! cargo run --bin chunkchat-client -- -H 127.0.0.1 -p 5000 -u bob
//! ```

use clap::Parser;

use chunkchat_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "chunkchat-client")]
#[command(about = "Terminal client for the Chunkchat relay server", long_about = None)]
struct Args {
    /// Server host address
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short = 'p', long)]
    port: u16,

    /// Username to join the chat with
    #[arg(short = 'u', long)]
    username: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let args = Args::parse();

    // Run the client
    if let Err(e) = chunkchat_client::run_client(args.host, args.port, args.username).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
