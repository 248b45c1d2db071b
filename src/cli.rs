//! Command line interface for the `chatframe` terminal client.
//!
//! Kept free of crate imports so the build script can include it to render
//! the man page.

use clap::Parser;

/// Command line arguments for the `chatframe` binary.
#[derive(Debug, Parser)]
#[command(
    name = "chatframe",
    version,
    about = "Terminal chat client",
    long_about = "Connects to a chat server over WebSocket, prints incoming messages and sends \
                  each line typed on stdin. `/users` lists online users, `/image PATH` sends \
                  an image, `/quit` leaves."
)]
pub struct Cli {
    /// WebSocket endpoint of the chat server.
    #[arg(long, default_value = "ws://127.0.0.1:18080/ws")]
    pub url: String,
    /// Name to announce to the server.
    #[arg(short, long)]
    pub user: String,
    /// Room to join.
    #[arg(short, long, default_value = "1")]
    pub room: String,
    /// Largest fragment, in characters, for images and audio.
    #[arg(long, default_value_t = 50_000, value_parser = clap::value_parser!(u64).range(1..))]
    pub chunk_size: u64,
    /// Seconds to wait before reconnecting after the server goes away.
    #[arg(long, default_value_t = 5)]
    pub reconnect_delay_secs: u64,
}
