//! Terminal chat client built on `chatframe`.
//!
//! Prints delivered envelopes to stdout and turns stdin lines into messages.

mod cli;

use std::{num::NonZeroUsize, path::Path, time::Duration};

use base64::{Engine, engine::general_purpose::STANDARD};
use chatframe::{
    ChatClient,
    ClientConfig,
    ConnectionEvent,
    Envelope,
    EnvelopeKind,
    PayloadKind,
    SessionContext,
    WebSocketConnector,
};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    let client = ChatClient::new(config_from(&cli)?);
    client.sign_in(SessionContext::for_user(cli.user.as_str(), cli.room.as_str()))?;

    let renderer = client.clone();
    client.on_envelope(move |envelope| {
        let separator = envelope
            .timestamp()
            .is_some_and(|timestamp| renderer.mark_rendered(timestamp));
        if separator {
            println!("----");
        }
        println!("{}", render(&envelope));
    });

    let mut events = client.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let ConnectionEvent::StateChanged { to, .. } = event {
                eprintln!("* connection {to}");
            }
        }
    });

    let driver = client.open(WebSocketConnector)?.spawn();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Err(error) = handle_line(&client, &line).await {
            warn!(%error, "command failed");
            eprintln!("! {error}");
        }
        if line.trim() == "/quit" {
            break;
        }
    }

    client.close();
    driver.await?;
    info!("bye");
    Ok(())
}

fn config_from(cli: &cli::Cli) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let chunk_size = NonZeroUsize::new(usize::try_from(cli.chunk_size)?)
        .ok_or("chunk size must be at least 1")?;
    Ok(ClientConfig::default()
        .with_url(cli.url.as_str())
        .with_max_chunk_size(chunk_size)
        .with_reconnect_delay(Duration::from_secs(cli.reconnect_delay_secs)))
}

async fn handle_line(client: &ChatClient, line: &str) -> Result<(), Box<dyn std::error::Error>> {
    let line = line.trim();
    match line.split_once(' ').unwrap_or((line, "")) {
        ("/quit", _) => {}
        ("/users", _) => client.request_user_list()?,
        ("/image", path) => {
            let bytes = tokio::fs::read(path.trim()).await?;
            let data_url = format!(
                "data:{};base64,{}",
                mime_for(Path::new(path.trim())),
                STANDARD.encode(bytes)
            );
            let fragments = client.send_image(&data_url)?;
            info!(fragments, "image sent");
        }
        _ => client.send_text(line)?,
    }
    Ok(())
}

fn mime_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn render(envelope: &Envelope) -> String {
    let sender = envelope.sender().unwrap_or("server");
    match (envelope.kind(), envelope.payload()) {
        (EnvelopeKind::UserList, _) => {
            format!("online: {}", envelope.users().unwrap_or_default().join(", "))
        }
        (EnvelopeKind::UpdateRoomName, _) => {
            format!("room renamed to {}", envelope.new_name().unwrap_or_default())
        }
        (_, Some(payload)) if payload.kind() == PayloadKind::Text => {
            format!("[{sender}] {}", payload.body())
        }
        (_, Some(payload)) => {
            format!("[{sender}] <{}, {} chars>", payload.kind(), payload.body().len())
        }
        (kind, None) => format!("[{sender}] <{kind}>"),
    }
}
