//! In-memory [`Connector`] and the server side that tests script.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chatframe::connection::{Connector, Transport, TransportError};
use futures::{SinkExt, StreamExt, channel::mpsc as futures_mpsc};
use serde_json::Value;
use tokio::sync::mpsc;

#[derive(Default)]
struct Counters {
    attempts: AtomicUsize,
    refusals: AtomicUsize,
}

/// Create a connected connector/server pair.
#[must_use]
pub fn memory_transport() -> (MemoryConnector, MemoryServer) {
    let (accepted, incoming) = mpsc::unbounded_channel();
    let counters = Arc::new(Counters::default());
    (
        MemoryConnector {
            accepted,
            counters: Arc::clone(&counters),
        },
        MemoryServer { incoming, counters },
    )
}

/// Client half: hands each dialled connection to the paired [`MemoryServer`].
pub struct MemoryConnector {
    accepted: mpsc::UnboundedSender<PeerConnection>,
    counters: Arc<Counters>,
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, _url: &str) -> Result<Transport, TransportError> {
        self.counters.attempts.fetch_add(1, Ordering::SeqCst);
        let refused = self
            .counters
            .refusals
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if refused {
            return Err(refused_error());
        }

        let (client_tx, server_rx) = futures_mpsc::unbounded::<String>();
        let (server_tx, client_rx) = futures_mpsc::unbounded::<Result<String, TransportError>>();
        self.accepted
            .send(PeerConnection {
                to_client: server_tx,
                from_client: server_rx,
            })
            .map_err(|_| refused_error())?;

        let sink = client_tx.sink_map_err(|_| TransportError::Closed);
        Ok(Transport::new(sink, client_rx))
    }
}

fn refused_error() -> TransportError {
    TransportError::Io(io::Error::new(
        io::ErrorKind::ConnectionRefused,
        "memory server refused the connection",
    ))
}

/// Server half: accepts connections dialled through the paired connector.
pub struct MemoryServer {
    incoming: mpsc::UnboundedReceiver<PeerConnection>,
    counters: Arc<Counters>,
}

impl MemoryServer {
    /// Wait for the next connection.
    pub async fn accept(&mut self) -> Option<PeerConnection> { self.incoming.recv().await }

    /// Refuse the next `count` connection attempts.
    pub fn refuse_next(&self, count: usize) { self.counters.refusals.store(count, Ordering::SeqCst); }

    /// Number of connection attempts so far, refused ones included.
    #[must_use]
    pub fn attempts(&self) -> usize { self.counters.attempts.load(Ordering::SeqCst) }
}

/// The server's view of one accepted connection.
pub struct PeerConnection {
    to_client: futures_mpsc::UnboundedSender<Result<String, TransportError>>,
    from_client: futures_mpsc::UnboundedReceiver<String>,
}

impl PeerConnection {
    /// Deliver a text frame to the client. Returns `false` if the client
    /// has gone away.
    pub fn send(&self, text: impl Into<String>) -> bool {
        self.to_client.unbounded_send(Ok(text.into())).is_ok()
    }

    /// Deliver a JSON value as one text frame.
    pub fn send_json(&self, value: &Value) -> bool { self.send(value.to_string()) }

    /// Next frame the client wrote, or `None` once the client closed.
    pub async fn recv(&mut self) -> Option<String> { self.from_client.next().await }

    /// Next frame the client wrote, parsed as JSON.
    pub async fn recv_json(&mut self) -> Option<Value> {
        let text = self.recv().await?;
        serde_json::from_str(&text).ok()
    }

    /// Frames already written by the client, without waiting.
    pub fn drain(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(Some(text)) = self.from_client.try_next() {
            frames.push(text);
        }
        frames
    }

    /// Close the connection from the server side.
    pub fn close(self) {}

    /// Fail the connection with a transport error.
    pub fn fail(self, error: TransportError) {
        self.to_client.unbounded_send(Err(error)).ok();
    }
}
