//! The seam between the connection manager and a concrete socket.
//!
//! A [`Connector`] opens a [`Transport`]: a sink accepting outbound text
//! frames and a stream yielding inbound ones. The WebSocket implementation
//! lives in [`websocket`](super::websocket); tests substitute an in-memory
//! pair.

use std::{io, pin::Pin};

use async_trait::async_trait;
use futures::{Sink, Stream};
use thiserror::Error;

/// Errors raised by a transport or while opening one.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The WebSocket layer failed.
    #[error("websocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),
    /// A socket-level failure, including refused connections.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// The transport was already closed.
    #[error("transport closed")]
    Closed,
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self { Self::WebSocket(Box::new(error)) }
}

/// Outbound half of a transport.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = TransportError> + Send>>;

/// Inbound half of a transport.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// An open, ordered, text-frame transport.
pub struct Transport {
    sink: FrameSink,
    stream: FrameStream,
}

impl Transport {
    /// Wrap a sink and stream pair.
    pub fn new<Si, St>(sink: Si, stream: St) -> Self
    where
        Si: Sink<String, Error = TransportError> + Send + 'static,
        St: Stream<Item = Result<String, TransportError>> + Send + 'static,
    {
        Self {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        }
    }

    /// Split into the outbound and inbound halves.
    #[must_use]
    pub fn into_parts(self) -> (FrameSink, FrameStream) { (self.sink, self.stream) }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

/// Opens transports to a chat server.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a transport to `url`.
    async fn connect(&self, url: &str) -> Result<Transport, TransportError>;
}
