//! [`Connector`] backed by `tokio-tungstenite`.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt, future};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::debug;

use super::{Connector, Transport, TransportError};

/// Opens plain `ws://` connections.
///
/// Only text frames are surfaced; pings are answered by the WebSocket layer
/// and binary frames are ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<Transport, TransportError> {
        let (socket, response) = connect_async(url).await?;
        debug!(url, status = %response.status(), "websocket handshake complete");

        let (sink, stream) = socket.split();
        let sink = sink
            .sink_map_err(TransportError::from)
            .with(|text: String| future::ready(Ok::<_, TransportError>(Message::text(text))));
        let stream = stream.filter_map(|frame| {
            future::ready(match frame {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(_) => None,
                Err(error) => Some(Err(TransportError::from(error))),
            })
        });
        Ok(Transport::new(sink, stream))
    }
}
