//! Helpers shared by the integration tests.
#![allow(dead_code, reason = "each test binary uses a subset of these helpers")]

use std::{num::NonZeroUsize, time::Duration};

use chatframe::{ChatClient, ClientConfig, ConnectionEvent, ConnectionState, Envelope, SessionContext};
use tokio::sync::{broadcast, mpsc};

/// Configuration with a tiny chunk size so fragmentation is visible.
#[must_use]
pub fn small_chunks(size: usize) -> ClientConfig {
    ClientConfig::default().with_max_chunk_size(NonZeroUsize::new(size).expect("non-zero chunk size"))
}

/// Client signed in as `alice` in room 1.
#[must_use]
pub fn signed_in(config: ClientConfig) -> ChatClient {
    let client = ChatClient::new(config);
    client
        .sign_in(SessionContext::for_user("alice", "1"))
        .expect("sign in while idle");
    client
}

/// Route delivered envelopes into a channel the test can await.
#[must_use]
pub fn collect_envelopes(client: &ChatClient) -> mpsc::UnboundedReceiver<Envelope> {
    let (tx, rx) = mpsc::unbounded_channel();
    client.on_envelope(move |envelope| {
        tx.send(envelope).ok();
    });
    rx
}

/// Wait until a state change into `target` is published.
pub async fn wait_for_state(events: &mut broadcast::Receiver<ConnectionEvent>, target: ConnectionState) {
    let wait = async {
        loop {
            match events.recv().await {
                Ok(ConnectionEvent::StateChanged { to, .. }) if to == target => return,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(60), wait)
        .await
        .unwrap_or_else(|_| panic!("connection never reached {target}"));
}

/// Await the next delivered envelope.
pub async fn next_envelope(rx: &mut mpsc::UnboundedReceiver<Envelope>) -> Envelope {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("envelope delivered in time")
        .expect("handler still registered")
}
