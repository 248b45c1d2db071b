//! Async task that owns the socket and feeds the connection manager.
//!
//! The driver polls the shutdown token, the outbound queue, the inbound
//! stream and the eviction sweep with a `tokio::select!` loop. The `biased`
//! keyword ensures shutdown is observed first and queued sends are written
//! before more input is read.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{CloseCause, CloseOutcome, ConnectionManager, Connector, Transport};
use crate::{
    client::{EnvelopeHandler, lock},
    envelope::Envelope,
};

/// Background task driving one logical connection through its reconnects.
///
/// Obtain one from [`ChatClient::open`](crate::client::ChatClient::open)
/// and either `.await` [`run`](Self::run) or [`spawn`](Self::spawn) it.
pub struct ConnectionDriver {
    manager: Arc<Mutex<ConnectionManager>>,
    handler: Arc<Mutex<Option<EnvelopeHandler>>>,
    connector: Arc<dyn Connector>,
    shutdown: CancellationToken,
    url: String,
    sweep_interval: Duration,
}

impl ConnectionDriver {
    pub(crate) fn new(
        manager: Arc<Mutex<ConnectionManager>>,
        handler: Arc<Mutex<Option<EnvelopeHandler>>>,
        connector: Arc<dyn Connector>,
        shutdown: CancellationToken,
    ) -> Self {
        let (url, sweep_interval) = {
            let guard = lock(&manager);
            (guard.config().url().to_owned(), guard.config().sweep_interval())
        };
        Self {
            manager,
            handler,
            connector,
            shutdown,
            url,
            sweep_interval,
        }
    }

    /// Run the driver on a new Tokio task.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> { tokio::spawn(self.run()) }

    /// Connect, pump frames and reconnect until the connection is closed
    /// explicitly.
    pub async fn run(self) {
        loop {
            let attempt = tokio::select! {
                biased;

                () = self.shutdown.cancelled() => break,
                attempt = self.connector.connect(&self.url) => attempt,
            };

            let cause = match attempt {
                Ok(transport) => self.drive(transport).await,
                Err(error) => {
                    warn!(url = %self.url, %error, "connect attempt failed");
                    CloseCause::Error(error.to_string())
                }
            };

            let outcome = lock(&self.manager).transport_closed(cause, &self.shutdown);
            let CloseOutcome::Reconnect { after } = outcome else {
                break;
            };
            debug!(delay = ?after, "scheduling reconnect");

            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => break,
                () = tokio::time::sleep(after) => {}
            }
            if !lock(&self.manager).begin_reconnect(&self.shutdown) {
                break;
            }
        }
        debug!("connection driver stopped");
    }

    async fn drive(&self, transport: Transport) -> CloseCause {
        let (mut sink, mut stream) = transport.into_parts();
        let (outbound, mut queued) = mpsc::unbounded_channel();
        if !lock(&self.manager).transport_opened(outbound, &self.shutdown) {
            sink.close().await.ok();
            return CloseCause::Requested;
        }

        let mut sweep = tokio::time::interval_at(
            tokio::time::Instant::now() + self.sweep_interval,
            self.sweep_interval,
        );
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => {
                    sink.close().await.ok();
                    return CloseCause::Requested;
                }

                Some(text) = queued.recv() => {
                    if let Err(error) = sink.send(text).await {
                        return CloseCause::Error(error.to_string());
                    }
                }

                frame = stream.next() => match frame {
                    Some(Ok(text)) => self.dispatch(&text),
                    Some(Err(error)) => return CloseCause::Error(error.to_string()),
                    None => return CloseCause::Peer,
                },

                _ = sweep.tick() => {
                    lock(&self.manager).sweep_expired(now());
                }
            }
        }
    }

    fn dispatch(&self, text: &str) {
        let delivered = lock(&self.manager).handle_inbound(text, now());
        if delivered.is_empty() {
            return;
        }
        deliver(&self.handler, delivered);
    }
}

/// Hand envelopes to the registered handler outside the manager lock, so the
/// handler may send replies.
fn deliver(handler: &Mutex<Option<EnvelopeHandler>>, envelopes: Vec<Envelope>) {
    let mut guard = lock(handler);
    let Some(handler) = guard.as_mut() else {
        debug!(count = envelopes.len(), "no envelope handler registered; dropping");
        return;
    };
    for envelope in envelopes {
        handler(envelope);
    }
}

fn now() -> std::time::Instant { tokio::time::Instant::now().into_std() }
