//! Synchronous core of the connection: state machine, send path and
//! inbound dispatch.
//!
//! [`ConnectionManager`] never touches a socket. The
//! [`ConnectionDriver`](super::ConnectionDriver) feeds it transport signals
//! (`transport_opened`, `handle_inbound`, `transport_closed`) and forwards
//! what it queues on the outbound channel. Keeping the core synchronous lets
//! every transition be exercised without a runtime and makes each state
//! change atomic with respect to concurrent senders.

use std::time::Instant;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{CloseCause, CloseOutcome, ConnectionEvent, ConnectionState, TransportError};
use crate::{
    collab::LoginGrant,
    config::ClientConfig,
    envelope::{Envelope, Payload, PayloadKind, decode_frame, encode},
    error::{ClientError, Result},
    fragment::{
        DiscardReason,
        DiscardedTransfer,
        FragmentKey,
        Fragmenter,
        Reassembler,
        ReassemblyError,
    },
    metrics::{self, Direction},
    session::{SessionContext, UserId},
};

/// Owner of the connection state, the session and the reassembly buffer.
#[derive(Debug)]
pub struct ConnectionManager {
    config: ClientConfig,
    session: SessionContext,
    state: ConnectionState,
    terminal: bool,
    outbound: Option<mpsc::UnboundedSender<String>>,
    fragmenter: Fragmenter,
    reassembler: Reassembler,
    events: broadcast::Sender<ConnectionEvent>,
    shutdown: CancellationToken,
}

impl ConnectionManager {
    /// Create a manager with an empty session.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self { Self::with_session(config, SessionContext::new()) }

    /// Create a manager for an existing session.
    #[must_use]
    pub fn with_session(config: ClientConfig, session: SessionContext) -> Self {
        let config = config.normalized();
        let (events, _) = broadcast::channel(config.event_capacity());
        Self {
            fragmenter: Fragmenter::new(config.max_chunk_size()),
            reassembler: Reassembler::new(config.reassembly_timeout(), config.max_fragments()),
            config,
            session,
            state: ConnectionState::Disconnected,
            terminal: false,
            outbound: None,
            events,
            shutdown: CancellationToken::new(),
        }
    }

    /// Current connection state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState { self.state }

    /// Whether the connection was closed explicitly and will not reconnect.
    #[must_use]
    pub const fn is_terminal(&self) -> bool { self.terminal }

    /// Read-only view of the session.
    #[must_use]
    pub fn session(&self) -> &SessionContext { &self.session }

    /// Effective configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig { &self.config }

    /// Number of incomplete transfers currently buffered.
    #[must_use]
    pub fn pending_transfers(&self) -> usize { self.reassembler.buffered_len() }

    /// Subscribe to state changes and reassembly notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> { self.events.subscribe() }

    /// Replace the session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::SessionInUse`] unless the connection is idle
    /// (never opened, or closed explicitly).
    pub fn sign_in(&mut self, session: SessionContext) -> Result<()> {
        self.ensure_idle()?;
        self.session = session;
        Ok(())
    }

    /// Populate the session from a login grant.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::SessionInUse`] unless the connection is idle.
    pub fn apply_grant(&mut self, grant: LoginGrant) -> Result<()> {
        self.ensure_idle()?;
        self.session.apply_grant(grant);
        Ok(())
    }

    /// Record the display name of the current room.
    pub fn set_room_name(&mut self, name: impl Into<String>) { self.session.set_room_name(name); }

    /// Record a rendered timestamp; see [`SessionContext::mark_rendered`].
    pub fn mark_rendered(&mut self, timestamp: i64) -> bool { self.session.mark_rendered(timestamp) }

    /// Move from an idle state to `Connecting`.
    ///
    /// Returns the token the driver watches for shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::SessionInUse`] if a connection is already live
    /// or pending, and [`ClientError::NotAuthenticated`] without a user.
    pub fn request_open(&mut self) -> Result<CancellationToken> {
        self.ensure_idle()?;
        if !self.session.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }
        if self.shutdown.is_cancelled() {
            self.shutdown = CancellationToken::new();
        }
        self.terminal = false;
        self.set_state(ConnectionState::Connecting);
        Ok(self.shutdown.clone())
    }

    /// Handle the transport's successful-open signal.
    ///
    /// Moves `Connecting → Open` and queues exactly one `connect` envelope
    /// for the current user and room. Returns `false`, leaving the state
    /// untouched, when no open is pending or when `session` is the token of
    /// a connection that has since been closed explicitly (for example a
    /// close that raced the handshake).
    pub fn transport_opened(
        &mut self,
        outbound: mpsc::UnboundedSender<String>,
        session: &CancellationToken,
    ) -> bool {
        if session.is_cancelled() || self.state != ConnectionState::Connecting {
            debug!(state = %self.state, "ignoring transport open");
            return false;
        }
        self.outbound = Some(outbound);
        self.set_state(ConnectionState::Open);

        let Some(user) = self.session.user() else {
            warn!("connection opened without a signed-in user; presence not announced");
            return true;
        };
        let announce = Envelope::connect(user.as_str(), Some(self.session.room().to_string()));
        if let Err(error) = self.send(&announce) {
            warn!(%error, "failed to announce presence");
        }
        true
    }

    /// Decode one inbound frame and return the envelopes ready for delivery.
    ///
    /// Expired transfers are evicted first. Fragments go through the
    /// reassembly buffer and surface only once their set completes; other
    /// envelopes are returned as-is. Undecodable frames are dropped, logged
    /// and reported as [`ConnectionEvent::DecodeFailed`].
    pub fn handle_inbound(&mut self, text: &str, now: Instant) -> Vec<Envelope> {
        self.sweep_expired(now);

        let envelopes = match decode_frame(text) {
            Ok(envelopes) => envelopes,
            Err(error) => {
                warn!(%error, "dropping undecodable frame");
                metrics::inc_decode_errors();
                self.emit(ConnectionEvent::DecodeFailed {
                    reason: error.to_string(),
                });
                return Vec::new();
            }
        };

        envelopes
            .into_iter()
            .filter_map(|envelope| self.accept(envelope, now))
            .collect()
    }

    fn accept(&mut self, mut envelope: Envelope, now: Instant) -> Option<Envelope> {
        metrics::inc_envelopes(Direction::Inbound);
        if !envelope.is_fragment() {
            debug!(kind = %envelope.kind(), sender = envelope.sender(), "received envelope");
            return Some(envelope);
        }

        let Some(key) = FragmentKey::for_envelope(&envelope) else {
            self.reject(ReassemblyError::UnchunkableKind {
                kind: envelope.kind(),
            });
            return None;
        };
        let (header, body) = envelope.take_fragment()?;
        debug!(%key, index = %header.index(), total = header.total(), "received fragment");

        match self.reassembler.push_at(key, header, body, now) {
            Ok(outcome) => {
                if let Some(violation) = outcome.violation {
                    warn!(
                        key = %violation.stale.key,
                        stale_total = violation.stale.total,
                        announced_total = violation.announced_total,
                        "fragment total changed mid-transfer; restarting set"
                    );
                    metrics::add_discarded_transfers(1);
                    self.emit(ConnectionEvent::ProtocolViolation(violation));
                }
                outcome.completed.map(|payload| {
                    debug!(key = %payload.key(), len = payload.body().len(), "transfer complete");
                    envelope.into_reassembled(payload.into_body())
                })
            }
            Err(error) => {
                self.reject(error);
                None
            }
        }
    }

    fn reject(&self, error: ReassemblyError) {
        warn!(%error, "rejecting fragment");
        self.emit(ConnectionEvent::FragmentRejected(error));
    }

    /// Evict transfers idle beyond the reassembly timeout.
    ///
    /// Returns how many were discarded.
    pub fn sweep_expired(&mut self, now: Instant) -> usize {
        let discarded = self.reassembler.purge_expired_at(now);
        self.report_discarded(discarded)
    }

    fn report_discarded(&self, discarded: Vec<DiscardedTransfer>) -> usize {
        let count = discarded.len();
        for transfer in discarded {
            warn!(
                key = %transfer.key,
                received = transfer.received,
                total = transfer.total,
                reason = ?transfer.reason,
                "discarding incomplete transfer"
            );
            self.emit(ConnectionEvent::TransferDiscarded(transfer));
        }
        metrics::add_discarded_transfers(count);
        count
    }

    /// Handle the transport's close or error signal, or a failed open.
    ///
    /// Incomplete transfers are discarded. An explicit close stays terminal;
    /// any other close moves to `Closed` and asks the driver to reconnect
    /// after the configured delay.
    ///
    /// A signal from a driver whose `session` was closed explicitly is
    /// ignored: [`close`](Self::close) already tore that connection down, and
    /// the manager may since have started a new one.
    pub fn transport_closed(
        &mut self,
        cause: CloseCause,
        session: &CancellationToken,
    ) -> CloseOutcome {
        if session.is_cancelled() {
            debug!(?cause, "ignoring close of an explicitly closed connection");
            return CloseOutcome::Terminal;
        }
        self.outbound = None;
        let discarded = self.reassembler.discard_all(DiscardReason::ConnectionClosed);
        self.report_discarded(discarded);

        if cause == CloseCause::Requested {
            self.terminal = true;
        }
        match &cause {
            CloseCause::Error(error) => warn!(%error, state = %self.state, "transport failed"),
            CloseCause::Peer => info!(state = %self.state, "server closed the connection"),
            CloseCause::Requested => debug!("transport closed on request"),
        }
        self.set_state(ConnectionState::Closed);

        if self.terminal {
            CloseOutcome::Terminal
        } else {
            CloseOutcome::Reconnect {
                after: self.config.reconnect_delay(),
            }
        }
    }

    /// Move `Closed → Connecting` once the reconnect delay has elapsed.
    ///
    /// Returns `false` if `session` was closed explicitly meanwhile.
    pub fn begin_reconnect(&mut self, session: &CancellationToken) -> bool {
        if session.is_cancelled() || self.state != ConnectionState::Closed || self.terminal {
            return false;
        }
        metrics::inc_reconnects();
        self.set_state(ConnectionState::Connecting);
        true
    }

    /// Close explicitly (logout or navigation away).
    ///
    /// The connection stays `Closed` with no reconnect, open transfers are
    /// discarded and the session is cleared. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.terminal && self.state == ConnectionState::Closed {
            return;
        }
        self.terminal = true;
        self.shutdown.cancel();
        self.outbound = None;
        let discarded = self.reassembler.discard_all(DiscardReason::ConnectionClosed);
        self.report_discarded(discarded);
        self.session.clear();
        if self.state != ConnectionState::Disconnected {
            self.set_state(ConnectionState::Closed);
        }
    }

    /// Send one envelope.
    ///
    /// Sends are fire-and-forget: the frame is queued for the transport and
    /// the call returns without waiting for it to be written.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] unless the connection is open;
    /// nothing is queued in that case.
    pub fn send(&mut self, envelope: &Envelope) -> Result<()> {
        let outbound = self.open_channel()?;
        let text = encode(envelope)?;
        outbound
            .send(text)
            .map_err(|_| ClientError::Transport(TransportError::Closed))?;
        metrics::inc_envelopes(Direction::Outbound);
        debug!(kind = %envelope.kind(), "queued envelope");
        Ok(())
    }

    fn open_channel(&self) -> Result<mpsc::UnboundedSender<String>> {
        match (&self.outbound, self.state) {
            (Some(outbound), ConnectionState::Open) => Ok(outbound.clone()),
            _ => Err(ClientError::NotConnected { state: self.state }),
        }
    }

    /// Send a text message from the current user.
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::EmptyMessage`] for blank text, otherwise as
    /// [`send`](Self::send).
    pub fn send_text(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyMessage);
        }
        let envelope = self.chat_envelope(Payload::new(PayloadKind::Text, text))?;
        self.send(&envelope)
    }

    /// Split `payload` and send each fragment in index order.
    ///
    /// Returns the number of fragments sent. The connection is checked
    /// before splitting, so a closed connection leaves nothing behind.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] unless open, or a
    /// fragmentation or transport error.
    pub fn send_chunked(&mut self, kind: PayloadKind, payload: &str) -> Result<usize> {
        self.open_channel()?;
        let sender = self.current_user()?.as_str().to_owned();
        let room = self.session.room().to_string();

        let batch = self.fragmenter.split(payload)?;
        let count = batch.len();
        for fragment in batch {
            let (header, body) = fragment.into_parts();
            let envelope = Envelope::chat(sender.as_str(), Payload::new(kind, body))
                .with_room(room.as_str())
                .with_chunk(header);
            self.send(&envelope)?;
        }
        debug!(%kind, fragments = count, "sent chunked payload");
        Ok(count)
    }

    /// Send an image data URL, always chunked.
    ///
    /// # Errors
    ///
    /// As [`send_chunked`](Self::send_chunked).
    pub fn send_image(&mut self, data_url: &str) -> Result<usize> {
        self.send_chunked(PayloadKind::Image, data_url)
    }

    /// Send an audio data URL, always chunked.
    ///
    /// # Errors
    ///
    /// As [`send_chunked`](Self::send_chunked).
    pub fn send_audio(&mut self, data_url: &str) -> Result<usize> {
        self.send_chunked(PayloadKind::Audio, data_url)
    }

    /// Announce a file the upload service has stored under `file_name`.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send).
    pub fn send_file_reference(&mut self, file_name: &str) -> Result<()> {
        let envelope = self.chat_envelope(Payload::new(PayloadKind::File, file_name))?;
        self.send(&envelope)
    }

    /// Ask the server for the online-user list.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send).
    pub fn request_user_list(&mut self) -> Result<()> { self.send(&Envelope::get_user_list()) }

    /// Tell the room that its display name changed.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send).
    pub fn announce_room_name(&mut self, new_name: &str) -> Result<()> {
        let envelope = Envelope::update_room_name(self.session.room().as_str(), new_name);
        self.send(&envelope)
    }

    fn chat_envelope(&self, payload: Payload) -> Result<Envelope> {
        self.open_channel()?;
        let sender = self.current_user()?;
        Ok(Envelope::chat(sender.as_str(), payload).with_room(self.session.room().as_str()))
    }

    fn current_user(&self) -> Result<&UserId> {
        self.session.user().ok_or(ClientError::NotAuthenticated)
    }

    fn ensure_idle(&self) -> Result<()> {
        let idle = match self.state {
            ConnectionState::Disconnected => true,
            ConnectionState::Closed => self.terminal,
            ConnectionState::Connecting | ConnectionState::Open => false,
        };
        if idle {
            Ok(())
        } else {
            Err(ClientError::SessionInUse { state: self.state })
        }
    }

    fn set_state(&mut self, to: ConnectionState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        info!(%from, %to, "connection state changed");
        self.emit(ConnectionEvent::StateChanged { from, to });
    }

    fn emit(&self, event: ConnectionEvent) {
        // No subscribers is not an error.
        self.events.send(event).ok();
    }
}
