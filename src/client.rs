//! Cloneable handle to a chat connection.
//!
//! [`ChatClient`] shares one [`ConnectionManager`] between the application
//! and the [`ConnectionDriver`] task. Sends lock the manager briefly and
//! return without waiting for the socket; delivered envelopes reach the
//! single handler registered with [`ChatClient::on_envelope`].
//!
//! ```no_run
//! use chatframe::{
//!     client::ChatClient,
//!     config::ClientConfig,
//!     connection::WebSocketConnector,
//!     session::SessionContext,
//! };
//!
//! # async fn demo() -> Result<(), chatframe::ClientError> {
//! let client = ChatClient::new(ClientConfig::default());
//! client.sign_in(SessionContext::for_user("alice", "1"))?;
//! client.on_envelope(|envelope| println!("{envelope:?}"));
//! let driver = client.open(WebSocketConnector)?.spawn();
//! client.send_text("hello")?;
//! client.close();
//! driver.await.ok();
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::info;

use crate::{
    collab::{AuthService, Credentials, FileUploadService, RoomMetadataService},
    config::ClientConfig,
    connection::{
        ConnectionDriver,
        ConnectionEvent,
        ConnectionManager,
        ConnectionState,
        Connector,
    },
    envelope::Envelope,
    error::{ClientError, Result},
    session::SessionContext,
};

/// Target for fully assembled inbound envelopes.
pub type EnvelopeHandler = Box<dyn FnMut(Envelope) + Send>;

/// Lock `mutex`, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared handle for signing in, sending and closing.
#[derive(Clone)]
pub struct ChatClient {
    manager: Arc<Mutex<ConnectionManager>>,
    handler: Arc<Mutex<Option<EnvelopeHandler>>>,
}

impl ChatClient {
    /// Create a client with an empty session.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            manager: Arc::new(Mutex::new(ConnectionManager::new(config))),
            handler: Arc::new(Mutex::new(None)),
        }
    }

    fn manager(&self) -> MutexGuard<'_, ConnectionManager> { lock(&self.manager) }

    /// Register the single inbound dispatch target, replacing any previous
    /// one.
    ///
    /// The handler runs on the driver task outside the manager lock, so it
    /// may call the send methods of a cloned client. It must not call
    /// `on_envelope` itself.
    pub fn on_envelope<F>(&self, handler: F)
    where
        F: FnMut(Envelope) + Send + 'static,
    {
        *lock(&self.handler) = Some(Box::new(handler));
    }

    /// Subscribe to state changes and reassembly notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> { self.manager().subscribe() }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState { self.manager().state() }

    /// Snapshot of the session.
    #[must_use]
    pub fn session(&self) -> SessionContext { self.manager().session().clone() }

    /// Install a session directly, bypassing the authentication service.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::SessionInUse`] while a connection is live.
    pub fn sign_in(&self, session: SessionContext) -> Result<()> { self.manager().sign_in(session) }

    /// Authenticate through `auth` and populate the session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::SessionInUse`] while a connection is live and
    /// [`ClientError::Collaborator`] if the service refuses.
    pub async fn login(&self, auth: &dyn AuthService, credentials: &Credentials) -> Result<()> {
        let state = self.state();
        if matches!(state, ConnectionState::Connecting | ConnectionState::Open) {
            return Err(ClientError::SessionInUse { state });
        }
        let grant = auth
            .login(credentials)
            .await
            .map_err(ClientError::Collaborator)?;
        info!(user = %grant.user, room = %grant.room, "signed in");
        self.manager().apply_grant(grant)
    }

    /// Start connecting through `connector`.
    ///
    /// The returned driver does the I/O; `.await` its `run` or `spawn` it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] without a signed-in user and
    /// [`ClientError::SessionInUse`] if a connection is already live.
    pub fn open<C: Connector>(&self, connector: C) -> Result<ConnectionDriver> {
        let shutdown = self.manager().request_open()?;
        Ok(ConnectionDriver::new(
            Arc::clone(&self.manager),
            Arc::clone(&self.handler),
            Arc::new(connector),
            shutdown,
        ))
    }

    /// Send one envelope as-is.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] unless the connection is open.
    pub fn send(&self, envelope: &Envelope) -> Result<()> { self.manager().send(envelope) }

    /// Send a text message.
    ///
    /// # Errors
    ///
    /// See [`ConnectionManager::send_text`].
    pub fn send_text(&self, text: &str) -> Result<()> { self.manager().send_text(text) }

    /// Send an image data URL in fragments; returns the fragment count.
    ///
    /// # Errors
    ///
    /// See [`ConnectionManager::send_chunked`].
    pub fn send_image(&self, data_url: &str) -> Result<usize> { self.manager().send_image(data_url) }

    /// Send an audio data URL in fragments; returns the fragment count.
    ///
    /// # Errors
    ///
    /// See [`ConnectionManager::send_chunked`].
    pub fn send_audio(&self, data_url: &str) -> Result<usize> { self.manager().send_audio(data_url) }

    /// Upload `bytes` through `uploader` and announce the stored file.
    ///
    /// The connection is checked before uploading so nothing is stored for a
    /// message that cannot be sent.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] unless open and
    /// [`ClientError::Collaborator`] if the upload fails.
    pub async fn send_file(
        &self,
        uploader: &dyn FileUploadService,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<()> {
        self.ensure_open()?;
        let stored = uploader
            .upload(file_name, bytes)
            .await
            .map_err(ClientError::Collaborator)?;
        self.manager().send_file_reference(&stored)
    }

    /// Ask the server for the online-user list.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] unless open.
    pub fn request_user_list(&self) -> Result<()> { self.manager().request_user_list() }

    /// Rename the current room through `rooms` and tell the room about it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] unless open and
    /// [`ClientError::Collaborator`] if the metadata service fails.
    pub async fn rename_room(&self, rooms: &dyn RoomMetadataService, new_name: &str) -> Result<()> {
        self.ensure_open()?;
        let room = self.manager().session().room().clone();
        rooms
            .set_room_name(&room, new_name)
            .await
            .map_err(ClientError::Collaborator)?;
        let mut manager = self.manager();
        manager.set_room_name(new_name);
        manager.announce_room_name(new_name)
    }

    /// Fetch the display name of the current room from `rooms` and record
    /// it in the session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Collaborator`] if the metadata service fails.
    pub async fn refresh_room_name(&self, rooms: &dyn RoomMetadataService) -> Result<Option<String>> {
        let room = self.manager().session().room().clone();
        let name = rooms
            .room_name(&room)
            .await
            .map_err(ClientError::Collaborator)?;
        if let Some(name) = &name {
            self.manager().set_room_name(name.as_str());
        }
        Ok(name)
    }

    /// Record that an envelope stamped `timestamp` was rendered; returns
    /// whether a time separator is due.
    #[must_use]
    pub fn mark_rendered(&self, timestamp: i64) -> bool { self.manager().mark_rendered(timestamp) }

    /// Close explicitly. No reconnect follows and the session is cleared.
    pub fn close(&self) { self.manager().close(); }

    fn ensure_open(&self) -> Result<()> {
        match self.state() {
            ConnectionState::Open => Ok(()),
            state => Err(ClientError::NotConnected { state }),
        }
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("manager", &self.manager)
            .finish_non_exhaustive()
    }
}
