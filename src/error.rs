//! Canonical error type for client operations.
//!
//! Lower layers keep their own precise errors ([`DecodeError`],
//! [`FragmentationError`], [`ReassemblyError`], [`TransportError`]);
//! [`ClientError`] is what the public send and session operations return.
//!
//! [`DecodeError`]: crate::envelope::DecodeError
//! [`ReassemblyError`]: crate::fragment::ReassemblyError

use crate::{
    collab::CollaboratorError,
    connection::{ConnectionState, TransportError},
    fragment::FragmentationError,
};

/// Errors returned by [`ChatClient`](crate::client::ChatClient) and
/// [`ConnectionManager`](crate::connection::ConnectionManager).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A send was attempted while the connection was not open. Nothing was
    /// queued.
    #[error("not connected (connection is {state})")]
    NotConnected { state: ConnectionState },
    /// The operation needs a signed-in user.
    #[error("no user is signed in")]
    NotAuthenticated,
    /// The session cannot change while a connection is live.
    #[error("session cannot change while the connection is {state}")]
    SessionInUse { state: ConnectionState },
    /// The message was empty after trimming whitespace.
    #[error("message is empty")]
    EmptyMessage,
    /// Failed to serialize an outbound envelope.
    #[error("failed to encode envelope")]
    Encode(#[from] serde_json::Error),
    /// Failed to split an outbound payload.
    #[error(transparent)]
    Fragmentation(#[from] FragmentationError),
    /// The transport could not be opened or failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// An external collaborator (login, upload, room metadata) failed.
    #[error("collaborator request failed")]
    Collaborator(#[source] CollaboratorError),
}

/// Result alias used by client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
