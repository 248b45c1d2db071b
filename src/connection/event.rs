//! Notifications broadcast by the connection manager.

use super::ConnectionState;
use crate::fragment::{DiscardedTransfer, ProtocolViolation, ReassemblyError};

/// Observable side effects of the connection and reassembly machinery.
///
/// Delivered envelopes go to the single `on_envelope` handler; everything
/// else a UI or test may want to watch is broadcast as an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The connection moved between states.
    StateChanged {
        from: ConnectionState,
        to: ConnectionState,
    },
    /// An incomplete transfer was dropped.
    TransferDiscarded(DiscardedTransfer),
    /// A fragment announced a different `chunkTotal` than its open set.
    ProtocolViolation(ProtocolViolation),
    /// A fragment was refused without touching any buffered set.
    FragmentRejected(ReassemblyError),
    /// An inbound frame could not be decoded and was dropped.
    DecodeFailed { reason: String },
}
