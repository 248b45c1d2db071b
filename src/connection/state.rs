//! Connection lifecycle states and close bookkeeping.

use std::{fmt, time::Duration};

/// Lifecycle state of the single chat connection.
///
/// ```text
/// Disconnected ──open──▶ Connecting ──opened──▶ Open
///                            ▲                   │ close / error
///                            └──(delay)── Closed ◀┘
/// ```
///
/// An explicit close leaves the connection `Closed` for good.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No connection has been requested.
    Disconnected,
    /// A transport is being opened.
    Connecting,
    /// The transport is open and the presence announcement has been sent.
    Open,
    /// The transport closed; a reconnect may be pending.
    Closed,
}

impl ConnectionState {
    /// Lower-case name used in logs and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Why a transport went away.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CloseCause {
    /// The local user asked to close.
    Requested,
    /// The server closed the connection.
    Peer,
    /// The transport failed or could not be opened.
    Error(String),
}

/// What the driver should do after a close.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Wait `after`, then try again.
    Reconnect { after: Duration },
    /// Stay closed.
    Terminal,
}
