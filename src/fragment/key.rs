//! Identity of a chunked transfer: the sender and payload kind.

use std::fmt;

use crate::envelope::{Envelope, PayloadKind};

/// Identity of one in-progress transfer: who sends it and what it carries.
///
/// A sender may have one transfer per payload kind in flight at a time, so an
/// image and an audio clip from the same sender reassemble independently.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FragmentKey {
    sender: String,
    kind: PayloadKind,
}

impl FragmentKey {
    /// Build a key from its parts.
    #[must_use]
    pub fn new(sender: impl Into<String>, kind: PayloadKind) -> Self {
        Self {
            sender: sender.into(),
            kind,
        }
    }

    /// Derive the key for a chat-origin envelope.
    ///
    /// Returns `None` for control envelopes and envelopes without a sender.
    #[must_use]
    pub fn for_envelope(envelope: &Envelope) -> Option<Self> {
        let kind = envelope.kind().payload_kind()?;
        let sender = envelope.sender()?;
        Some(Self::new(sender, kind))
    }

    /// Return the sender half of the key.
    #[must_use]
    pub fn sender(&self) -> &str { &self.sender }

    /// Return the payload-kind half of the key.
    #[must_use]
    pub const fn kind(&self) -> PayloadKind { self.kind }
}

impl fmt::Display for FragmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.sender, self.kind)
    }
}
