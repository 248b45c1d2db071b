//! The unit exchanged over the chat connection.
//!
//! An [`Envelope`] is one JSON object per transport frame. Chat-origin
//! envelopes (`text`, `image`, `audio`, `file`) carry exactly one
//! [`Payload`]; control envelopes (`connect`, `get_user_list`,
//! `update_room_name`) carry none. Large payloads additionally carry a
//! [`FragmentHeader`] when they travel in pieces.

pub mod codec;
mod error;
mod kind;

pub use codec::{decode, decode_frame, encode};
pub use error::DecodeError;
pub use kind::{EnvelopeKind, PayloadKind};

use crate::fragment::FragmentHeader;

/// User-authored content of a chat-origin envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    kind: PayloadKind,
    body: String,
}

impl Payload {
    /// Create a payload of `kind`.
    #[must_use]
    pub fn new(kind: PayloadKind, body: impl Into<String>) -> Self {
        Self {
            kind,
            body: body.into(),
        }
    }

    /// Which wire field the payload occupies.
    #[must_use]
    pub const fn kind(&self) -> PayloadKind { self.kind }

    /// Borrow the payload body.
    #[must_use]
    pub fn body(&self) -> &str { &self.body }

    /// Consume the payload, returning the body.
    #[must_use]
    pub fn into_body(self) -> String { self.body }
}

/// One discrete message exchanged over the transport.
///
/// # Examples
///
/// ```
/// use chatframe::envelope::{Envelope, EnvelopeKind, Payload, PayloadKind};
///
/// let envelope = Envelope::chat("alice", Payload::new(PayloadKind::Text, "hi"))
///     .with_room("7");
/// assert_eq!(envelope.kind(), EnvelopeKind::Text);
/// assert_eq!(envelope.sender(), Some("alice"));
/// assert_eq!(envelope.room(), Some("7"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    kind: EnvelopeKind,
    sender: Option<String>,
    payload: Option<Payload>,
    room: Option<String>,
    timestamp: Option<i64>,
    chunk: Option<FragmentHeader>,
    users: Option<Vec<String>>,
    new_name: Option<String>,
}

impl Envelope {
    fn bare(kind: EnvelopeKind) -> Self {
        Self {
            kind,
            sender: None,
            payload: None,
            room: None,
            timestamp: None,
            chunk: None,
            users: None,
            new_name: None,
        }
    }

    /// Identity announcement sent on every successful open.
    #[must_use]
    pub fn connect(user: impl Into<String>, room: Option<String>) -> Self {
        Self {
            sender: Some(user.into()),
            room,
            ..Self::bare(EnvelopeKind::Connect)
        }
    }

    /// Chat-origin envelope whose kind follows the payload kind.
    #[must_use]
    pub fn chat(sender: impl Into<String>, payload: Payload) -> Self {
        let kind = payload.kind().envelope_kind();
        Self {
            sender: Some(sender.into()),
            payload: Some(payload),
            ..Self::bare(kind)
        }
    }

    /// Replayed history entry.
    #[must_use]
    pub fn history(sender: impl Into<String>, payload: Payload) -> Self {
        Self {
            sender: Some(sender.into()),
            payload: Some(payload),
            ..Self::bare(EnvelopeKind::History)
        }
    }

    /// Request for the online-user list.
    #[must_use]
    pub fn get_user_list() -> Self { Self::bare(EnvelopeKind::GetUserList) }

    /// Server's list of online users.
    #[must_use]
    pub fn user_list(users: Vec<String>) -> Self {
        Self {
            users: Some(users),
            ..Self::bare(EnvelopeKind::UserList)
        }
    }

    /// Rename of `room` to `new_name`.
    #[must_use]
    pub fn update_room_name(room: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self {
            room: Some(room.into()),
            new_name: Some(new_name.into()),
            ..Self::bare(EnvelopeKind::UpdateRoomName)
        }
    }

    /// Attach a room identifier.
    #[must_use]
    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    /// Attach a server timestamp in seconds since the epoch.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Mark the envelope as one fragment of a chunked payload.
    #[must_use]
    pub fn with_chunk(mut self, header: FragmentHeader) -> Self {
        self.chunk = Some(header);
        self
    }

    /// Envelope kind.
    #[must_use]
    pub const fn kind(&self) -> EnvelopeKind { self.kind }

    /// Author of a chat-origin envelope, or the announcing user of `connect`.
    #[must_use]
    pub fn sender(&self) -> Option<&str> { self.sender.as_deref() }

    /// Payload of a chat-origin or history envelope.
    #[must_use]
    pub fn payload(&self) -> Option<&Payload> { self.payload.as_ref() }

    /// Room identifier, if any.
    #[must_use]
    pub fn room(&self) -> Option<&str> { self.room.as_deref() }

    /// Server-assigned timestamp in seconds since the epoch.
    #[must_use]
    pub const fn timestamp(&self) -> Option<i64> { self.timestamp }

    /// Fragment position when the envelope is one piece of a chunked payload.
    #[must_use]
    pub const fn chunk(&self) -> Option<FragmentHeader> { self.chunk }

    /// Whether the envelope is one piece of a chunked payload.
    #[must_use]
    pub const fn is_fragment(&self) -> bool { self.chunk.is_some() }

    /// Online users listed by a `user_list` envelope.
    #[must_use]
    pub fn users(&self) -> Option<&[String]> { self.users.as_deref() }

    /// New display name carried by `update_room_name`.
    #[must_use]
    pub fn new_name(&self) -> Option<&str> { self.new_name.as_deref() }

    /// Detach the fragment header and body, leaving an empty payload shell.
    pub(crate) fn take_fragment(&mut self) -> Option<(FragmentHeader, String)> {
        let header = self.chunk.take()?;
        let body = self
            .payload
            .as_mut()
            .map(|payload| std::mem::take(&mut payload.body))
            .unwrap_or_default();
        Some((header, body))
    }

    /// Fill the payload shell left by [`take_fragment`](Self::take_fragment)
    /// with the joined body.
    pub(crate) fn into_reassembled(mut self, body: String) -> Self {
        if let Some(payload) = self.payload.as_mut() {
            payload.body = body;
        }
        self.chunk = None;
        self
    }
}
