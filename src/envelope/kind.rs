//! Envelope and payload kinds recognised on the wire.

use std::{fmt, str::FromStr};

use super::DecodeError;

/// Value of the `type` (or `kind`) field of an envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    /// Identity announcement sent when the connection opens.
    Connect,
    /// Plain chat message.
    Text,
    /// Image data URL, usually chunked.
    Image,
    /// Audio data URL, usually chunked.
    Audio,
    /// Reference to a file stored by the upload service.
    File,
    /// Replayed message from the server's history.
    History,
    /// Server's list of online users.
    UserList,
    /// Request for the online-user list.
    GetUserList,
    /// Rename of the current room.
    UpdateRoomName,
}

impl EnvelopeKind {
    /// Every recognised kind.
    pub const ALL: [Self; 9] = [
        Self::Connect,
        Self::Text,
        Self::Image,
        Self::Audio,
        Self::File,
        Self::History,
        Self::UserList,
        Self::GetUserList,
        Self::UpdateRoomName,
    ];

    /// Wire spelling of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::File => "file",
            Self::History => "history",
            Self::UserList => "user_list",
            Self::GetUserList => "get_user_list",
            Self::UpdateRoomName => "update_room_name",
        }
    }

    /// Payload kind carried by chat-origin envelopes.
    #[must_use]
    pub const fn payload_kind(self) -> Option<PayloadKind> {
        match self {
            Self::Text => Some(PayloadKind::Text),
            Self::Image => Some(PayloadKind::Image),
            Self::Audio => Some(PayloadKind::Audio),
            Self::File => Some(PayloadKind::File),
            _ => None,
        }
    }

    /// Whether the envelope carries user-authored content.
    #[must_use]
    pub const fn is_chat_origin(self) -> bool { self.payload_kind().is_some() }

    /// Whether the envelope is a payload-free control message.
    #[must_use]
    pub const fn is_control(self) -> bool {
        matches!(
            self,
            Self::Connect | Self::GetUserList | Self::UpdateRoomName
        )
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for EnvelopeKind {
    type Err = DecodeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| DecodeError::UnknownKind(value.to_owned()))
    }
}

/// Which payload field a chat-origin envelope populates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// `message`
    Text,
    /// `image`
    Image,
    /// `audio`
    Audio,
    /// `fileName`
    File,
}

impl PayloadKind {
    /// Lookup order used when a history envelope carries several fields.
    pub const ALL: [Self; 4] = [Self::Text, Self::Image, Self::Audio, Self::File];

    /// Envelope kind that carries this payload.
    #[must_use]
    pub const fn envelope_kind(self) -> EnvelopeKind {
        match self {
            Self::Text => EnvelopeKind::Text,
            Self::Image => EnvelopeKind::Image,
            Self::Audio => EnvelopeKind::Audio,
            Self::File => EnvelopeKind::File,
        }
    }

    /// Name of the wire field holding the payload.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Text => "message",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::File => "fileName",
        }
    }

    /// Short name used in logs and fragment keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str { self.envelope_kind().as_str() }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}
