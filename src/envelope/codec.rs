//! JSON encoding and decoding of envelopes.
//!
//! Outbound envelopes use the field names the chat server reads (`type`,
//! `roomNumber`, `fileName`, `chunkIndex`, ...). Inbound decoding is lenient
//! about spelling (`kind`/`type`, `room`/`roomNumber`, `sender`/`username`),
//! treats `null` as absent and truncates fractional timestamps, but rejects
//! frames that lack a field their kind requires.

use serde::{Deserialize, Serialize};
use serde_json::Number;

use super::{DecodeError, Envelope, EnvelopeKind, Payload, PayloadKind};
use crate::fragment::{FragmentHeader, FragmentIndex};

/// Room identifiers are strings in this client but some servers send numbers.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RoomNumber {
    Text(String),
    Number(Number),
}

impl RoomNumber {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEnvelope {
    #[serde(rename = "type", alias = "kind", skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_name: Option<String>,
    #[serde(rename = "roomNumber", alias = "room", skip_serializing_if = "Option::is_none")]
    room: Option<RoomNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chunk_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chunk_total: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    users: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_name: Option<String>,
}

impl WireEnvelope {
    fn field_mut(&mut self, kind: PayloadKind) -> &mut Option<String> {
        match kind {
            PayloadKind::Text => &mut self.message,
            PayloadKind::Image => &mut self.image,
            PayloadKind::Audio => &mut self.audio,
            PayloadKind::File => &mut self.file_name,
        }
    }

    fn take_payload(&mut self, kind: PayloadKind) -> Option<Payload> {
        self.field_mut(kind)
            .take()
            .map(|body| Payload::new(kind, body))
    }

    /// First non-empty payload field, in `message`, `image`, `audio`,
    /// `fileName` order.
    fn take_first_payload(&mut self) -> Option<Payload> {
        PayloadKind::ALL.into_iter().find_map(|kind| {
            let field = self.field_mut(kind);
            if field.as_deref().is_some_and(|body| !body.is_empty()) {
                field.take().map(|body| Payload::new(kind, body))
            } else {
                None
            }
        })
    }
}

impl From<&Envelope> for WireEnvelope {
    fn from(envelope: &Envelope) -> Self {
        let mut wire = Self {
            kind: Some(envelope.kind().as_str().to_owned()),
            room: envelope.room().map(|room| RoomNumber::Text(room.to_owned())),
            timestamp: envelope.timestamp().map(Number::from),
            chunk_index: envelope.chunk().map(|header| header.index().get()),
            chunk_total: envelope.chunk().map(|header| header.total()),
            users: envelope.users().map(<[String]>::to_vec),
            new_name: envelope.new_name().map(str::to_owned),
            ..Self::default()
        };

        let sender = envelope.sender().map(str::to_owned);
        if envelope.kind() == EnvelopeKind::Connect {
            wire.username = sender;
        } else {
            wire.sender = sender;
        }

        if let Some(payload) = envelope.payload() {
            *wire.field_mut(payload.kind()) = Some(payload.body().to_owned());
        }
        wire
    }
}

impl TryFrom<WireEnvelope> for Envelope {
    type Error = DecodeError;

    fn try_from(mut wire: WireEnvelope) -> Result<Self, Self::Error> {
        let kind: EnvelopeKind = wire.kind.take().ok_or(DecodeError::MissingKind)?.parse()?;
        let missing = |field| DecodeError::MissingField {
            kind: kind.as_str(),
            field,
        };

        let chunk = match (wire.chunk_index, wire.chunk_total) {
            (Some(index), Some(total)) => Some(FragmentHeader::new(FragmentIndex::new(index), total)),
            (None, None) => None,
            _ => return Err(DecodeError::PartialChunk),
        };
        let sender = wire.sender.take().or_else(|| wire.username.take());

        let mut envelope = match kind {
            EnvelopeKind::Connect => {
                let user = sender.ok_or_else(|| missing("username"))?;
                Self::connect(user, None)
            }
            EnvelopeKind::Text | EnvelopeKind::Image | EnvelopeKind::Audio | EnvelopeKind::File => {
                let sender = sender.ok_or_else(|| missing("sender"))?;
                let payload_kind = kind.payload_kind().ok_or_else(|| missing("payload"))?;
                let payload = wire
                    .take_payload(payload_kind)
                    .ok_or_else(|| missing(payload_kind.field_name()))?;
                Self::chat(sender, payload)
            }
            EnvelopeKind::History => {
                let sender = sender.ok_or_else(|| missing("sender"))?;
                let payload = wire.take_first_payload().ok_or_else(|| missing("message"))?;
                Self::history(sender, payload)
            }
            EnvelopeKind::UserList => {
                let users = wire.users.take().ok_or_else(|| missing("users"))?;
                Self::user_list(users)
            }
            EnvelopeKind::GetUserList => Self::get_user_list(),
            EnvelopeKind::UpdateRoomName => {
                let room = wire.room.take().ok_or_else(|| missing("roomNumber"))?;
                let new_name = wire.new_name.take().ok_or_else(|| missing("newName"))?;
                Self::update_room_name(room.into_string(), new_name)
            }
        };

        if let Some(room) = wire.room.take() {
            envelope = envelope.with_room(room.into_string());
        }
        if let Some(timestamp) = wire.timestamp.as_ref().and_then(whole_seconds) {
            envelope = envelope.with_timestamp(timestamp);
        }
        if let Some(header) = chunk {
            envelope = envelope.with_chunk(header);
        }
        Ok(envelope)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "envelopes carry whole seconds; fractional server timestamps are truncated"
)]
fn whole_seconds(number: &Number) -> Option<i64> {
    number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|value| value.is_finite())
            .map(|value| value.trunc() as i64)
    })
}

/// Serialize `envelope` into one wire frame.
///
/// # Errors
///
/// Returns the underlying [`serde_json::Error`] if serialization fails.
///
/// # Examples
///
/// ```
/// use chatframe::envelope::{Envelope, encode};
///
/// let text = encode(&Envelope::get_user_list()).expect("encode");
/// assert_eq!(text, r#"{"type":"get_user_list"}"#);
/// ```
pub fn encode(envelope: &Envelope) -> Result<String, serde_json::Error> {
    serde_json::to_string(&WireEnvelope::from(envelope))
}

/// Parse one JSON object into an [`Envelope`].
///
/// # Errors
///
/// Returns [`DecodeError`] when the text is not a JSON object of the
/// expected shape or lacks a field required by its kind.
pub fn decode(text: &str) -> Result<Envelope, DecodeError> {
    let wire: WireEnvelope = serde_json::from_str(text)?;
    Envelope::try_from(wire)
}

/// Parse a transport frame holding either one envelope or a JSON array of
/// envelopes (a history batch).
///
/// # Errors
///
/// Returns [`DecodeError`] if the frame or any element of a batch fails to
/// decode; a batch is accepted or rejected as a whole.
pub fn decode_frame(text: &str) -> Result<Vec<Envelope>, DecodeError> {
    if text.trim_start().starts_with('[') {
        let batch: Vec<WireEnvelope> = serde_json::from_str(text)?;
        batch.into_iter().map(Envelope::try_from).collect()
    } else {
        decode(text).map(|envelope| vec![envelope])
    }
}
