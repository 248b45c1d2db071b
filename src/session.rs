//! Identity shared by the connection manager and the rendering side.
//!
//! [`SessionContext`] holds who the local user is and which room they are
//! in. The connection manager owns the only instance and reads it when it
//! announces presence; it is mutated by the login flow and cleared on an
//! explicit close.

use derive_more::{Display, From};

use crate::collab::LoginGrant;

/// Gap in seconds after which the renderer shows a time separator.
pub const TIMESTAMP_GAP_SECS: i64 = 600;

/// Room joined when the login flow names none.
pub const DEFAULT_ROOM: &str = "1";

/// Name the local user is known by on the server.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Display, From)]
#[display("{_0}")]
pub struct UserId(String);

impl UserId {
    /// Wrap a user name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self { Self(name.into()) }

    /// Borrow the user name.
    #[must_use]
    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self { Self::new(value) }
}

/// Identifier of a chat room (`roomNumber` on the wire).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Display, From)]
#[display("{_0}")]
pub struct RoomId(String);

impl RoomId {
    /// Wrap a room identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

    /// Borrow the room identifier.
    #[must_use]
    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for RoomId {
    fn from(value: &str) -> Self { Self::new(value) }
}

impl Default for RoomId {
    fn default() -> Self { Self::new(DEFAULT_ROOM) }
}

/// Current user, current room and rendering bookmark.
///
/// # Examples
///
/// ```
/// use chatframe::session::SessionContext;
///
/// let session = SessionContext::for_user("alice", "3");
/// assert!(session.is_local("alice"));
/// assert!(!session.is_local("bob"));
/// assert_eq!(session.room().as_str(), "3");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionContext {
    user: Option<UserId>,
    room: RoomId,
    rooms: Vec<RoomId>,
    room_name: Option<String>,
    last_rendered: Option<i64>,
}

impl SessionContext {
    /// Empty session in the default room.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Session already signed in as `user` in `room`.
    #[must_use]
    pub fn for_user(user: impl Into<UserId>, room: impl Into<RoomId>) -> Self {
        let room = room.into();
        Self {
            user: Some(user.into()),
            rooms: vec![room.clone()],
            room,
            ..Self::default()
        }
    }

    /// Signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&UserId> { self.user.as_ref() }

    /// Whether a user is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool { self.user.is_some() }

    /// Current room.
    #[must_use]
    pub fn room(&self) -> &RoomId { &self.room }

    /// Rooms the login grant made available.
    #[must_use]
    pub fn rooms(&self) -> &[RoomId] { &self.rooms }

    /// Human-readable name of the current room, if known.
    #[must_use]
    pub fn room_name(&self) -> Option<&str> { self.room_name.as_deref() }

    /// Whether an envelope from `sender` was authored locally.
    #[must_use]
    pub fn is_local(&self, sender: &str) -> bool {
        self.user.as_ref().is_some_and(|user| user.as_str() == sender)
    }

    /// Replace the session with what the authentication service granted.
    pub fn apply_grant(&mut self, grant: LoginGrant) {
        let LoginGrant {
            user,
            room,
            mut rooms,
            room_name,
        } = grant;
        if !rooms.contains(&room) {
            rooms.push(room.clone());
        }
        *self = Self {
            user: Some(user),
            room,
            rooms,
            room_name,
            last_rendered: None,
        };
    }

    /// Record the display name of the current room.
    pub fn set_room_name(&mut self, name: impl Into<String>) { self.room_name = Some(name.into()); }

    /// Record that an envelope stamped `timestamp` was rendered.
    ///
    /// Returns `true` when more than [`TIMESTAMP_GAP_SECS`] elapsed since the
    /// previously rendered envelope, meaning the renderer should show a time
    /// separator first. The first rendered envelope counts from the epoch.
    pub fn mark_rendered(&mut self, timestamp: i64) -> bool {
        let previous = self.last_rendered.replace(timestamp).unwrap_or(0);
        timestamp.saturating_sub(previous) > TIMESTAMP_GAP_SECS
    }

    /// Forget the user and everything derived from the login.
    pub fn clear(&mut self) { *self = Self::default(); }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn new_session_is_anonymous_in_default_room() {
        let session = SessionContext::new();
        assert!(!session.is_authenticated());
        assert_eq!(session.room().as_str(), DEFAULT_ROOM);
        assert!(!session.is_local("anyone"));
    }

    #[test]
    fn grant_populates_session() {
        let mut session = SessionContext::new();
        session.apply_grant(LoginGrant {
            user: "alice".into(),
            room: "2".into(),
            rooms: vec!["1".into()],
            room_name: Some("Kitchen".to_owned()),
        });

        assert_eq!(session.user().map(UserId::as_str), Some("alice"));
        assert_eq!(session.room().as_str(), "2");
        assert_eq!(session.rooms(), [RoomId::from("1"), RoomId::from("2")]);
        assert_eq!(session.room_name(), Some("Kitchen"));
    }

    #[rstest]
    #[case::first_message(None, 1_000, true)]
    #[case::within_gap(Some(1_000), 1_600, false)]
    #[case::past_gap(Some(1_000), 1_601, true)]
    #[case::small_first_timestamp(None, 600, false)]
    fn separator_follows_ten_minute_gap(
        #[case] previous: Option<i64>,
        #[case] timestamp: i64,
        #[case] expected: bool,
    ) {
        let mut session = SessionContext::new();
        if let Some(previous) = previous {
            session.mark_rendered(previous);
        }
        assert_eq!(session.mark_rendered(timestamp), expected);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut session = SessionContext::for_user("bob", "5");
        session.set_room_name("Den");
        session.mark_rendered(10);
        session.clear();
        assert_eq!(session, SessionContext::new());
    }
}
