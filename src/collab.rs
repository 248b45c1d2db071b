//! Services the chat client consumes but does not implement.
//!
//! Login, file upload and room metadata live behind HTTP endpoints in the
//! deployed system. The client only needs their results, so each is a small
//! async trait that applications implement over their HTTP client of choice
//! and tests implement in memory.

use std::fmt;

use async_trait::async_trait;

use crate::session::{RoomId, UserId};

/// Error returned by a collaborator implementation.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// What the user typed into the login form.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Room to join; the default room when left empty.
    pub room: RoomId,
}

impl Credentials {
    /// Credentials for `username` joining `room`.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        room: impl Into<RoomId>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            room: room.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("room", &self.room)
            .finish()
    }
}

/// Identity and room set handed out by a successful login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginGrant {
    /// Authenticated user.
    pub user: UserId,
    /// Room the user joined.
    pub room: RoomId,
    /// Other rooms the user may switch to.
    pub rooms: Vec<RoomId>,
    /// Display name of the joined room, if it has one.
    pub room_name: Option<String>,
}

/// Authentication endpoint.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Verify `credentials` and return the granted identity.
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, CollaboratorError>;
}

/// File-upload endpoint.
#[async_trait]
pub trait FileUploadService: Send + Sync {
    /// Store `bytes` and return the name the server assigned to the file.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, CollaboratorError>;
}

/// Room-name endpoint.
#[async_trait]
pub trait RoomMetadataService: Send + Sync {
    /// Look up the display name of `room`.
    async fn room_name(&self, room: &RoomId) -> Result<Option<String>, CollaboratorError>;

    /// Record `name` as the display name of `room`.
    async fn set_room_name(&self, room: &RoomId, name: &str) -> Result<(), CollaboratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_hides_password() {
        let credentials = Credentials::new("alice", "hunter2", "1");
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }
}
