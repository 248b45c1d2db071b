//! In-memory stand-ins for the login, upload and room-metadata services.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use chatframe::{
    RoomId,
    collab::{
        AuthService,
        CollaboratorError,
        Credentials,
        FileUploadService,
        LoginGrant,
        RoomMetadataService,
    },
};

/// Accepts one password for every user.
pub struct StaticAuth {
    password: String,
    rooms: Vec<RoomId>,
}

impl StaticAuth {
    /// Accept `password`, granting access to `rooms` besides the requested one.
    pub fn new(password: impl Into<String>, rooms: impl IntoIterator<Item = RoomId>) -> Self {
        Self {
            password: password.into(),
            rooms: rooms.into_iter().collect(),
        }
    }
}

#[async_trait]
impl AuthService for StaticAuth {
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, CollaboratorError> {
        if credentials.password != self.password {
            return Err("invalid username or password".into());
        }
        Ok(LoginGrant {
            user: credentials.username.as_str().into(),
            room: credentials.room.clone(),
            rooms: self.rooms.clone(),
            room_name: None,
        })
    }
}

/// Stores uploads in memory and names them `upload-<n>-<original>`.
#[derive(Default)]
pub struct RecordingUploader {
    uploads: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingUploader {
    /// Uploads received so far, as `(stored name, bytes)`.
    pub fn uploads(&self) -> Vec<(String, Vec<u8>)> {
        self.uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl FileUploadService for RecordingUploader {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, CollaboratorError> {
        let mut uploads = self.uploads.lock().unwrap_or_else(PoisonError::into_inner);
        let stored = format!("upload-{}-{file_name}", uploads.len());
        uploads.push((stored.clone(), bytes));
        Ok(stored)
    }
}

/// Room names kept in a map.
#[derive(Default)]
pub struct MemoryRooms {
    names: Mutex<HashMap<RoomId, String>>,
}

impl MemoryRooms {
    /// Stored name of `room`.
    pub fn name_of(&self, room: &RoomId) -> Option<String> {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(room)
            .cloned()
    }
}

#[async_trait]
impl RoomMetadataService for MemoryRooms {
    async fn room_name(&self, room: &RoomId) -> Result<Option<String>, CollaboratorError> {
        Ok(self.name_of(room))
    }

    async fn set_room_name(&self, room: &RoomId, name: &str) -> Result<(), CollaboratorError> {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(room.clone(), name.to_owned());
        Ok(())
    }
}
