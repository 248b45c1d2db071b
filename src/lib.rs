#![doc(html_root_url = "https://docs.rs/chatframe/latest")]
//! Public API for the `chatframe` library.
//!
//! This crate provides the transport layer of a realtime chat client: a JSON
//! envelope codec, a splitter and reassembly buffer for large payloads, and
//! a single reconnecting WebSocket connection driven by an explicit state
//! machine.

pub mod client;
pub mod collab;
pub mod config;
pub mod connection;
pub mod envelope;
pub mod error;
pub mod fragment;
pub mod metrics;
pub mod session;

pub use client::ChatClient;
pub use config::ClientConfig;
pub use connection::{
    ConnectionDriver,
    ConnectionEvent,
    ConnectionManager,
    ConnectionState,
    Connector,
    TransportError,
    WebSocketConnector,
};
pub use envelope::{DecodeError, Envelope, EnvelopeKind, Payload, PayloadKind};
pub use error::{ClientError, Result};
pub use fragment::{
    DiscardedTransfer,
    FragmentHeader,
    FragmentIndex,
    FragmentKey,
    FragmentationError,
    Fragmenter,
    ProtocolViolation,
    ReassemblyError,
    Reassembler,
    join,
    split,
};
pub use session::{RoomId, SessionContext, UserId};
