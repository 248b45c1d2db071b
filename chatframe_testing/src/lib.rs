//! Utilities for driving a [`ChatClient`](chatframe::ChatClient) in tests
//! without a network.
//!
//! [`memory_transport`] returns a connector the client dials and a server
//! handle the test uses to accept connections and play the chat server.
//!
//! ```rust
//! use chatframe::{ChatClient, ClientConfig, SessionContext};
//! use chatframe_testing::memory_transport;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (connector, mut server) = memory_transport();
//! let client = ChatClient::new(ClientConfig::default());
//! client.sign_in(SessionContext::for_user("alice", "1")).unwrap();
//! let _driver = client.open(connector).unwrap().spawn();
//!
//! let mut peer = server.accept().await.unwrap();
//! let hello = peer.recv_json().await.unwrap();
//! assert_eq!(hello["type"], "connect");
//! # }
//! ```

pub mod collab;
pub mod logging;
pub mod memory;

pub use collab::{MemoryRooms, RecordingUploader, StaticAuth};
pub use logging::{LoggerHandle, logger};
pub use memory::{MemoryConnector, MemoryServer, PeerConnection, memory_transport};
