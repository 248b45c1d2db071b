//! The single chat connection: lifecycle, send path and inbound dispatch.
//!
//! [`ConnectionManager`] is the synchronous state machine that owns the
//! session, the reassembly buffer and the outbound queue.
//! [`ConnectionDriver`] is the async task that opens transports through a
//! [`Connector`], pumps frames between the socket and the manager, sweeps
//! idle transfers and schedules the fixed-delay reconnect.

mod driver;
mod event;
mod manager;
mod state;
mod transport;
pub mod websocket;

pub use driver::ConnectionDriver;
pub use event::ConnectionEvent;
pub use manager::ConnectionManager;
pub use state::{CloseCause, CloseOutcome, ConnectionState};
pub use transport::{Connector, FrameSink, FrameStream, Transport, TransportError};
pub use websocket::WebSocketConnector;
