//! Splitting large payloads into ordered fragments and joining them back.
//!
//! Images and audio travel as base64 data URLs that can run to megabytes, so
//! the sender splits them into bounded fragments ([`split`], [`Fragmenter`])
//! and the receiver buffers fragments per `(sender, kind)` until every slot
//! is filled ([`Reassembler`], [`join`]).

pub mod error;
pub mod fragmenter;
pub mod header;
pub mod index;
pub mod join;
pub mod key;
pub mod reassembler;
pub mod set;

pub use error::{FragmentationError, JoinError, ReassemblyError};
pub use fragmenter::{FragmentBatch, FragmentFrame, Fragmenter, split};
pub use header::FragmentHeader;
pub use index::FragmentIndex;
pub use join::join;
pub use key::FragmentKey;
pub use reassembler::{
    DiscardReason,
    DiscardedTransfer,
    ProtocolViolation,
    PushOutcome,
    ReassembledPayload,
    Reassembler,
};
pub use set::{FragmentSet, SlotWrite};
