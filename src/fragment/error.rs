//! Error types emitted by the fragmentation layer.
//!
//! These enums keep the outbound splitter and the inbound reassembly buffer
//! decoupled from the connection while still surfacing precise diagnostics
//! for tests and event subscribers.

use thiserror::Error;

use super::{FragmentIndex, FragmentKey};
use crate::envelope::EnvelopeKind;

/// Errors produced while splitting outbound payloads.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FragmentationError {
    /// The payload needs more fragments than `chunkIndex` can address.
    #[error("payload needs {count} fragments, more than a u32 index can address")]
    TooManyFragments { count: usize },
}

/// Errors produced by [`join`](crate::fragment::join).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    /// At least one slot of the set has not been filled yet.
    #[error("fragment set incomplete: slot {missing} of {total} is empty")]
    IncompleteFragmentSet { missing: usize, total: usize },
}

/// Errors produced by the [`Reassembler`](crate::fragment::Reassembler).
///
/// A rejected fragment never touches any buffered set.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// The fragment declared `chunkTotal = 0`.
    #[error("fragment for {key} declares zero fragments")]
    ZeroTotal { key: FragmentKey },
    /// `chunkIndex` does not address a slot of the declared set.
    #[error("fragment {index} for {key} is outside a set of {total}")]
    IndexOutOfRange {
        key: FragmentKey,
        index: FragmentIndex,
        total: u32,
    },
    /// `chunkTotal` exceeds the configured per-set cap.
    #[error("fragment set for {key} declares {total} fragments, limit is {limit}")]
    TooManyFragments { key: FragmentKey, total: u32, limit: u32 },
    /// A chunked envelope arrived for a kind that carries no payload.
    #[error("`{kind}` envelopes cannot be chunked")]
    UnchunkableKind { kind: EnvelopeKind },
    /// Joining a completed set failed.
    #[error(transparent)]
    Join(#[from] JoinError),
}
