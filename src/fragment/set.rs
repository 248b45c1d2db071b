//! Slot storage for one in-progress transfer.

use std::time::{Duration, Instant};

use super::{FragmentIndex, JoinError, join};

/// Outcome of writing a fragment into a [`FragmentSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotWrite {
    /// The slot was empty.
    Filled,
    /// The slot already held a body and was overwritten.
    Overwritten,
}

/// Fixed-size slot array for one `(sender, kind)` transfer.
///
/// The slot count is fixed by the first fragment's `chunkTotal`. Slots are
/// written by explicit index, so arrival order does not matter.
#[derive(Debug)]
pub struct FragmentSet {
    slots: Vec<Option<String>>,
    filled: usize,
    created_at: Instant,
    touched_at: Instant,
}

impl FragmentSet {
    /// Create a set of `total` empty slots.
    #[must_use]
    pub fn new(total: u32, now: Instant) -> Self {
        Self {
            slots: vec![None; total as usize],
            filled: 0,
            created_at: now,
            touched_at: now,
        }
    }

    /// Number of slots declared by the transfer.
    #[must_use]
    pub fn total(&self) -> usize { self.slots.len() }

    /// Number of slots holding a body.
    #[must_use]
    pub fn filled(&self) -> usize { self.filled }

    /// Whether every slot holds a body.
    #[must_use]
    pub fn is_complete(&self) -> bool { self.filled == self.slots.len() }

    /// When the first fragment of this set arrived.
    #[must_use]
    pub fn created_at(&self) -> Instant { self.created_at }

    /// Time since the last fragment arrived.
    #[must_use]
    pub fn idle_for(&self, now: Instant) -> Duration { now.saturating_duration_since(self.touched_at) }

    /// Write `body` into slot `index`, overwriting any earlier body.
    ///
    /// `index` must be below [`total`](Self::total); the reassembler checks
    /// this before calling.
    pub fn insert(&mut self, index: FragmentIndex, body: String, now: Instant) -> SlotWrite {
        self.touched_at = now;
        let slot = &mut self.slots[index.as_usize()];
        let write = if slot.is_some() {
            SlotWrite::Overwritten
        } else {
            self.filled += 1;
            SlotWrite::Filled
        };
        *slot = Some(body);
        write
    }

    /// Join the slots into the original payload.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError::IncompleteFragmentSet`] while any slot is empty.
    pub fn join(&self) -> Result<String, JoinError> { join(&self.slots) }
}
