//! Inbound buffer that stitches fragments back into complete payloads.
//!
//! [`Reassembler`] mirrors the outbound [`Fragmenter`](crate::fragment::Fragmenter)
//! by collecting fragment bodies keyed by [`FragmentKey`]. Slots are written by
//! explicit index, so fragments may arrive in any order. Sets that stop
//! receiving fragments are evicted once they have been idle for the
//! configured timeout, and every eviction is reported as a
//! [`DiscardedTransfer`] rather than silently dropped.

use std::{
    collections::HashMap,
    num::NonZeroU32,
    time::{Duration, Instant},
};

use super::{FragmentHeader, FragmentKey, FragmentSet, ReassemblyError, SlotWrite};

/// Why a partially received transfer was thrown away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscardReason {
    /// No fragment arrived within the idle timeout.
    IdleTimeout,
    /// A newer fragment for the same key announced a different `chunkTotal`.
    Superseded { announced_total: u32 },
    /// The connection closed while the transfer was in flight.
    ConnectionClosed,
}

/// Report of an incomplete transfer that was discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscardedTransfer {
    /// Transfer identity.
    pub key: FragmentKey,
    /// Slots that had been filled.
    pub received: usize,
    /// Slots the transfer declared.
    pub total: usize,
    /// Why the transfer was dropped.
    pub reason: DiscardReason,
}

/// A fragment declared a `chunkTotal` that disagrees with the open set.
///
/// The stale set is discarded and a new one is started with the newly
/// announced total.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtocolViolation {
    /// The set that was thrown away.
    pub stale: DiscardedTransfer,
    /// `chunkTotal` of the fragment that replaced it.
    pub announced_total: u32,
}

/// A transfer whose slots are all filled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReassembledPayload {
    key: FragmentKey,
    body: String,
}

impl ReassembledPayload {
    /// Transfer identity.
    #[must_use]
    pub fn key(&self) -> &FragmentKey { &self.key }

    /// Borrow the joined payload.
    #[must_use]
    pub fn body(&self) -> &str { &self.body }

    /// Consume the payload, returning the joined body.
    #[must_use]
    pub fn into_body(self) -> String { self.body }
}

/// Result of pushing one fragment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PushOutcome {
    /// Present when this fragment filled the last empty slot.
    pub completed: Option<ReassembledPayload>,
    /// Present when this fragment replaced a set with a different total.
    pub violation: Option<ProtocolViolation>,
}

/// Keyed fragment buffer with idle-timeout eviction.
#[derive(Debug)]
pub struct Reassembler {
    timeout: Duration,
    max_fragments: NonZeroU32,
    sets: HashMap<FragmentKey, FragmentSet>,
}

impl Reassembler {
    /// Create a buffer that evicts sets idle for `timeout` and refuses sets
    /// declaring more than `max_fragments` slots.
    #[must_use]
    pub fn new(timeout: Duration, max_fragments: NonZeroU32) -> Self {
        Self {
            timeout,
            max_fragments,
            sets: HashMap::new(),
        }
    }

    /// Process a fragment using the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError`] when the header does not describe a valid
    /// slot. Rejected fragments leave every buffered set untouched.
    pub fn push(
        &mut self,
        key: FragmentKey,
        header: FragmentHeader,
        body: String,
    ) -> Result<PushOutcome, ReassemblyError> {
        self.push_at(key, header, body, Instant::now())
    }

    /// Process a fragment using an explicit clock reading.
    ///
    /// Writing a slot that is already filled overwrites it. When the last
    /// empty slot is filled the set is joined, removed and returned in
    /// [`PushOutcome::completed`], so each set completes exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError`] when the header does not describe a valid
    /// slot.
    pub fn push_at(
        &mut self,
        key: FragmentKey,
        header: FragmentHeader,
        body: String,
        now: Instant,
    ) -> Result<PushOutcome, ReassemblyError> {
        self.validate(&key, header)?;

        let mut outcome = PushOutcome::default();
        let stale = self
            .sets
            .get(&key)
            .is_some_and(|set| set.total() != header.total() as usize);
        if stale && let Some(set) = self.sets.remove(&key) {
            outcome.violation = Some(ProtocolViolation {
                stale: DiscardedTransfer {
                    key: key.clone(),
                    received: set.filled(),
                    total: set.total(),
                    reason: DiscardReason::Superseded {
                        announced_total: header.total(),
                    },
                },
                announced_total: header.total(),
            });
        }

        let set = self
            .sets
            .entry(key.clone())
            .or_insert_with(|| FragmentSet::new(header.total(), now));
        if set.insert(header.index(), body, now) == SlotWrite::Overwritten {
            tracing::debug!(%key, index = %header.index(), "duplicate fragment overwrote slot");
        }

        if set.is_complete()
            && let Some(set) = self.sets.remove(&key)
        {
            let body = set.join()?;
            outcome.completed = Some(ReassembledPayload { key, body });
        }
        Ok(outcome)
    }

    /// Remove sets idle beyond the configured timeout.
    pub fn purge_expired(&mut self) -> Vec<DiscardedTransfer> {
        self.purge_expired_at(Instant::now())
    }

    /// Remove sets idle beyond the configured timeout using an explicit clock
    /// reading.
    pub fn purge_expired_at(&mut self, now: Instant) -> Vec<DiscardedTransfer> {
        let mut evicted = Vec::new();
        let timeout = self.timeout;

        self.sets.retain(|key, set| {
            let expired = set.idle_for(now) >= timeout;
            if expired {
                evicted.push(DiscardedTransfer {
                    key: key.clone(),
                    received: set.filled(),
                    total: set.total(),
                    reason: DiscardReason::IdleTimeout,
                });
            }
            !expired
        });

        evicted
    }

    /// Drop every buffered set, reporting each as discarded for `reason`.
    pub fn discard_all(&mut self, reason: DiscardReason) -> Vec<DiscardedTransfer> {
        self.sets
            .drain()
            .map(|(key, set)| DiscardedTransfer {
                key,
                received: set.filled(),
                total: set.total(),
                reason,
            })
            .collect()
    }

    /// Number of sets currently buffered.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.sets.len() }

    /// Return `(filled, total)` for the set under `key`, if one is open.
    #[must_use]
    pub fn progress(&self, key: &FragmentKey) -> Option<(usize, usize)> {
        self.sets.get(key).map(|set| (set.filled(), set.total()))
    }

    fn validate(&self, key: &FragmentKey, header: FragmentHeader) -> Result<(), ReassemblyError> {
        let total = header.total();
        if total == 0 {
            return Err(ReassemblyError::ZeroTotal { key: key.clone() });
        }
        if total > self.max_fragments.get() {
            return Err(ReassemblyError::TooManyFragments {
                key: key.clone(),
                total,
                limit: self.max_fragments.get(),
            });
        }
        if !header.index().fits(total) {
            return Err(ReassemblyError::IndexOutOfRange {
                key: key.clone(),
                index: header.index(),
                total,
            });
        }
        Ok(())
    }
}
