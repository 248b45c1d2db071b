//! The `chunkIndex`/`chunkTotal` pair carried by every fragment.

use super::FragmentIndex;

/// Position of one fragment within its chunked payload.
///
/// On the wire this is the `chunkIndex`/`chunkTotal` pair. The header does
/// not check that `index < total`; the [`Reassembler`](super::Reassembler)
/// enforces that when the fragment is buffered.
///
/// # Examples
///
/// ```
/// use chatframe::fragment::{FragmentHeader, FragmentIndex};
/// let header = FragmentHeader::new(FragmentIndex::new(2), 3);
/// assert_eq!(header.index().get(), 2);
/// assert_eq!(header.total(), 3);
/// assert!(header.is_last());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FragmentHeader {
    index: FragmentIndex,
    total: u32,
}

impl FragmentHeader {
    /// Create a new fragment header.
    #[must_use]
    pub const fn new(index: FragmentIndex, total: u32) -> Self { Self { index, total } }

    /// Return the zero-based fragment position.
    #[must_use]
    pub const fn index(&self) -> FragmentIndex { self.index }

    /// Return the number of fragments the payload was split into.
    #[must_use]
    pub const fn total(&self) -> u32 { self.total }

    /// Report whether this is the final fragment of its payload.
    #[must_use]
    pub const fn is_last(&self) -> bool { self.index.get().saturating_add(1) == self.total }
}
