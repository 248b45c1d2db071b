//! Position of a fragment within a chunked payload (the `chunkIndex` field).

use derive_more::{Display, From};

/// Zero-based slot a fragment fills.
///
/// ```
/// use chatframe::fragment::FragmentIndex;
/// assert_eq!(FragmentIndex::new(3).as_usize(), 3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
#[display("{_0}")]
pub struct FragmentIndex(u32);

impl FragmentIndex {
    #[must_use]
    pub const fn new(value: u32) -> Self { Self(value) }

    /// First slot of every set.
    #[must_use]
    pub const fn zero() -> Self { Self(0) }

    #[must_use]
    pub const fn get(self) -> u32 { self.0 }

    /// Slot position for indexing into a set's buffer.
    #[must_use]
    pub const fn as_usize(self) -> usize { self.0 as usize }

    /// Whether this index addresses a slot of a `total`-slot set.
    #[must_use]
    pub const fn fits(self, total: u32) -> bool { self.0 < total }
}

impl From<FragmentIndex> for u32 {
    fn from(value: FragmentIndex) -> Self { value.0 }
}
