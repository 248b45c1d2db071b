//! Outbound helper that splits large payloads into ordered fragments.
//!
//! [`Fragmenter`] chunks a string payload into pieces of at most
//! `max_chunk_size` characters, tagging each piece with a
//! [`FragmentHeader`]. Chunk boundaries always fall on `char` boundaries so
//! every fragment is valid UTF-8 on its own.

use std::num::NonZeroUsize;

use super::{FragmentHeader, FragmentIndex, FragmentationError};

/// Split `payload` into fragments of at most `max_chunk_size` characters.
///
/// An empty payload yields exactly one empty fragment.
///
/// # Errors
///
/// Returns [`FragmentationError::TooManyFragments`] if the payload needs more
/// than `u32::MAX` fragments.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use chatframe::fragment::split;
///
/// let batch = split("abcdefgh", NonZeroUsize::new(3).expect("non-zero")).expect("split");
/// let bodies: Vec<&str> = batch.fragments().iter().map(|f| f.body()).collect();
/// assert_eq!(bodies, ["abc", "def", "gh"]);
/// ```
pub fn split(
    payload: &str,
    max_chunk_size: NonZeroUsize,
) -> Result<FragmentBatch, FragmentationError> {
    Fragmenter::new(max_chunk_size).split(payload)
}

/// Splits payloads into fragment-sized pieces.
#[derive(Clone, Copy, Debug)]
pub struct Fragmenter {
    max_chunk_size: NonZeroUsize,
}

impl Fragmenter {
    /// Create a fragmenter that caps fragments at `max_chunk_size` characters.
    #[must_use]
    pub const fn new(max_chunk_size: NonZeroUsize) -> Self { Self { max_chunk_size } }

    /// Return the maximum fragment size in characters.
    #[must_use]
    pub const fn max_chunk_size(&self) -> NonZeroUsize { self.max_chunk_size }

    /// Split `payload` into an ordered batch of fragments.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::TooManyFragments`] if the fragment count
    /// does not fit in a `u32`.
    pub fn split(&self, payload: &str) -> Result<FragmentBatch, FragmentationError> {
        let chunks = chunk_bounds(payload, self.max_chunk_size.get());
        let count = chunks.len();
        let total =
            u32::try_from(count).map_err(|_| FragmentationError::TooManyFragments { count })?;

        let fragments = chunks
            .into_iter()
            .zip(0..total)
            .map(|(body, index)| {
                FragmentFrame::new(
                    FragmentHeader::new(FragmentIndex::new(index), total),
                    body.to_owned(),
                )
            })
            .collect();
        Ok(FragmentBatch::new(fragments))
    }
}

fn chunk_bounds(payload: &str, max: usize) -> Vec<&str> {
    let mut chunks = Vec::with_capacity(payload.len().div_ceil(max).max(1));
    let mut start = 0;
    let mut chars_in_chunk = 0;

    for (offset, _) in payload.char_indices() {
        if chars_in_chunk == max {
            chunks.push(&payload[start..offset]);
            start = offset;
            chars_in_chunk = 0;
        }
        chars_in_chunk += 1;
    }
    chunks.push(&payload[start..]);
    chunks
}

/// Metadata and body for a single outbound fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FragmentFrame {
    header: FragmentHeader,
    body: String,
}

impl FragmentFrame {
    /// Construct a new fragment frame.
    #[must_use]
    pub fn new(header: FragmentHeader, body: String) -> Self { Self { header, body } }

    /// Return the fragment header.
    #[must_use]
    pub fn header(&self) -> &FragmentHeader { &self.header }

    /// Return the fragment body.
    #[must_use]
    pub fn body(&self) -> &str { &self.body }

    /// Consume the frame, returning its components.
    #[must_use]
    pub fn into_parts(self) -> (FragmentHeader, String) { (self.header, self.body) }
}

/// Ordered fragments produced for a single payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FragmentBatch {
    fragments: Vec<FragmentFrame>,
}

impl FragmentBatch {
    fn new(fragments: Vec<FragmentFrame>) -> Self {
        debug_assert!(!fragments.is_empty(), "fragment batches must not be empty");
        Self { fragments }
    }

    /// Return the fragments as a slice, in index order.
    #[must_use]
    pub fn fragments(&self) -> &[FragmentFrame] { self.fragments.as_slice() }

    /// Number of fragments in the batch.
    #[expect(
        clippy::len_without_is_empty,
        reason = "batches are guaranteed non-empty"
    )]
    #[must_use]
    pub fn len(&self) -> usize { self.fragments.len() }

    /// Whether the payload required more than one fragment.
    #[must_use]
    pub fn is_fragmented(&self) -> bool { self.len() > 1 }

    /// Convert the batch into a fully populated slot sequence for
    /// [`join`](crate::fragment::join).
    #[must_use]
    pub fn into_slots(self) -> Vec<Option<String>> {
        self.fragments
            .into_iter()
            .map(|fragment| Some(fragment.body))
            .collect()
    }
}

impl IntoIterator for FragmentBatch {
    type Item = FragmentFrame;
    type IntoIter = std::vec::IntoIter<FragmentFrame>;

    fn into_iter(self) -> Self::IntoIter { self.fragments.into_iter() }
}
