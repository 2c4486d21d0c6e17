//! Stack-scoped byte storage.
//!
//! XML structure is stack shaped: everything that belongs to an open element
//! dies when that element closes. [`Arena`] exploits that by handing out
//! positions into one growable buffer and releasing whole suffixes at once.
//! Callers take a [`Mark`] before storing element-scoped data and wind the
//! arena back to it when the element closes, so peak occupancy tracks the
//! nesting depth of the document, not its size.
//!
//! Stored data is addressed by [`Span`] (plain indices) rather than by
//! pointer, which keeps spans valid across buffer growth.

/// A position in the arena, used to bound a later [`Arena::reset_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Mark(usize);

/// An index range addressing bytes stored in the arena.
///
/// Spans survive buffer reallocation but are invalidated by any
/// [`Arena::reset_to`] that unwinds past their origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    start: usize,
    end: usize,
}

/// A growable byte buffer with an explicit top-of-stack position.
#[derive(Debug, Default)]
pub(crate) struct Arena {
    buf: Vec<u8>,
}

impl Arena {
    pub(crate) fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Records the current top of stack.
    #[inline]
    pub(crate) fn mark(&self) -> Mark {
        Mark(self.buf.len())
    }

    /// Logically frees everything stored after `mark` was taken.
    ///
    /// The underlying buffer keeps its capacity. Spans produced after the
    /// mark must not be resolved once this returns.
    #[inline]
    pub(crate) fn reset_to(&mut self, mark: Mark) {
        debug_assert!(mark.0 <= self.buf.len());
        self.buf.truncate(mark.0);
    }

    /// Appends a copy of `bytes` and returns its span.
    pub(crate) fn store(&mut self, bytes: &[u8]) -> Span {
        let start = self.buf.len();
        self.buf.extend_from_slice(bytes);
        Span {
            start,
            end: self.buf.len(),
        }
    }

    /// Resolves a span against the buffer.
    #[inline]
    pub(crate) fn get(&self, span: Span) -> &[u8] {
        &self.buf[span.start..span.end]
    }

    /// Current occupancy in bytes.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }
}
