//! Module for the [`Source`] trait and its two backends.
//!
//! A [`Source`] presents one lookahead/consume surface over two very
//! different backings. The slice backend wraps a contiguous in-memory
//! document (including memory-mapped files) and returns subslices of it,
//! which is what makes zero-copy events possible. The stream backend pulls
//! from any [`io::Read`] through an internal buffer; its lookahead is
//! volatile, so consumed bytes are handed out as owned copies.

use std::borrow::Cow;
use std::io::{self, Read};

use crate::errors::Result;

/// A restartable supply of document bytes with bounded lookahead.
///
/// # Parameters
/// - `'r`: lifetime of data that outlives the source's own borrows. For
///   [`SliceSource`] this is the lifetime of the input slice, and [`take`]
///   returns borrowed subslices of it. For [`StreamSource`] every durable
///   byte is an owned copy, so any `'r` can be chosen.
///
/// The contract between [`peek`] and [`take`]: a `take(n)` never extends
/// past the bytes a preceding `peek` returned, and data returned by `peek`
/// is only valid until the next call on the source.
///
/// [`peek`]: Source::peek
/// [`take`]: Source::take
pub(crate) trait Source<'r> {
    /// Returns up to `n` bytes without consuming them. A shorter slice
    /// signals end of input.
    fn peek(&mut self, n: usize) -> Result<&[u8]>;

    /// Returns the next byte without consuming it, or `None` at end of
    /// input.
    fn peek_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.peek(1)?.first().copied())
    }

    /// Consumes `n` bytes (clamped to the remaining input) and returns
    /// them durably.
    fn take(&mut self, n: usize) -> Result<Cow<'r, [u8]>>;

    /// Discards `n` bytes (clamped to the remaining input).
    fn toss(&mut self, n: usize) -> Result<()>;

    /// Number of bytes consumed so far. Useful when reporting errors.
    fn position(&self) -> usize;

    /// Re-borrows an already-consumed region by absolute position, or
    /// `None` when the backend cannot reach back (stream sources).
    fn retrieve(&self, start: usize, end: usize) -> Option<&'r [u8]>;
}

/// Source over a complete in-memory document. `peek`, `take` and
/// `retrieve` all return subslices of the input; nothing is ever copied.
#[derive(Debug, Clone)]
pub struct SliceSource<'i> {
    input: &'i [u8],
    pos: usize,
}

impl<'i> SliceSource<'i> {
    pub(crate) fn new(input: &'i [u8]) -> Self {
        Self { input, pos: 0 }
    }

    pub(crate) fn offset(&self) -> usize {
        self.pos
    }
}

impl<'i> Source<'i> for SliceSource<'i> {
    #[inline]
    fn peek(&mut self, n: usize) -> Result<&[u8]> {
        let end = (self.pos + n).min(self.input.len());
        Ok(&self.input[self.pos..end])
    }

    #[inline]
    fn take(&mut self, n: usize) -> Result<Cow<'i, [u8]>> {
        let input = self.input;
        let end = (self.pos + n).min(input.len());
        let bytes = &input[self.pos..end];
        self.pos = end;
        Ok(Cow::Borrowed(bytes))
    }

    #[inline]
    fn toss(&mut self, n: usize) -> Result<()> {
        self.pos = (self.pos + n).min(self.input.len());
        Ok(())
    }

    #[inline]
    fn position(&self) -> usize {
        self.pos
    }

    fn retrieve(&self, start: usize, end: usize) -> Option<&'i [u8]> {
        self.input.get(start..end)
    }
}

/// How many bytes to request from the underlying reader at a time.
const CHUNK: usize = 8 * 1024;

/// How much consumed prefix may accumulate before the buffer is compacted.
const COMPACT_AT: usize = 4 * CHUNK;

/// Source over an [`io::Read`] stream.
///
/// Maintains its own buffer so that `peek(n)` can offer arbitrary bounded
/// lookahead regardless of how the underlying reader chunks its data.
#[derive(Debug)]
pub struct StreamSource<R> {
    inner: R,
    buf: Vec<u8>,
    head: usize,
    consumed: usize,
    eof: bool,
}

impl<R: Read> StreamSource<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            head: 0,
            consumed: 0,
            eof: false,
        }
    }

    fn buffered(&self) -> usize {
        self.buf.len() - self.head
    }

    /// Pulls from the underlying reader until `n` bytes are buffered or
    /// end of input is reached.
    fn fill_to(&mut self, n: usize) -> Result<()> {
        if self.buffered() >= n || self.eof {
            return Ok(());
        }
        if self.head >= COMPACT_AT {
            self.buf.drain(..self.head);
            self.head = 0;
        }
        let mut chunk = [0u8; CHUNK];
        while self.buffered() < n {
            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(read) => self.buf.extend_from_slice(&chunk[..read]),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub(crate) fn offset(&self) -> usize {
        self.consumed
    }
}

impl<'r, R: Read> Source<'r> for StreamSource<R> {
    fn peek(&mut self, n: usize) -> Result<&[u8]> {
        self.fill_to(n)?;
        let end = self.head + n.min(self.buffered());
        Ok(&self.buf[self.head..end])
    }

    fn take(&mut self, n: usize) -> Result<Cow<'r, [u8]>> {
        self.fill_to(n)?;
        let end = self.head + n.min(self.buffered());
        let bytes = self.buf[self.head..end].to_vec();
        self.consumed += end - self.head;
        self.head = end;
        Ok(Cow::Owned(bytes))
    }

    fn toss(&mut self, n: usize) -> Result<()> {
        self.fill_to(n)?;
        let step = n.min(self.buffered());
        self.head += step;
        self.consumed += step;
        Ok(())
    }

    #[inline]
    fn position(&self) -> usize {
        self.consumed
    }

    fn retrieve(&self, _start: usize, _end: usize) -> Option<&'r [u8]> {
        None
    }
}
