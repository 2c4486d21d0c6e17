//! A module to handle `Reader`

mod builder;
pub(crate) mod parser;
pub(crate) mod source;

use std::io::Read;

use crate::errors::Result;
use crate::escape::EntityTable;
use crate::events::Event;

use self::parser::Parser;

pub use self::builder::ReaderBuilder;
pub use self::source::{SliceSource, StreamSource};

/// A low level XML pull reader.
///
/// Consumes bytes and produces a lazy sequence of [`Event`]s. `S` is the
/// input backend: [`SliceSource`] for complete in-memory documents (events
/// borrow from the input) or [`StreamSource`] for arbitrary [`Read`]
/// streams (events own their data).
///
/// # Examples
///
/// ```
/// use schema_xml::{Event, Reader};
///
/// let xml = r#"<playlist name="mix"><track title="one"/></playlist>"#;
/// let mut reader = Reader::from_str(xml);
/// let mut tracks = 0;
/// while let Some(event) = reader.next().unwrap() {
///     if let Event::Start(e) = event {
///         if e.name() == "track" {
///             tracks += 1;
///         }
///     }
/// }
/// assert_eq!(tracks, 1);
/// ```
pub struct Reader<S> {
    pub(crate) source: S,
    pub(crate) parser: Parser,
}

impl Reader<()> {
    /// Creates a new builder for configuring a reader.
    pub fn builder() -> ReaderBuilder {
        ReaderBuilder::new()
    }
}

impl<S> Reader<S> {
    /// Number of currently open elements.
    #[inline]
    pub fn depth(&self) -> usize {
        self.parser.depth()
    }

    /// Entities declared in the internal DTD subset so far.
    pub fn entities(&self) -> &EntityTable {
        self.parser.entities()
    }
}

impl<'i> Reader<SliceSource<'i>> {
    /// Creates a reader over a string slice using the default
    /// configuration.
    pub fn from_str(text: &'i str) -> Self {
        ReaderBuilder::new().into_str_reader(text)
    }

    /// Creates a reader over a byte slice using the default configuration.
    pub fn from_bytes(bytes: &'i [u8]) -> Self {
        ReaderBuilder::new().into_bytes_reader(bytes)
    }

    /// Reads the next event, borrowing from the input where possible.
    ///
    /// Returns `Ok(None)` after [`Event::DocumentEnd`] was delivered, and
    /// permanently after the first error.
    #[inline]
    pub fn next(&mut self) -> Result<Option<Event<'i>>> {
        self.parser.next(&mut self.source)
    }

    /// Gets the current byte position in the input data.
    ///
    /// Useful when debugging errors.
    pub fn buffer_position(&self) -> usize {
        self.source.offset()
    }
}

impl<R: Read> Reader<StreamSource<R>> {
    /// Creates a reader over a byte stream using the default
    /// configuration.
    pub fn from_reader(reader: R) -> Self {
        ReaderBuilder::new().into_reader(reader)
    }

    /// Reads the next event. Events from a stream own their data.
    ///
    /// Returns `Ok(None)` after [`Event::DocumentEnd`] was delivered, and
    /// permanently after the first error.
    #[inline]
    pub fn next(&mut self) -> Result<Option<Event<'static>>> {
        self.parser.next(&mut self.source)
    }

    /// Gets the current byte position in the input data.
    ///
    /// Useful when debugging errors.
    pub fn buffer_position(&self) -> usize {
        self.source.offset()
    }
}

/// A memory-mapped XML file.
///
/// The mapping behaves exactly like an in-memory slice: readers created
/// from it hand out events that borrow from the mapped pages. The mapping
/// is released when this value is dropped, which invalidates every reader
/// borrowed from it — the borrow checker enforces the teardown order.
///
/// # Examples
///
/// ```no_run
/// use schema_xml::MmapXml;
///
/// let file = MmapXml::open("catalog.xml").unwrap();
/// let mut reader = file.reader();
/// while let Some(event) = reader.next().unwrap() {
///     // ...
/// }
/// ```
#[cfg(feature = "mmap")]
pub struct MmapXml {
    map: memmap2::Mmap,
}

#[cfg(feature = "mmap")]
impl MmapXml {
    /// Maps the file at `path`.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        // Safety: the mapping is read-only; the file must not be truncated
        // while mapped.
        let map = unsafe { memmap2::Mmap::map(&file)? };
        Ok(Self { map })
    }

    /// The mapped document bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.map
    }

    /// Creates a reader over the mapping with the default configuration.
    pub fn reader(&self) -> Reader<SliceSource<'_>> {
        Reader::from_bytes(&self.map)
    }

    /// Creates a reader over the mapping with the given configuration.
    pub fn reader_with(&self, builder: ReaderBuilder) -> Reader<SliceSource<'_>> {
        builder.into_bytes_reader(&self.map)
    }
}

/// A function to check whether the byte is a whitespace (blank, new line,
/// carriage return or tab).
#[inline]
pub(crate) fn is_whitespace(b: u8) -> bool {
    match b {
        b' ' | b'\r' | b'\n' | b'\t' => true,
        _ => false,
    }
}
