use std::io::Read;

use crate::reader::parser::Parser;
use crate::reader::source::{SliceSource, StreamSource};
use crate::reader::Reader;

/// Builder for configuring a new [`Reader`].
///
/// ```
/// use schema_xml::{Reader, Event};
///
/// let mut reader = Reader::builder()
///     .preserve_whitespace(true)
///     .into_str_reader("<a> </a>");
/// assert_eq!(reader.next().unwrap(), Some(Event::DocumentStart));
/// ```
#[derive(Debug, Clone)]
pub struct ReaderBuilder {
    pub(crate) preserve_whitespace: bool,
    pub(crate) resolve_entities: bool,
    pub(crate) max_depth: usize,
    pub(crate) max_attributes: usize,
    pub(crate) token_limit: usize,
}

impl Default for ReaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderBuilder {
    /// Creates a builder holding the default configuration.
    pub fn new() -> Self {
        Self {
            preserve_whitespace: false,
            resolve_entities: true,
            max_depth: 256,
            max_attributes: 1024,
            token_limit: 16 * 1024 * 1024,
        }
    }

    /// Changes whether whitespace-only runs between markup are reported.
    ///
    /// When set to `true`, every whitespace-only run of character data is
    /// emitted as a [`Whitespace`] event. When set to `false`, such runs
    /// produce no event at all.
    ///
    /// Attribute values are never affected by this option.
    ///
    /// (`false` by default)
    ///
    /// [`Whitespace`]: crate::Event::Whitespace
    pub fn preserve_whitespace(mut self, val: bool) -> Self {
        self.preserve_whitespace = val;
        self
    }

    /// Changes whether `&...;` references in text and attribute values are
    /// resolved.
    ///
    /// When set to `false`, references pass through literally and entity
    /// substitution becomes the identity.
    ///
    /// (`true` by default)
    pub fn resolve_entities(mut self, val: bool) -> Self {
        self.resolve_entities = val;
        self
    }

    /// Changes the bound on element nesting depth. A start tag that would
    /// open a deeper element fails with [`TooManyNestedElements`].
    ///
    /// (`256` by default)
    ///
    /// [`TooManyNestedElements`]: crate::Error::TooManyNestedElements
    pub fn max_depth(mut self, val: usize) -> Self {
        self.max_depth = val;
        self
    }

    /// Changes the per-element attribute cap. An element carrying more
    /// attributes fails with [`TooManyAttributes`].
    ///
    /// The default is deliberately generous; real-world documents (large
    /// SVGs in particular) blow well past small caps.
    ///
    /// (`1024` by default)
    ///
    /// [`TooManyAttributes`]: crate::Error::TooManyAttributes
    pub fn max_attributes(mut self, val: usize) -> Self {
        self.max_attributes = val;
        self
    }

    /// Changes the per-token scan ceiling in bytes. A single name, text
    /// run, comment, CDATA section or attribute value longer than this
    /// fails with [`TokenTooLarge`].
    ///
    /// (16 MiB by default)
    ///
    /// [`TokenTooLarge`]: crate::Error::TokenTooLarge
    pub fn token_limit(mut self, val: usize) -> Self {
        self.token_limit = val;
        self
    }

    /// Builds a [`Reader`] over a string slice.
    pub fn into_str_reader(self, text: &str) -> Reader<SliceSource<'_>> {
        self.into_bytes_reader(text.as_bytes())
    }

    /// Builds a [`Reader`] over a byte slice.
    pub fn into_bytes_reader(self, bytes: &[u8]) -> Reader<SliceSource<'_>> {
        Reader {
            source: SliceSource::new(bytes),
            parser: Parser::from_builder(&self),
        }
    }

    /// Builds a [`Reader`] over a byte stream.
    pub fn into_reader<R: Read>(self, reader: R) -> Reader<StreamSource<R>> {
        Reader {
            source: StreamSource::new(reader),
            parser: Parser::from_builder(&self),
        }
    }
}
