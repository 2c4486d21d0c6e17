//! Schema-driven parsing: maps declarative record schemas onto the event
//! stream.
//!
//! A record type implements [`FromXml`]: it exposes its static
//! [`RecordSchema`] and binds field values delivered by a [`RecordAccess`].
//! The access object owns the traversal — it walks attributes, child
//! elements, defaults and the required-field check in schema order, so an
//! implementation is nothing more than a match on field names:
//!
//! ```
//! use std::borrow::Cow;
//! use schema_xml::de::{self, Field, FieldValue, FromText, FromXml, RecordAccess, RecordSchema};
//! use schema_xml::{EventRead, Result};
//!
//! struct Track<'xml> {
//!     title: Cow<'xml, str>,
//!     seconds: u32,
//! }
//!
//! static TRACK: RecordSchema = RecordSchema {
//!     name: "Track",
//!     fields: &[
//!         Field::attribute("title"),
//!         Field::attribute("seconds").with_default("0"),
//!     ],
//!     renames: &[],
//! };
//!
//! impl<'xml> FromXml<'xml> for Track<'xml> {
//!     fn schema() -> &'static RecordSchema {
//!         &TRACK
//!     }
//!
//!     fn from_record<R: EventRead<'xml>>(
//!         access: &mut RecordAccess<'_, 'xml, R>,
//!     ) -> Result<Self> {
//!         let mut title = None;
//!         let mut seconds = None;
//!         while let Some(field) = access.next_field()? {
//!             match field {
//!                 FieldValue::Text { field: "title", value } => {
//!                     title = Some(FromText::from_text(value)?)
//!                 }
//!                 FieldValue::Text { field: "seconds", value } => {
//!                     seconds = Some(u32::from_text(value)?)
//!                 }
//!                 _ => {}
//!             }
//!         }
//!         Ok(Track {
//!             title: de::required(title, "title")?,
//!             seconds: de::required(seconds, "seconds")?,
//!         })
//!     }
//! }
//!
//! let track: Track = de::from_str(r#"<track title="intro"/>"#).unwrap();
//! assert_eq!(track.title, "intro");
//! assert_eq!(track.seconds, 0);
//! ```
//!
//! Eager records are fully materialized; records declaring an iterator
//! field are *lazy* and parsed through [`parse_lazy`], which yields a
//! [`LazyRecord`] whose iterator handles advance the event stream on
//! demand.

mod iter;
mod schema;

use std::borrow::Cow;
use std::io::Read;

use crate::errors::{Error, Result, SchemaError};
use crate::events::attributes::Attribute;
use crate::events::{Event, StartElement};
use crate::reader::{Reader, SliceSource, StreamSource};

pub use self::iter::{Children, LazyRecord, VariantChildren};
pub use self::schema::{Field, FieldKind, RecordSchema, Variant, VariantSchema};

/// A source of events the dispatcher can drive: any [`Reader`].
///
/// `'xml` bounds the lifetime of borrowed strings inside events; stream
/// readers satisfy any choice of it because their events own their data.
pub trait EventRead<'xml> {
    /// Pulls the next event.
    fn next_event(&mut self) -> Result<Option<Event<'xml>>>;

    /// Number of currently open elements.
    fn depth(&self) -> usize;

    /// Consumes events until the innermost open element closes. Handles
    /// nested elements with the same name, since matching is by depth,
    /// not by tag. No-op when no element is open.
    fn read_to_end(&mut self) -> Result<()>
    where
        Self: Sized,
    {
        let target = self.depth().saturating_sub(1);
        skip_to_depth(self, target)
    }
}

impl<'xml> EventRead<'xml> for Reader<SliceSource<'xml>> {
    fn next_event(&mut self) -> Result<Option<Event<'xml>>> {
        self.next()
    }

    fn depth(&self) -> usize {
        Reader::depth(self)
    }
}

impl<'xml, R: Read> EventRead<'xml> for Reader<StreamSource<R>> {
    fn next_event(&mut self) -> Result<Option<Event<'xml>>> {
        self.next()
    }

    fn depth(&self) -> usize {
        Reader::depth(self)
    }
}

/// Conversion from entity-resolved character data to a field value.
///
/// Implemented for the primitive types a schema can bind; user types
/// implement it to hook their own conversion, propagating failures as
/// [`Error::convert`].
pub trait FromText<'xml>: Sized {
    fn from_text(text: Cow<'xml, str>) -> Result<Self>;
}

macro_rules! from_text_int {
    ($($int:ty)*) => {$(
        impl<'xml> FromText<'xml> for $int {
            fn from_text(text: Cow<'xml, str>) -> Result<Self> {
                let digits = text.trim();
                digits
                    .parse::<$int>()
                    .map_err(|_| Error::InvalidInteger(digits.to_string()))
            }
        }
    )*};
}

from_text_int!(u8 u16 u32 u64 usize i8 i16 i32 i64 isize);

macro_rules! from_text_float {
    ($($float:ty)*) => {$(
        impl<'xml> FromText<'xml> for $float {
            fn from_text(text: Cow<'xml, str>) -> Result<Self> {
                let digits = text.trim();
                digits
                    .parse::<$float>()
                    .map_err(|_| Error::InvalidFloat(digits.to_string()))
            }
        }
    )*};
}

from_text_float!(f32 f64);

impl<'xml> FromText<'xml> for bool {
    fn from_text(text: Cow<'xml, str>) -> Result<Self> {
        match text.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(Error::InvalidBoolean(other.to_string())),
        }
    }
}

impl<'xml> FromText<'xml> for Cow<'xml, str> {
    fn from_text(text: Cow<'xml, str>) -> Result<Self> {
        Ok(text)
    }
}

impl<'xml> FromText<'xml> for String {
    fn from_text(text: Cow<'xml, str>) -> Result<Self> {
        Ok(text.into_owned())
    }
}

/// A record bound to one element of the document.
///
/// Implementations bind the values a [`RecordAccess`] delivers; the
/// dispatcher owns matching, defaults, skipping and the required check.
/// The contract: drive [`RecordAccess::next_field`] until it returns
/// `None`.
pub trait FromXml<'xml>: Sized {
    /// The schema this type binds. Must be a single static so that schema
    /// identity can be checked by address.
    fn schema() -> &'static RecordSchema;

    fn from_record<R: EventRead<'xml>>(access: &mut RecordAccess<'_, 'xml, R>) -> Result<Self>;
}

/// A tagged variant bound by a multi-iterator.
pub trait FromXmlVariant<'xml>: Sized {
    fn schema() -> &'static VariantSchema;

    /// Builds the variant named `variant` (the schema name, not the XML
    /// tag) from its record access.
    fn from_variant<R: EventRead<'xml>>(
        variant: &'static str,
        access: &mut RecordAccess<'_, 'xml, R>,
    ) -> Result<Self>;
}

/// Unwraps a bound field, failing with [`Error::MissingRequiredField`].
///
/// The access already enforces the requirement for schema-required fields;
/// this keeps implementations free of `unwrap`.
pub fn required<T>(value: Option<T>, field: &'static str) -> Result<T> {
    value.ok_or(Error::MissingRequiredField(field))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Attributes,
    Children,
    Defaults(usize),
    Finished,
}

/// The dispatcher's traversal of one record element.
///
/// Created with the record's start element already consumed. Yields one
/// [`FieldValue`] per bound field: attributes first (in source order),
/// then matching child elements (in document order), then declared
/// defaults for absent fields. Unrecognized attributes are ignored;
/// unrecognized child elements are skipped subtree-wise. After the last
/// field, absent required fields fail with
/// [`Error::MissingRequiredField`].
pub struct RecordAccess<'r, 'xml, R: EventRead<'xml>> {
    reader: &'r mut R,
    schema: &'static RecordSchema,
    attrs: std::vec::IntoIter<Attribute<'xml>>,
    seen: u128,
    depth: usize,
    stage: Stage,
    attrs_only: bool,
}

/// One bound field delivered by [`RecordAccess::next_field`].
pub enum FieldValue<'a, 'xml, R: EventRead<'xml>> {
    /// An attribute value, a primitive child element's character data, or
    /// an applied default.
    Text {
        /// The schema field name (not the XML name).
        field: &'static str,
        value: Cow<'xml, str>,
    },
    /// A nested record element; parse it with
    /// [`RecordAccess::parse`].
    Record {
        /// The schema field name (not the XML name).
        field: &'static str,
        access: RecordAccess<'a, 'xml, R>,
    },
}

impl<'r, 'xml, R: EventRead<'xml>> RecordAccess<'r, 'xml, R> {
    fn with_stage(
        reader: &'r mut R,
        schema: &'static RecordSchema,
        attributes: Vec<Attribute<'xml>>,
        attrs_only: bool,
    ) -> Self {
        debug_assert!(schema.fields.len() <= schema::MAX_FIELDS);
        let depth = reader.depth();
        Self {
            reader,
            schema,
            attrs: attributes.into_iter(),
            seen: 0,
            depth,
            stage: Stage::Attributes,
            attrs_only,
        }
    }

    pub(crate) fn new(
        reader: &'r mut R,
        schema: &'static RecordSchema,
        attributes: Vec<Attribute<'xml>>,
    ) -> Self {
        Self::with_stage(reader, schema, attributes, false)
    }

    /// An access that binds attributes and defaults only, leaving the
    /// element's children to an iterator handle. Used for lazy records.
    pub(crate) fn attrs_only(
        reader: &'r mut R,
        schema: &'static RecordSchema,
        attributes: Vec<Attribute<'xml>>,
    ) -> Self {
        Self::with_stage(reader, schema, attributes, true)
    }

    /// The schema this access traverses.
    pub fn schema(&self) -> &'static RecordSchema {
        self.schema
    }

    /// Delivers the next bound field, or `None` once the record is
    /// complete.
    pub fn next_field<'a>(&'a mut self) -> Result<Option<FieldValue<'a, 'xml, R>>> {
        loop {
            match self.stage {
                Stage::Attributes => match self.attrs.next() {
                    Some(attr) => {
                        let (name, value) = attr.into_parts();
                        if let Some((index, field)) = self.find_attribute(&name) {
                            self.seen |= 1 << index;
                            return Ok(Some(FieldValue::Text {
                                field: field.name,
                                value,
                            }));
                        }
                        // unknown attributes are ignored
                    }
                    None => {
                        self.stage = if self.attrs_only {
                            Stage::Defaults(0)
                        } else {
                            Stage::Children
                        };
                    }
                },
                Stage::Children => {
                    // a sub-record the caller abandoned may have left its
                    // element open
                    skip_to_depth(self.reader, self.depth)?;
                    match self.reader.next_event()? {
                        None => return Err(Error::UnexpectedEof("record")),
                        Some(Event::End(_)) => self.stage = Stage::Defaults(0),
                        Some(Event::Start(start)) => match self.find_child(start.name()) {
                            Some((index, field)) => {
                                self.seen |= 1 << index;
                                if let FieldKind::Record(schema) = field.kind {
                                    let (_, attributes) = start.into_parts();
                                    let access = RecordAccess::new(
                                        &mut *self.reader,
                                        schema,
                                        attributes,
                                    );
                                    return Ok(Some(FieldValue::Record {
                                        field: field.name,
                                        access,
                                    }));
                                }
                                let value = read_text_content(self.reader)?;
                                return Ok(Some(FieldValue::Text {
                                    field: field.name,
                                    value,
                                }));
                            }
                            None => skip_to_depth(self.reader, self.depth)?,
                        },
                        Some(_) => {}
                    }
                }
                Stage::Defaults(from) => {
                    let fields = self.schema.fields;
                    for (index, field) in fields.iter().enumerate().skip(from) {
                        if self.seen & (1 << index) == 0 {
                            if let Some(default) = field.default {
                                self.stage = Stage::Defaults(index + 1);
                                self.seen |= 1 << index;
                                return Ok(Some(FieldValue::Text {
                                    field: field.name,
                                    value: Cow::Borrowed(default),
                                }));
                            }
                        }
                    }
                    for (index, field) in fields.iter().enumerate() {
                        if field.required && self.seen & (1 << index) == 0 {
                            return Err(Error::MissingRequiredField(field.name));
                        }
                    }
                    self.stage = Stage::Finished;
                    return Ok(None);
                }
                Stage::Finished => return Ok(None),
            }
        }
    }

    /// Parses this access into `T`, draining whatever the implementation
    /// left unconsumed.
    pub fn parse<T: FromXml<'xml>>(mut self) -> Result<T> {
        if !std::ptr::eq(self.schema, T::schema()) {
            return Err(SchemaError::RecordMismatch {
                record: T::schema().name,
            }
            .into());
        }
        let value = T::from_record(&mut self)?;
        self.finish()?;
        Ok(value)
    }

    /// Drives the traversal to completion, discarding unclaimed fields.
    pub(crate) fn finish(&mut self) -> Result<()> {
        while self.next_field()?.is_some() {}
        Ok(())
    }

    fn find_attribute(&self, xml_name: &str) -> Option<(usize, &'static Field)> {
        self.schema.fields.iter().enumerate().find(|(_, f)| {
            matches!(f.kind, FieldKind::Attribute) && self.schema.xml_name(f) == xml_name
        })
    }

    fn find_child(&self, tag: &str) -> Option<(usize, &'static Field)> {
        self.schema.fields.iter().enumerate().find(|(_, f)| {
            matches!(f.kind, FieldKind::Element | FieldKind::Record(_))
                && self.schema.xml_name(f) == tag
        })
    }
}

/// Consumes events until the reader is back at `depth` open elements.
pub(crate) fn skip_to_depth<'xml, R: EventRead<'xml>>(reader: &mut R, depth: usize) -> Result<()> {
    while reader.depth() > depth {
        if reader.next_event()?.is_none() {
            return Err(Error::UnexpectedEof("element"));
        }
    }
    Ok(())
}

/// Reads the character data of a primitive element through its end tag.
///
/// Text, CDATA and preserved whitespace concatenate; comments and
/// processing instructions are ignored; an empty element binds the empty
/// string; a nested element is an error.
fn read_text_content<'xml, R: EventRead<'xml>>(reader: &mut R) -> Result<Cow<'xml, str>> {
    let mut content: Option<Cow<'xml, str>> = None;
    loop {
        match reader.next_event()? {
            None => return Err(Error::UnexpectedEof("element")),
            Some(Event::End(_)) => break,
            Some(Event::Text(t)) | Some(Event::CData(t)) | Some(Event::Whitespace(t)) => {
                match &mut content {
                    None => content = Some(t.into_content()),
                    Some(acc) => acc.to_mut().push_str(t.content()),
                }
            }
            Some(Event::Start(element)) => {
                return Err(Error::UnexpectedElement(element.name().to_string()))
            }
            Some(_) => {}
        }
    }
    Ok(content.unwrap_or(Cow::Borrowed("")))
}

/// Skips events until the root element's start tag.
fn root_element<'xml, R: EventRead<'xml>>(reader: &mut R) -> Result<StartElement<'xml>> {
    loop {
        match reader.next_event()? {
            None => return Err(Error::NoRootElement),
            Some(Event::Start(start)) => return Ok(start),
            Some(Event::DocumentEnd) => return Err(Error::NoRootElement),
            Some(_) => {}
        }
    }
}

/// Builds a lazy record from its already-consumed start element.
fn lazy_record<'r, 'xml, R, T>(
    reader: &'r mut R,
    start: StartElement<'xml>,
) -> Result<LazyRecord<'r, 'xml, R, T>>
where
    R: EventRead<'xml>,
    T: FromXml<'xml>,
{
    let schema = T::schema();
    if !schema.is_lazy() {
        return Err(SchemaError::ExpectedLazy {
            record: schema.name,
        }
        .into());
    }
    if schema
        .fields
        .iter()
        .any(|f| matches!(f.kind, FieldKind::Element | FieldKind::Record(_)))
    {
        return Err(Error::LazyRecordFields);
    }

    let depth = reader.depth();
    let (_, attributes) = start.into_parts();
    let value = {
        let mut access = RecordAccess::attrs_only(&mut *reader, schema, attributes);
        let value = T::from_record(&mut access)?;
        access.finish()?;
        value
    };
    Ok(LazyRecord::new(value, reader, schema, depth))
}

/// Parses an eager root record from any event reader.
///
/// Validates the schema first; use this with a configured [`Reader`] when
/// the default configuration is not enough.
pub fn parse_root<'xml, T, R>(reader: &mut R) -> Result<T>
where
    T: FromXml<'xml>,
    R: EventRead<'xml>,
{
    T::schema().validate()?;
    if T::schema().is_lazy() {
        return Err(SchemaError::ExpectedEager {
            record: T::schema().name,
        }
        .into());
    }
    let start = root_element(reader)?;
    let (_, attributes) = start.into_parts();
    RecordAccess::new(reader, T::schema(), attributes).parse()
}

/// Parses a lazy root record from any event reader.
///
/// The returned [`LazyRecord`] holds the bound attribute fields and
/// borrows the reader exclusively; its iterator handles advance the
/// document on demand.
pub fn parse_lazy<'r, 'xml, T, R>(reader: &'r mut R) -> Result<LazyRecord<'r, 'xml, R, T>>
where
    T: FromXml<'xml>,
    R: EventRead<'xml>,
{
    T::schema().validate()?;
    let start = root_element(reader)?;
    lazy_record(reader, start)
}

/// Parses an eager root record from a string slice.
pub fn from_str<'xml, T: FromXml<'xml>>(text: &'xml str) -> Result<T> {
    from_slice(text.as_bytes())
}

/// Parses an eager root record from a byte slice. String fields borrow
/// from the input wherever no entity resolution took place.
pub fn from_slice<'xml, T: FromXml<'xml>>(bytes: &'xml [u8]) -> Result<T> {
    let mut reader = Reader::from_bytes(bytes);
    parse_root(&mut reader)
}

/// Parses an eager root record from a byte stream. Every string field
/// owns its data.
pub fn from_reader<T, R>(input: R) -> Result<T>
where
    T: FromXml<'static>,
    R: Read,
{
    let mut reader = Reader::from_reader(input);
    parse_root(&mut reader)
}
