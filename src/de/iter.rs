//! Lazy records and the iterator handles that drive them.
//!
//! A [`LazyRecord`] owns the event stream between its element's start and
//! end tags. Its iterator handles borrow the record mutably, which pins
//! consumption depth-first: an outer handle cannot advance while an inner
//! one is alive. Abandoning an inner handle is allowed — the next outer
//! advance first skips to the close of the abandoned scope.

use std::marker::PhantomData;

use crate::de::schema::{Field, FieldKind, RecordSchema, VariantSchema};
use crate::de::{skip_to_depth, EventRead, FromXml, FromXmlVariant, RecordAccess};
use crate::errors::{Error, Result, SchemaError};
use crate::events::{Event, StartElement};

/// A lazy record: its bound attribute fields plus exclusive access to the
/// part of the document its element encloses.
pub struct LazyRecord<'r, 'xml, R: EventRead<'xml>, T> {
    /// The record value with every attribute field bound.
    pub value: T,
    reader: &'r mut R,
    schema: &'static RecordSchema,
    depth: usize,
    marker: PhantomData<&'xml str>,
}

impl<'r, 'xml, R: EventRead<'xml>, T> LazyRecord<'r, 'xml, R, T> {
    pub(crate) fn new(
        value: T,
        reader: &'r mut R,
        schema: &'static RecordSchema,
        depth: usize,
    ) -> Self {
        Self {
            value,
            reader,
            schema,
            depth,
            marker: PhantomData,
        }
    }

    fn iterator_field(&self) -> Result<&'static Field> {
        match self.schema.iterator_field() {
            Some(field) => Ok(field),
            None => Err(SchemaError::ExpectedLazy {
                record: self.schema.name,
            }
            .into()),
        }
    }

    /// The iterator handle over this record's `Iterator(tag, I)` field.
    ///
    /// `I` must be the item type declared in the schema.
    pub fn items<I: FromXml<'xml>>(&mut self) -> Result<Children<'_, 'xml, R, I>> {
        let field = self.iterator_field()?;
        match field.kind {
            FieldKind::Iterator { tag, item } if std::ptr::eq(item, I::schema()) => {
                Ok(Children::new(&mut *self.reader, tag, self.depth))
            }
            _ => Err(SchemaError::IteratorMismatch {
                record: self.schema.name,
            }
            .into()),
        }
    }

    /// The iterator handle over this record's `MultiIterator(V)` field.
    ///
    /// `V` must be the tagged variant declared in the schema.
    pub fn variants<V: FromXmlVariant<'xml>>(&mut self) -> Result<VariantChildren<'_, 'xml, R, V>> {
        let field = self.iterator_field()?;
        match field.kind {
            FieldKind::MultiIterator(variants) if std::ptr::eq(variants, V::schema()) => {
                Ok(VariantChildren::new(&mut *self.reader, variants, self.depth))
            }
            _ => Err(SchemaError::IteratorMismatch {
                record: self.schema.name,
            }
            .into()),
        }
    }

    /// Consumes the rest of this record's element, abandoning whatever its
    /// iterator has not yielded.
    pub fn finish(self) -> Result<()> {
        debug_assert!(self.depth > 0);
        skip_to_depth(self.reader, self.depth - 1)
    }
}

/// Iterator handle over the children matched by an `Iterator(tag, I)`
/// field. Children are delivered in source order; children with other
/// tags are skipped subtree-wise.
pub struct Children<'p, 'xml, R: EventRead<'xml>, I> {
    reader: &'p mut R,
    tag: &'static str,
    depth: usize,
    done: bool,
    marker: PhantomData<fn(&'xml str) -> I>,
}

impl<'p, 'xml, R: EventRead<'xml>, I> Children<'p, 'xml, R, I> {
    pub(crate) fn new(reader: &'p mut R, tag: &'static str, depth: usize) -> Self {
        Self {
            reader,
            tag,
            depth,
            done: false,
            marker: PhantomData,
        }
    }

    /// Advances to the start tag of the next matching child, or consumes
    /// the parent's end tag and reports exhaustion.
    fn advance(&mut self) -> Result<Option<StartElement<'xml>>> {
        if self.done {
            return Ok(None);
        }
        // restore structural consistency after a partially consumed child
        skip_to_depth(self.reader, self.depth)?;
        loop {
            match self.reader.next_event()? {
                None => return Err(Error::UnexpectedEof("element")),
                Some(Event::End(_)) => {
                    self.done = true;
                    return Ok(None);
                }
                Some(Event::Start(start)) => {
                    if start.name() == self.tag {
                        return Ok(Some(start));
                    }
                    skip_to_depth(self.reader, self.depth)?;
                }
                Some(_) => {}
            }
        }
    }
}

impl<'p, 'xml, R: EventRead<'xml>, I: FromXml<'xml>> Children<'p, 'xml, R, I> {
    /// Yields the next matching child as a fully materialized record, or
    /// `None` once the parent element closes.
    pub fn next(&mut self) -> Result<Option<I>> {
        if I::schema().is_lazy() {
            return Err(SchemaError::ExpectedEager {
                record: I::schema().name,
            }
            .into());
        }
        match self.advance()? {
            Some(start) => {
                let (_, attributes) = start.into_parts();
                RecordAccess::new(&mut *self.reader, I::schema(), attributes)
                    .parse()
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    /// Yields the next matching child as a lazy record borrowing this
    /// handle, or `None` once the parent element closes.
    ///
    /// The borrow ties nested iteration depth-first: this handle cannot
    /// advance again until the returned record is dropped.
    pub fn next_lazy(&mut self) -> Result<Option<LazyRecord<'_, 'xml, R, I>>> {
        match self.advance()? {
            Some(start) => super::lazy_record(&mut *self.reader, start).map(Some),
            None => Ok(None),
        }
    }
}

/// Iterator handle over the children matched by a `MultiIterator(V)`
/// field. Source order is preserved across the variant tags; children
/// matching no variant are skipped subtree-wise.
pub struct VariantChildren<'p, 'xml, R: EventRead<'xml>, V> {
    reader: &'p mut R,
    schema: &'static VariantSchema,
    depth: usize,
    done: bool,
    marker: PhantomData<fn(&'xml str) -> V>,
}

impl<'p, 'xml, R: EventRead<'xml>, V: FromXmlVariant<'xml>> VariantChildren<'p, 'xml, R, V> {
    pub(crate) fn new(reader: &'p mut R, schema: &'static VariantSchema, depth: usize) -> Self {
        Self {
            reader,
            schema,
            depth,
            done: false,
            marker: PhantomData,
        }
    }

    /// Yields the next child matching any variant, or `None` once the
    /// parent element closes.
    pub fn next(&mut self) -> Result<Option<V>> {
        if self.done {
            return Ok(None);
        }
        skip_to_depth(self.reader, self.depth)?;
        loop {
            match self.reader.next_event()? {
                None => return Err(Error::UnexpectedEof("element")),
                Some(Event::End(_)) => {
                    self.done = true;
                    return Ok(None);
                }
                Some(Event::Start(start)) => match self.schema.variant_for(start.name()) {
                    Some(variant) => {
                        let (_, attributes) = start.into_parts();
                        let mut access =
                            RecordAccess::new(&mut *self.reader, variant.record, attributes);
                        let value = V::from_variant(variant.name, &mut access)?;
                        access.finish()?;
                        return Ok(Some(value));
                    }
                    None => skip_to_depth(self.reader, self.depth)?,
                },
                Some(_) => {}
            }
        }
    }
}
