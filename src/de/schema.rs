//! Declarative record schemas and their ahead-of-time validation.
//!
//! A [`RecordSchema`] is the runtime table the dispatcher walks while
//! binding a document: it names every field, how it binds (attribute,
//! child element, nested record, iterator), optional XML name overrides
//! and default values. Schemas are plain statics, so a record type's
//! schema lives next to its [`FromXml`](super::FromXml) impl.
//!
//! [`RecordSchema::validate`] runs once per root schema before any parsing
//! and rejects schemas the dispatcher cannot execute.

use crate::errors::SchemaError;

/// Maximum number of fields the dispatcher tracks per record.
pub(crate) const MAX_FIELDS: usize = 128;

/// A record: an ordered set of typed fields.
#[derive(Debug)]
pub struct RecordSchema {
    /// Record name used in diagnostics.
    pub name: &'static str,
    /// Fields in declaration order.
    pub fields: &'static [Field],
    /// Per-field XML name overrides, `(field name, xml name)`.
    pub renames: &'static [(&'static str, &'static str)],
}

/// One field of a [`RecordSchema`].
#[derive(Debug)]
pub struct Field {
    /// Field name; also the XML name to match unless overridden.
    pub name: &'static str,
    pub kind: FieldKind,
    /// Literal applied through the field's conversion when the field is
    /// absent from the document.
    pub default: Option<&'static str>,
    /// Whether absence (after defaults) is an error.
    pub required: bool,
}

/// How a field binds to the document.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Primitive converted from an attribute value.
    Attribute,
    /// Primitive converted from a child element's character data.
    Element,
    /// Nested record, fully materialized.
    Record(&'static RecordSchema),
    /// Lazy iterator over child elements named `tag`.
    Iterator {
        tag: &'static str,
        item: &'static RecordSchema,
    },
    /// Lazy iterator over children matching any variant of a tagged
    /// variant schema.
    MultiIterator(&'static VariantSchema),
}

/// A tagged variant: the child record types a multi-iterator can yield.
#[derive(Debug)]
pub struct VariantSchema {
    /// Variant-set name used in diagnostics.
    pub name: &'static str,
    pub variants: &'static [Variant],
    /// Per-variant XML name overrides, `(variant name, xml name)`.
    pub renames: &'static [(&'static str, &'static str)],
}

/// One alternative of a [`VariantSchema`].
#[derive(Debug)]
pub struct Variant {
    /// Variant name; also the XML tag to match unless overridden.
    pub name: &'static str,
    pub record: &'static RecordSchema,
}

impl Field {
    /// A required primitive bound to an attribute.
    pub const fn attribute(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Attribute,
            default: None,
            required: true,
        }
    }

    /// A required primitive bound to a child element's text.
    pub const fn element(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Element,
            default: None,
            required: true,
        }
    }

    /// A required nested record bound to a child element.
    pub const fn record(name: &'static str, schema: &'static RecordSchema) -> Self {
        Self {
            name,
            kind: FieldKind::Record(schema),
            default: None,
            required: true,
        }
    }

    /// An iterator over child elements named `tag`, yielding `item`
    /// records.
    pub const fn iterator(
        name: &'static str,
        tag: &'static str,
        item: &'static RecordSchema,
    ) -> Self {
        Self {
            name,
            kind: FieldKind::Iterator { tag, item },
            default: None,
            required: false,
        }
    }

    /// An iterator over child elements matching any variant of `variants`.
    pub const fn multi(name: &'static str, variants: &'static VariantSchema) -> Self {
        Self {
            name,
            kind: FieldKind::MultiIterator(variants),
            default: None,
            required: false,
        }
    }

    /// Marks the field optional: absence binds nothing instead of failing.
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Declares a default, applied through the field's conversion when the
    /// field is absent. A defaulted field is never required.
    pub const fn with_default(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self.required = false;
        self
    }
}

impl RecordSchema {
    /// Whether this record owns part of the event stream through an
    /// iterator field.
    pub fn is_lazy(&self) -> bool {
        self.fields
            .iter()
            .any(|f| matches!(f.kind, FieldKind::Iterator { .. } | FieldKind::MultiIterator(_)))
    }

    /// The iterator field, if any.
    pub(crate) fn iterator_field(&self) -> Option<&'static Field> {
        self.fields
            .iter()
            .find(|f| matches!(f.kind, FieldKind::Iterator { .. } | FieldKind::MultiIterator(_)))
    }

    /// The XML name `field` matches against: its override if one is
    /// declared, its field name otherwise.
    pub(crate) fn xml_name(&self, field: &Field) -> &'static str {
        for (name, xml) in self.renames {
            if *name == field.name {
                return xml;
            }
        }
        field.name
    }

    /// Checks this schema and everything reachable from it.
    ///
    /// Rejected: more than one iterator field per record, a lazy record
    /// reachable from an eager one through nested record fields, name
    /// overrides that reference nothing, lazy multi-iterator variants, and
    /// records with more fields than the dispatcher tracks. Runs before
    /// any parsing; a violation is terminal for the schema.
    pub fn validate(&'static self) -> Result<(), SchemaError> {
        let mut visited = Vec::new();
        self.validate_record(&mut visited)
    }

    fn validate_record(
        &'static self,
        visited: &mut Vec<*const RecordSchema>,
    ) -> Result<(), SchemaError> {
        if visited.iter().any(|seen| std::ptr::eq(*seen, self)) {
            return Ok(());
        }
        visited.push(self);

        if self.fields.len() > MAX_FIELDS {
            return Err(SchemaError::TooManyFields { record: self.name });
        }
        let iterators = self
            .fields
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::Iterator { .. } | FieldKind::MultiIterator(_)))
            .count();
        if iterators > 1 {
            return Err(SchemaError::MultipleIterators { record: self.name });
        }
        for (key, _) in self.renames {
            if !self.fields.iter().any(|f| f.name == *key) {
                return Err(SchemaError::UnknownRename {
                    record: self.name,
                    name: key,
                });
            }
        }

        for field in self.fields {
            match field.kind {
                FieldKind::Record(schema) => {
                    if !self.is_lazy() && schema.reaches_lazy() {
                        return Err(SchemaError::LazyInsideEager {
                            record: self.name,
                            field: field.name,
                        });
                    }
                    schema.validate_record(visited)?;
                }
                FieldKind::Iterator { item, .. } => item.validate_record(visited)?,
                FieldKind::MultiIterator(variants) => {
                    for (key, _) in variants.renames {
                        if !variants.variants.iter().any(|v| v.name == *key) {
                            return Err(SchemaError::UnknownRename {
                                record: variants.name,
                                name: key,
                            });
                        }
                    }
                    for variant in variants.variants {
                        if variant.record.is_lazy() {
                            return Err(SchemaError::LazyVariant {
                                variant: variants.name,
                            });
                        }
                        variant.record.validate_record(visited)?;
                    }
                }
                FieldKind::Attribute | FieldKind::Element => {}
            }
        }
        Ok(())
    }

    /// Whether a lazy record is reachable through nested record fields.
    fn reaches_lazy(&'static self) -> bool {
        fn walk(record: &'static RecordSchema, seen: &mut Vec<*const RecordSchema>) -> bool {
            if seen.iter().any(|s| std::ptr::eq(*s, record)) {
                return false;
            }
            seen.push(record);
            if record.is_lazy() {
                return true;
            }
            record.fields.iter().any(|f| match f.kind {
                FieldKind::Record(schema) => walk(schema, seen),
                _ => false,
            })
        }
        walk(self, &mut Vec::new())
    }
}

impl VariantSchema {
    /// Finds the variant whose effective XML tag equals `tag`.
    pub(crate) fn variant_for(&self, tag: &str) -> Option<&'static Variant> {
        self.variants.iter().find(|v| self.xml_name(v) == tag)
    }

    fn xml_name(&self, variant: &Variant) -> &'static str {
        for (name, xml) in self.renames {
            if *name == variant.name {
                return xml;
            }
        }
        variant.name
    }
}
