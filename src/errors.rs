//! Error management module

use std::fmt;
use std::io;
use std::str::Utf8Error;

/// The error type used by this crate.
///
/// Every parse error is terminal for the reader that produced it: after an
/// `Err` is returned, further `next()` calls return `None`.
#[derive(Debug)]
pub enum Error {
    /// IO error from the underlying reader
    Io(io::Error),
    /// Input contains malformed UTF-8
    Utf8(Utf8Error),
    /// End of input reached inside the named construct
    UnexpectedEof(&'static str),
    /// A single token exceeded the configured scan ceiling
    TokenTooLarge,
    /// Markup that matches no recognized XML construct
    InvalidMarkup,
    /// `>` expected to finish a tag
    ExpectedClosingBracket,
    /// `=` expected between an attribute name and its value
    ExpectedEquals,
    /// `"` or `'` expected to open an attribute value
    ExpectedQuote,
    /// Attribute value not closed by its opening quote character
    UnterminatedAttributeValue,
    /// Comment without a closing `-->`
    UnterminatedComment,
    /// CDATA section without a closing `]]>`
    UnterminatedCData,
    /// Processing instruction without a closing `?>`
    UnterminatedProcessingInstruction,
    /// DOCTYPE declaration without a closing `>`
    UnterminatedDoctype,
    /// `<?xml ...?>` declaration that could not be parsed
    InvalidXmlDeclaration,
    /// DOCTYPE declaration that could not be parsed
    InvalidDoctype,
    /// Element or attribute name that is empty or starts with an invalid byte
    InvalidElementName,
    /// Closing tag does not match the currently open element
    MismatchedTags {
        /// Name of the open element
        expected: String,
        /// Name found in the closing tag
        found: String,
    },
    /// Closing tag encountered while no element is open
    UnmatchedClosingTag,
    /// Element nesting exceeded the configured depth bound
    TooManyNestedElements,
    /// A single element carried more attributes than the configured cap
    TooManyAttributes,
    /// A schema field that is neither optional nor defaulted was absent
    MissingRequiredField(&'static str),
    /// An element appeared where character data was expected
    UnexpectedElement(String),
    /// A lazy record declared fields other than attributes and its iterator
    LazyRecordFields,
    /// The document ended before a root element was found
    NoRootElement,
    /// Text could not be converted to the requested integer type
    InvalidInteger(String),
    /// Text could not be converted to a floating point value
    InvalidFloat(String),
    /// Boolean text was something other than `true` or `false`
    InvalidBoolean(String),
    /// Error raised by a user-defined text conversion
    Convert(String),
    /// Schema rejected by validation before parsing started
    Schema(SchemaError),
}

impl Error {
    /// Builds a [`Error::Convert`] from anything printable. Intended for
    /// user-defined [`FromText`](crate::de::FromText) implementations.
    pub fn convert<T: fmt::Display>(message: T) -> Self {
        Error::Convert(message.to_string())
    }
}

impl From<io::Error> for Error {
    /// Creates a new `Error::Io` from the given error
    #[inline]
    fn from(error: io::Error) -> Error {
        Error::Io(error)
    }
}

impl From<Utf8Error> for Error {
    /// Creates a new `Error::Utf8` from the given error
    #[inline]
    fn from(error: Utf8Error) -> Error {
        Error::Utf8(error)
    }
}

impl From<SchemaError> for Error {
    #[inline]
    fn from(error: SchemaError) -> Error {
        Error::Schema(error)
    }
}

/// A specialized `Result` type where the error is hard-wired to [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Utf8(e) => write!(f, "UTF-8 error: {}", e),
            Error::UnexpectedEof(what) => write!(f, "unexpected end of input inside {}", what),
            Error::TokenTooLarge => write!(f, "token exceeds the configured scan ceiling"),
            Error::InvalidMarkup => write!(f, "unrecognized markup"),
            Error::ExpectedClosingBracket => write!(f, "expected `>`"),
            Error::ExpectedEquals => write!(f, "expected `=` after attribute name"),
            Error::ExpectedQuote => write!(f, "expected `\"` or `'` to open attribute value"),
            Error::UnterminatedAttributeValue => write!(f, "unterminated attribute value"),
            Error::UnterminatedComment => write!(f, "comment is missing `-->`"),
            Error::UnterminatedCData => write!(f, "CDATA section is missing `]]>`"),
            Error::UnterminatedProcessingInstruction => {
                write!(f, "processing instruction is missing `?>`")
            }
            Error::UnterminatedDoctype => write!(f, "DOCTYPE is missing `>`"),
            Error::InvalidXmlDeclaration => write!(f, "malformed XML declaration"),
            Error::InvalidDoctype => write!(f, "malformed DOCTYPE declaration"),
            Error::InvalidElementName => write!(f, "invalid element or attribute name"),
            Error::MismatchedTags { expected, found } => {
                write!(f, "expected `</{}>`, found `</{}>`", expected, found)
            }
            Error::UnmatchedClosingTag => write!(f, "closing tag without an open element"),
            Error::TooManyNestedElements => write!(f, "element nesting exceeds the depth bound"),
            Error::TooManyAttributes => write!(f, "element exceeds the attribute cap"),
            Error::MissingRequiredField(field) => {
                write!(f, "required field `{}` is missing", field)
            }
            Error::UnexpectedElement(tag) => {
                write!(f, "unexpected element `<{}>` in character data", tag)
            }
            Error::LazyRecordFields => write!(
                f,
                "lazy records may only declare attribute fields beside their iterator"
            ),
            Error::NoRootElement => write!(f, "document has no root element"),
            Error::InvalidInteger(text) => write!(f, "`{}` is not a valid integer", text),
            Error::InvalidFloat(text) => write!(f, "`{}` is not a valid float", text),
            Error::InvalidBoolean(text) => write!(f, "`{}` is not `true` or `false`", text),
            Error::Convert(message) => write!(f, "conversion failed: {}", message),
            Error::Schema(e) => write!(f, "schema error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Utf8(e) => Some(e),
            _ => None,
        }
    }
}

/// Schema-definition errors reported by [`RecordSchema::validate`] before
/// any parsing is attempted.
///
/// [`RecordSchema::validate`]: crate::de::RecordSchema::validate
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A record declares more than one iterator or multi-iterator field
    MultipleIterators {
        /// Name of the offending record
        record: &'static str,
    },
    /// An eager record transitively contains a lazy record
    LazyInsideEager {
        /// Name of the eager ancestor
        record: &'static str,
        /// Name of the field leading to the lazy descendant
        field: &'static str,
    },
    /// A name override references no field of its record (or no variant of
    /// its tagged variant)
    UnknownRename {
        /// Name of the record or tagged variant carrying the override table
        record: &'static str,
        /// The key that matched nothing
        name: &'static str,
    },
    /// A multi-iterator variant references a lazy record
    LazyVariant {
        /// Name of the tagged variant
        variant: &'static str,
    },
    /// A record declares more fields than the dispatcher tracks
    TooManyFields {
        /// Name of the offending record
        record: &'static str,
    },
    /// An iterator handle was requested with an item type that is not the
    /// one declared in the schema
    IteratorMismatch {
        /// Name of the record owning the iterator field
        record: &'static str,
    },
    /// A record access was parsed with a type whose schema is not the one
    /// the access was built for
    RecordMismatch {
        /// Name of the record the caller tried to parse
        record: &'static str,
    },
    /// A lazy entry point was used with an eager record
    ExpectedLazy {
        /// Name of the record
        record: &'static str,
    },
    /// An eager entry point was used with a lazy record
    ExpectedEager {
        /// Name of the record
        record: &'static str,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SchemaError::MultipleIterators { record } => {
                write!(f, "record `{}` declares more than one iterator field", record)
            }
            SchemaError::LazyInsideEager { record, field } => write!(
                f,
                "eager record `{}` reaches a lazy record through field `{}`",
                record, field
            ),
            SchemaError::UnknownRename { record, name } => {
                write!(f, "`{}` renames unknown field `{}`", record, name)
            }
            SchemaError::LazyVariant { variant } => {
                write!(f, "tagged variant `{}` references a lazy record", variant)
            }
            SchemaError::TooManyFields { record } => {
                write!(f, "record `{}` declares too many fields", record)
            }
            SchemaError::IteratorMismatch { record } => write!(
                f,
                "iterator item type does not match the schema of record `{}`",
                record
            ),
            SchemaError::RecordMismatch { record } => write!(
                f,
                "record `{}` does not match the schema this access was built for",
                record
            ),
            SchemaError::ExpectedLazy { record } => {
                write!(f, "record `{}` is eager; use an eager entry point", record)
            }
            SchemaError::ExpectedEager { record } => {
                write!(f, "record `{}` is lazy; use a lazy entry point", record)
            }
        }
    }
}

impl std::error::Error for SchemaError {}
