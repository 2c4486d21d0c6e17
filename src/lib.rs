//! Schema-driven streaming XML pull parser with zero-copy reads.
//!
//! Two layers:
//!
//! - A low-level pull [`Reader`] producing a lazy sequence of [`Event`]s.
//!   Over in-memory input (slices and memory-mapped files) event strings
//!   borrow straight from the document; over byte streams they own their
//!   data. Internal storage is stack-scoped, so peak memory follows
//!   element nesting depth rather than document size.
//! - A schema layer ([`de`]) that binds declarative record schemas to the
//!   event stream: typed attribute and element fields, defaults, name
//!   overrides, and lazy iterator fields that advance the underlying
//!   reader on demand.
//!
//! # Pull parsing
//!
//! ```
//! use schema_xml::{Event, Reader};
//!
//! let xml = r#"<catalog><book id="1">Ferris &amp; friends</book></catalog>"#;
//! let mut reader = Reader::from_str(xml);
//! let mut titles = Vec::new();
//! while let Some(event) = reader.next().unwrap() {
//!     if let Event::Text(text) = event {
//!         titles.push(text.content().to_string());
//!     }
//! }
//! assert_eq!(titles, ["Ferris & friends"]);
//! ```
//!
//! # Schema parsing
//!
//! See the [`de`] module documentation for declaring records and binding
//! them eagerly or lazily.
//!
//! # Features
//!
//! - `mmap` (default): memory-mapped file input via [`MmapXml`].
#![cfg_attr(
    feature = "document-features",
    cfg_attr(doc, doc = ::document_features::document_features!())
)]

mod arena;
pub mod de;
mod errors;
pub mod escape;
pub mod events;
mod reader;

pub use crate::de::EventRead;
pub use crate::errors::{Error, Result, SchemaError};
pub use crate::escape::EntityTable;
pub use crate::events::Event;
#[cfg(feature = "mmap")]
pub use crate::reader::MmapXml;
pub use crate::reader::{Reader, ReaderBuilder, SliceSource, StreamSource};
