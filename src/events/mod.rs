//! Definitions of the events produced by the pull parser.
//!
//! Every string inside an event is a `Cow<str>`: readers over in-memory
//! slices (including memory-mapped files) borrow straight from the input
//! whenever no entity resolution took place, while readers over byte
//! streams hand out owned copies. Consumers that must keep a borrowed
//! string past the closing tag of its element should copy it out.

pub mod attributes;

use std::borrow::Cow;

use crate::events::attributes::Attribute;

/// One unit in the lazy sequence produced by [`Reader::next`].
///
/// [`Reader::next`]: crate::Reader::next
#[derive(Debug, Clone, PartialEq)]
pub enum Event<'a> {
    /// Emitted once, on the first `next` call
    DocumentStart,
    /// Emitted once, when the input ends after the root element closed
    DocumentEnd,
    /// Start tag, `<name attr="value">`, or the opening half of `<name/>`
    Start(StartElement<'a>),
    /// End tag `</name>`, or the synthesized closing half of `<name/>`
    End(EndElement<'a>),
    /// Character data with entity references resolved (unless resolution
    /// is disabled); never whitespace-only
    Text(Text<'a>),
    /// A whitespace-only run between markup; only emitted when whitespace
    /// preservation is enabled
    Whitespace(Text<'a>),
    /// Raw character data from a `<![CDATA[ ... ]]>` section
    CData(Text<'a>),
    /// Comment body, `<!-- ... -->` with the delimiters stripped
    Comment(Text<'a>),
    /// Processing instruction `<?target body?>`
    Pi(ProcessingInstruction<'a>),
    /// XML declaration `<?xml version="1.0" ...?>`
    Decl(XmlDecl<'a>),
    /// Document type declaration `<!DOCTYPE ...>`
    Doctype(Doctype<'a>),
}

/// An opened element: its name and its attributes in source order.
///
/// Attribute names within one element are assumed unique; the parser does
/// not re-check this.
#[derive(Debug, Clone, PartialEq)]
pub struct StartElement<'a> {
    name: Cow<'a, str>,
    attributes: Vec<Attribute<'a>>,
}

impl<'a> StartElement<'a> {
    pub fn new<N: Into<Cow<'a, str>>>(name: N, attributes: Vec<Attribute<'a>>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    /// Element name, exactly as written in the tag.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The attributes in source order.
    #[inline]
    pub fn attributes(&self) -> &[Attribute<'a>] {
        &self.attributes
    }

    /// Value of the attribute called `name`, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.value())
    }

    pub(crate) fn into_parts(self) -> (Cow<'a, str>, Vec<Attribute<'a>>) {
        (self.name, self.attributes)
    }
}

/// A closed element.
#[derive(Debug, Clone, PartialEq)]
pub struct EndElement<'a> {
    name: Cow<'a, str>,
}

impl<'a> EndElement<'a> {
    pub fn new<N: Into<Cow<'a, str>>>(name: N) -> Self {
        Self { name: name.into() }
    }

    /// Element name, exactly as written in the closing tag.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Payload of [`Event::Text`], [`Event::Whitespace`], [`Event::CData`] and
/// [`Event::Comment`].
#[derive(Debug, Clone, PartialEq)]
pub struct Text<'a> {
    content: Cow<'a, str>,
}

impl<'a> Text<'a> {
    pub fn new<C: Into<Cow<'a, str>>>(content: C) -> Self {
        Self {
            content: content.into(),
        }
    }

    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> Cow<'a, str> {
        self.content
    }
}

/// A processing instruction other than the XML declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingInstruction<'a> {
    target: Cow<'a, str>,
    content: Cow<'a, str>,
}

impl<'a> ProcessingInstruction<'a> {
    pub fn new<T, C>(target: T, content: C) -> Self
    where
        T: Into<Cow<'a, str>>,
        C: Into<Cow<'a, str>>,
    {
        Self {
            target: target.into(),
            content: content.into(),
        }
    }

    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Everything between the target and the closing `?>`, with leading
    /// whitespace stripped.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// The `<?xml ...?>` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDecl<'a> {
    version: Cow<'a, str>,
    encoding: Option<Cow<'a, str>>,
    standalone: Option<bool>,
}

impl<'a> XmlDecl<'a> {
    pub fn new<V: Into<Cow<'a, str>>>(
        version: V,
        encoding: Option<Cow<'a, str>>,
        standalone: Option<bool>,
    ) -> Self {
        Self {
            version: version.into(),
            encoding,
            standalone,
        }
    }

    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[inline]
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// `Some(true)` for `standalone="yes"`, `Some(false)` for any other
    /// declared value, `None` when the pseudo-attribute is absent.
    #[inline]
    pub fn standalone(&self) -> Option<bool> {
        self.standalone
    }
}

/// A `<!DOCTYPE ...>` declaration.
///
/// Entity declarations found in the internal subset are recorded in the
/// reader's entity table as a side effect and are not part of this event.
#[derive(Debug, Clone, PartialEq)]
pub struct Doctype<'a> {
    name: Cow<'a, str>,
    system_id: Option<Cow<'a, str>>,
    public_id: Option<Cow<'a, str>>,
}

impl<'a> Doctype<'a> {
    pub fn new<N: Into<Cow<'a, str>>>(
        name: N,
        system_id: Option<Cow<'a, str>>,
        public_id: Option<Cow<'a, str>>,
    ) -> Self {
        Self {
            name: name.into(),
            system_id,
            public_id,
        }
    }

    /// Declared root element name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    #[inline]
    pub fn public_id(&self) -> Option<&str> {
        self.public_id.as_deref()
    }
}
