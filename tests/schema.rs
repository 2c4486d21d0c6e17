use std::borrow::Cow;

use pretty_assertions::assert_eq;
use schema_xml::de::{
    self, Field, FieldValue, FromText, FromXml, FromXmlVariant, RecordAccess, RecordSchema,
    Variant, VariantSchema,
};
use schema_xml::{Error, EventRead, Reader, Result, SchemaError};

// ---------------------------------------------------------------------------
// records shared across the tests

/// `<path d="..."/>` — the classic SVG shape.
#[derive(Debug, PartialEq)]
struct Path<'xml> {
    d: Cow<'xml, str>,
}

static PATH: RecordSchema = RecordSchema {
    name: "Path",
    fields: &[Field::attribute("d")],
    renames: &[],
};

impl<'xml> FromXml<'xml> for Path<'xml> {
    fn schema() -> &'static RecordSchema {
        &PATH
    }

    fn from_record<R: EventRead<'xml>>(access: &mut RecordAccess<'_, 'xml, R>) -> Result<Self> {
        let mut d = None;
        while let Some(field) = access.next_field()? {
            if let FieldValue::Text { field: "d", value } = field {
                d = Some(value);
            }
        }
        Ok(Path {
            d: de::required(d, "d")?,
        })
    }
}

/// Lazy root: `<root name="..."><path/>...</root>`.
struct Drawing<'xml> {
    name: Cow<'xml, str>,
}

static DRAWING: RecordSchema = RecordSchema {
    name: "Drawing",
    fields: &[
        Field::attribute("name"),
        Field::iterator("paths", "path", &PATH),
    ],
    renames: &[],
};

impl<'xml> FromXml<'xml> for Drawing<'xml> {
    fn schema() -> &'static RecordSchema {
        &DRAWING
    }

    fn from_record<R: EventRead<'xml>>(access: &mut RecordAccess<'_, 'xml, R>) -> Result<Self> {
        let mut name = None;
        while let Some(field) = access.next_field()? {
            if let FieldValue::Text { field: "name", value } = field {
                name = Some(value);
            }
        }
        Ok(Drawing {
            name: de::required(name, "name")?,
        })
    }
}

// ---------------------------------------------------------------------------
// eager parsing

#[derive(Debug, PartialEq)]
struct Track {
    title: String,
    seconds: u32,
    explicit: bool,
    rating: Option<f32>,
}

static TRACK: RecordSchema = RecordSchema {
    name: "Track",
    fields: &[
        Field::attribute("title"),
        Field::attribute("seconds").with_default("0"),
        Field::attribute("explicit").with_default("false"),
        Field::attribute("rating").optional(),
    ],
    renames: &[],
};

impl<'xml> FromXml<'xml> for Track {
    fn schema() -> &'static RecordSchema {
        &TRACK
    }

    fn from_record<R: EventRead<'xml>>(access: &mut RecordAccess<'_, 'xml, R>) -> Result<Self> {
        let mut title = None;
        let mut seconds = None;
        let mut explicit = None;
        let mut rating = None;
        while let Some(field) = access.next_field()? {
            match field {
                FieldValue::Text { field: "title", value } => {
                    title = Some(String::from_text(value)?)
                }
                FieldValue::Text { field: "seconds", value } => {
                    seconds = Some(u32::from_text(value)?)
                }
                FieldValue::Text { field: "explicit", value } => {
                    explicit = Some(bool::from_text(value)?)
                }
                FieldValue::Text { field: "rating", value } => {
                    rating = Some(f32::from_text(value)?)
                }
                _ => {}
            }
        }
        Ok(Track {
            title: de::required(title, "title")?,
            seconds: de::required(seconds, "seconds")?,
            explicit: de::required(explicit, "explicit")?,
            rating,
        })
    }
}

#[derive(Debug, PartialEq)]
struct Album {
    label: String,
    year: u16,
    opener: Track,
}

static ALBUM: RecordSchema = RecordSchema {
    name: "Album",
    fields: &[
        Field::element("label"),
        Field::element("year").with_default("1970"),
        Field::record("opener", &TRACK),
    ],
    renames: &[("opener", "first-track")],
};

impl<'xml> FromXml<'xml> for Album {
    fn schema() -> &'static RecordSchema {
        &ALBUM
    }

    fn from_record<R: EventRead<'xml>>(access: &mut RecordAccess<'_, 'xml, R>) -> Result<Self> {
        let mut label = None;
        let mut year = None;
        let mut opener = None;
        while let Some(field) = access.next_field()? {
            match field {
                FieldValue::Text { field: "label", value } => {
                    label = Some(String::from_text(value)?)
                }
                FieldValue::Text { field: "year", value } => year = Some(u16::from_text(value)?),
                FieldValue::Record { field: "opener", access } => {
                    opener = Some(access.parse()?)
                }
                _ => {}
            }
        }
        Ok(Album {
            label: de::required(label, "label")?,
            year: de::required(year, "year")?,
            opener: de::required(opener, "opener")?,
        })
    }
}

#[test]
fn eager_record_with_attributes_and_defaults() {
    let track: Track = de::from_str(r#"<track title="Tunnel Lights" seconds="183"/>"#).unwrap();
    assert_eq!(
        track,
        Track {
            title: "Tunnel Lights".to_string(),
            seconds: 183,
            explicit: false,
            rating: None,
        }
    );
}

#[test]
fn eager_record_with_children_renames_and_nesting() {
    let album: Album = de::from_str(
        r#"<album>
             <label>Night Drive Records</label>
             <unknown><nested/></unknown>
             <first-track title="Opening Credits" seconds="61" rating="4.5"/>
           </album>"#,
    )
    .unwrap();
    assert_eq!(
        album,
        Album {
            label: "Night Drive Records".to_string(),
            year: 1970,
            opener: Track {
                title: "Opening Credits".to_string(),
                seconds: 61,
                explicit: false,
                rating: Some(4.5),
            },
        }
    );
}

#[test]
fn missing_required_field() {
    let result: Result<Track> = de::from_str("<track/>");
    match result {
        Err(Error::MissingRequiredField(field)) => assert_eq!(field, "title"),
        other => panic!("expected MissingRequiredField, got {:?}", other),
    }
}

#[test]
fn conversion_failures() {
    let result: Result<Track> = de::from_str(r#"<track title="x" seconds="a lot"/>"#);
    assert!(matches!(result, Err(Error::InvalidInteger(_))));

    let result: Result<Track> = de::from_str(r#"<track title="x" explicit="yes"/>"#);
    assert!(matches!(result, Err(Error::InvalidBoolean(_))));

    let result: Result<Track> = de::from_str(r#"<track title="x" rating="high"/>"#);
    assert!(matches!(result, Err(Error::InvalidFloat(_))));
}

#[test]
fn no_root_element() {
    let result: Result<Track> = de::from_str("<!-- empty document -->");
    assert!(matches!(result, Err(Error::NoRootElement)));
}

/// String fields stay zero-copy through the schema layer on slice input.
#[test]
fn slice_fields_borrow_input() {
    let xml = r#"<path d="M0 0 L10 10"/>"#;
    let path: Path = de::from_str(xml).unwrap();
    assert!(matches!(path.d, Cow::Borrowed(_)));
    assert_eq!(path.d, "M0 0 L10 10");
}

/// The same schema binds from a byte stream, with owned strings.
#[test]
fn stream_parsing_matches_slice() {
    let xml = std::fs::read(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/documents/playlist.xml"
    ))
    .unwrap();

    let mut slice_reader = Reader::from_bytes(&xml);
    let mut lazy = de::parse_lazy::<Playlist, _>(&mut slice_reader).unwrap();
    let mut from_slice = Vec::new();
    {
        let mut tracks = lazy.items::<Track>().unwrap();
        while let Some(track) = tracks.next().unwrap() {
            from_slice.push(track);
        }
    }

    let mut stream_reader = Reader::from_reader(xml.as_slice());
    let mut lazy = de::parse_lazy::<Playlist, _>(&mut stream_reader).unwrap();
    let mut from_stream = Vec::new();
    {
        let mut tracks = lazy.items::<Track>().unwrap();
        while let Some(track) = tracks.next().unwrap() {
            from_stream.push(track);
        }
    }

    assert_eq!(from_slice.len(), 4);
    assert_eq!(from_slice, from_stream);
    assert_eq!(lazy.value.name, "Night Drive");
}

// ---------------------------------------------------------------------------
// lazy parsing and iterator handles

struct Playlist {
    name: String,
}

static PLAYLIST: RecordSchema = RecordSchema {
    name: "Playlist",
    fields: &[
        Field::attribute("name"),
        Field::iterator("tracks", "track", &TRACK),
    ],
    renames: &[],
};

impl<'xml> FromXml<'xml> for Playlist {
    fn schema() -> &'static RecordSchema {
        &PLAYLIST
    }

    fn from_record<R: EventRead<'xml>>(access: &mut RecordAccess<'_, 'xml, R>) -> Result<Self> {
        let mut name = None;
        while let Some(field) = access.next_field()? {
            if let FieldValue::Text { field: "name", value } = field {
                name = Some(String::from_text(value)?);
            }
        }
        Ok(Playlist {
            name: de::required(name, "name")?,
        })
    }
}

#[test]
fn iterator_over_children() {
    let xml = r#"<root name="r"><path d="M0 0"/><path d="L1 1"/></root>"#;
    let mut reader = Reader::from_str(xml);
    let mut root = de::parse_lazy::<Drawing, _>(&mut reader).unwrap();
    assert_eq!(root.value.name, "r");

    let mut paths = root.items::<Path>().unwrap();
    assert_eq!(paths.next().unwrap().unwrap().d, "M0 0");
    assert_eq!(paths.next().unwrap().unwrap().d, "L1 1");
    assert!(paths.next().unwrap().is_none());
    // exhausted handles stay exhausted
    assert!(paths.next().unwrap().is_none());
}

#[test]
fn iterator_skips_non_matching_children() {
    let xml = r#"<root name="r">
        <ignored><path d="not this one"/></ignored>
        <path d="M0 0"/>
        <also-ignored/>
        <path d="L1 1"/>
    </root>"#;
    let mut reader = Reader::from_str(xml);
    let mut root = de::parse_lazy::<Drawing, _>(&mut reader).unwrap();
    let mut collected = Vec::new();
    let mut paths = root.items::<Path>().unwrap();
    while let Some(path) = paths.next().unwrap() {
        collected.push(path.d.into_owned());
    }
    assert_eq!(collected, ["M0 0", "L1 1"]);
}

#[test]
fn lazy_record_rejects_non_primitive_fields() {
    static BAD: RecordSchema = RecordSchema {
        name: "Bad",
        fields: &[
            Field::element("label"),
            Field::iterator("paths", "path", &PATH),
        ],
        renames: &[],
    };
    struct Bad;
    impl<'xml> FromXml<'xml> for Bad {
        fn schema() -> &'static RecordSchema {
            &BAD
        }
        fn from_record<R: EventRead<'xml>>(
            access: &mut RecordAccess<'_, 'xml, R>,
        ) -> Result<Self> {
            while access.next_field()?.is_some() {}
            Ok(Bad)
        }
    }

    let mut reader = Reader::from_str("<bad><path d='x'/></bad>");
    let result = de::parse_lazy::<Bad, _>(&mut reader);
    assert!(matches!(result, Err(Error::LazyRecordFields)));
}

#[test]
fn entry_point_mismatches() {
    let result: Result<Playlist> = de::from_str(r#"<playlist name="p"/>"#);
    assert!(matches!(
        result,
        Err(Error::Schema(SchemaError::ExpectedEager { record: "Playlist" }))
    ));

    let mut reader = Reader::from_str(r#"<track title="t"/>"#);
    let result = de::parse_lazy::<Track, _>(&mut reader);
    assert!(matches!(
        result,
        Err(Error::Schema(SchemaError::ExpectedLazy { record: "Track" }))
    ));

    let mut reader = Reader::from_str(r#"<root name="r"/>"#);
    let mut root = de::parse_lazy::<Drawing, _>(&mut reader).unwrap();
    let result = root.items::<Track>();
    assert!(matches!(
        result,
        Err(Error::Schema(SchemaError::IteratorMismatch { record: "Drawing" }))
    ));
}

// ---------------------------------------------------------------------------
// multi-variant iterator

#[derive(Debug, PartialEq)]
struct Book {
    title: String,
}

static BOOK: RecordSchema = RecordSchema {
    name: "Book",
    fields: &[Field::attribute("title")],
    renames: &[],
};

impl<'xml> FromXml<'xml> for Book {
    fn schema() -> &'static RecordSchema {
        &BOOK
    }

    fn from_record<R: EventRead<'xml>>(access: &mut RecordAccess<'_, 'xml, R>) -> Result<Self> {
        let mut title = None;
        while let Some(field) = access.next_field()? {
            if let FieldValue::Text { field: "title", value } = field {
                title = Some(String::from_text(value)?);
            }
        }
        Ok(Book {
            title: de::required(title, "title")?,
        })
    }
}

#[derive(Debug, PartialEq)]
struct Movie {
    title: String,
    minutes: u32,
}

static MOVIE: RecordSchema = RecordSchema {
    name: "Movie",
    fields: &[
        Field::attribute("title"),
        Field::attribute("minutes").with_default("90"),
    ],
    renames: &[],
};

impl<'xml> FromXml<'xml> for Movie {
    fn schema() -> &'static RecordSchema {
        &MOVIE
    }

    fn from_record<R: EventRead<'xml>>(access: &mut RecordAccess<'_, 'xml, R>) -> Result<Self> {
        let mut title = None;
        let mut minutes = None;
        while let Some(field) = access.next_field()? {
            match field {
                FieldValue::Text { field: "title", value } => {
                    title = Some(String::from_text(value)?)
                }
                FieldValue::Text { field: "minutes", value } => {
                    minutes = Some(u32::from_text(value)?)
                }
                _ => {}
            }
        }
        Ok(Movie {
            title: de::required(title, "title")?,
            minutes: de::required(minutes, "minutes")?,
        })
    }
}

#[derive(Debug, PartialEq)]
enum Media {
    Book(Book),
    Movie(Movie),
}

static MEDIA: VariantSchema = VariantSchema {
    name: "Media",
    variants: &[
        Variant { name: "book", record: &BOOK },
        Variant { name: "movie", record: &MOVIE },
    ],
    renames: &[("movie", "film")],
};

impl<'xml> FromXmlVariant<'xml> for Media {
    fn schema() -> &'static VariantSchema {
        &MEDIA
    }

    fn from_variant<R: EventRead<'xml>>(
        variant: &'static str,
        access: &mut RecordAccess<'_, 'xml, R>,
    ) -> Result<Self> {
        match variant {
            "book" => Book::from_record(access).map(Media::Book),
            _ => Movie::from_record(access).map(Media::Movie),
        }
    }
}

struct Shelf;

static SHELF: RecordSchema = RecordSchema {
    name: "Shelf",
    fields: &[Field::multi("media", &MEDIA)],
    renames: &[],
};

impl<'xml> FromXml<'xml> for Shelf {
    fn schema() -> &'static RecordSchema {
        &SHELF
    }

    fn from_record<R: EventRead<'xml>>(access: &mut RecordAccess<'_, 'xml, R>) -> Result<Self> {
        while access.next_field()?.is_some() {}
        Ok(Shelf)
    }
}

/// Interleaved variant children come back in source order, each with the
/// variant matching its element name.
#[test]
fn multi_variant_iterator_preserves_order() {
    let xml = r#"<shelf>
        <book title="Dune"/>
        <film title="Stalker" minutes="162"/>
        <pamphlet title="ignored"/>
        <book title="Solaris"/>
        <film title="Alphaville"/>
    </shelf>"#;
    let mut reader = Reader::from_str(xml);
    let mut shelf = de::parse_lazy::<Shelf, _>(&mut reader).unwrap();
    let mut media = shelf.variants::<Media>().unwrap();
    let mut collected = Vec::new();
    while let Some(item) = media.next().unwrap() {
        collected.push(item);
    }
    assert_eq!(
        collected,
        vec![
            Media::Book(Book { title: "Dune".to_string() }),
            Media::Movie(Movie { title: "Stalker".to_string(), minutes: 162 }),
            Media::Book(Book { title: "Solaris".to_string() }),
            Media::Movie(Movie { title: "Alphaville".to_string(), minutes: 90 }),
        ]
    );
}

// ---------------------------------------------------------------------------
// lazy within lazy

struct Library<'xml> {
    name: Cow<'xml, str>,
}

static COLLECTION: RecordSchema = RecordSchema {
    name: "Collection",
    fields: &[Field::attribute("name")],
    renames: &[],
};

#[derive(Debug, PartialEq)]
struct Collection {
    name: String,
}

impl<'xml> FromXml<'xml> for Collection {
    fn schema() -> &'static RecordSchema {
        &COLLECTION
    }

    fn from_record<R: EventRead<'xml>>(access: &mut RecordAccess<'_, 'xml, R>) -> Result<Self> {
        let mut name = None;
        while let Some(field) = access.next_field()? {
            if let FieldValue::Text { field: "name", value } = field {
                name = Some(String::from_text(value)?);
            }
        }
        Ok(Collection {
            name: de::required(name, "name")?,
        })
    }
}

static LIBRARY: RecordSchema = RecordSchema {
    name: "Library",
    fields: &[
        Field::attribute("name"),
        Field::iterator("collections", "collection", &COLLECTION),
    ],
    renames: &[],
};

impl<'xml> FromXml<'xml> for Library<'xml> {
    fn schema() -> &'static RecordSchema {
        &LIBRARY
    }

    fn from_record<R: EventRead<'xml>>(access: &mut RecordAccess<'_, 'xml, R>) -> Result<Self> {
        let mut name = None;
        while let Some(field) = access.next_field()? {
            if let FieldValue::Text { field: "name", value } = field {
                name = Some(value);
            }
        }
        Ok(Library {
            name: de::required(name, "name")?,
        })
    }
}

struct Platform;

static PLATFORM: RecordSchema = RecordSchema {
    name: "Platform",
    fields: &[Field::iterator("libraries", "library", &LIBRARY)],
    renames: &[],
};

impl<'xml> FromXml<'xml> for Platform {
    fn schema() -> &'static RecordSchema {
        &PLATFORM
    }

    fn from_record<R: EventRead<'xml>>(access: &mut RecordAccess<'_, 'xml, R>) -> Result<Self> {
        while access.next_field()?.is_some() {}
        Ok(Platform)
    }
}

static NESTED_XML: &str = r#"<platform>
    <library name="first">
        <collection name="a"/>
        <collection name="b"/>
        <collection name="c"/>
    </library>
    <library name="second">
        <collection name="d"/>
    </library>
    <library name="third">
        <collection name="e"/>
        <collection name="f"/>
    </library>
</platform>"#;

#[test]
fn nested_lazy_full_consumption() {
    let mut reader = Reader::from_str(NESTED_XML);
    let mut platform = de::parse_lazy::<Platform, _>(&mut reader).unwrap();
    let mut libraries = platform.items::<Library>().unwrap();
    let mut seen = Vec::new();
    while let Some(mut library) = libraries.next_lazy().unwrap() {
        let name = library.value.name.clone().into_owned();
        let mut collections = library.items::<Collection>().unwrap();
        while let Some(collection) = collections.next().unwrap() {
            seen.push(format!("{}/{}", name, collection.name));
        }
    }
    assert_eq!(seen, ["first/a", "first/b", "first/c", "second/d", "third/e", "third/f"]);
}

/// Abandoning an inner iterator mid-way leaves the outer one in a
/// well-defined state: the next outer advance skips to the close of the
/// abandoned scope and finds the following sibling.
#[test]
fn nested_lazy_partial_consumption() {
    let mut reader = Reader::from_str(NESTED_XML);
    let mut platform = de::parse_lazy::<Platform, _>(&mut reader).unwrap();
    let mut libraries = platform.items::<Library>().unwrap();
    let mut names = Vec::new();

    // first library: read only one of its three collections
    {
        let mut library = libraries.next_lazy().unwrap().unwrap();
        names.push(library.value.name.clone().into_owned());
        let mut collections = library.items::<Collection>().unwrap();
        assert_eq!(collections.next().unwrap().unwrap().name, "a");
    }
    // second library: never touch its collections
    {
        let library = libraries.next_lazy().unwrap().unwrap();
        names.push(library.value.name.clone().into_owned());
    }
    // third library: drain it fully
    {
        let mut library = libraries.next_lazy().unwrap().unwrap();
        names.push(library.value.name.clone().into_owned());
        let mut collections = library.items::<Collection>().unwrap();
        let mut found = Vec::new();
        while let Some(collection) = collections.next().unwrap() {
            found.push(collection.name);
        }
        assert_eq!(found, ["e", "f"]);
    }
    assert!(libraries.next_lazy().unwrap().is_none());
    assert_eq!(names, ["first", "second", "third"]);
}

// ---------------------------------------------------------------------------
// user-defined conversions

#[derive(Debug, PartialEq)]
enum Fit {
    Contain,
    Cover,
}

impl<'xml> FromText<'xml> for Fit {
    fn from_text(text: Cow<'xml, str>) -> Result<Self> {
        match text.trim() {
            "contain" => Ok(Fit::Contain),
            "cover" => Ok(Fit::Cover),
            other => Err(Error::convert(format!("unknown fit `{}`", other))),
        }
    }
}

#[derive(Debug, PartialEq)]
struct Viewport {
    fit: Fit,
}

static VIEWPORT: RecordSchema = RecordSchema {
    name: "Viewport",
    fields: &[Field::attribute("fit").with_default("contain")],
    renames: &[],
};

impl<'xml> FromXml<'xml> for Viewport {
    fn schema() -> &'static RecordSchema {
        &VIEWPORT
    }

    fn from_record<R: EventRead<'xml>>(access: &mut RecordAccess<'_, 'xml, R>) -> Result<Self> {
        let mut fit = None;
        while let Some(field) = access.next_field()? {
            if let FieldValue::Text { field: "fit", value } = field {
                fit = Some(Fit::from_text(value)?);
            }
        }
        Ok(Viewport {
            fit: de::required(fit, "fit")?,
        })
    }
}

#[test]
fn user_defined_conversion() {
    let viewport: Viewport = de::from_str(r#"<viewport fit="cover"/>"#).unwrap();
    assert_eq!(viewport.fit, Fit::Cover);

    let viewport: Viewport = de::from_str("<viewport/>").unwrap();
    assert_eq!(viewport.fit, Fit::Contain);

    let result: Result<Viewport> = de::from_str(r#"<viewport fit="stretch"/>"#);
    assert!(matches!(result, Err(Error::Convert(_))));
}

/// A primitive child element must hold character data only.
#[test]
fn element_field_rejects_nested_markup() {
    let result: Result<Album> = de::from_str(
        r#"<album><label>x<oops/></label><first-track title="t"/></album>"#,
    );
    match result {
        Err(Error::UnexpectedElement(tag)) => assert_eq!(tag, "oops"),
        other => panic!("expected UnexpectedElement, got {:?}", other),
    }
}

/// Self-closing children and expanded children bind identically.
#[test]
fn self_closing_children_are_equivalent() {
    let compact: Track = de::from_str(r#"<track title="t" seconds="5"/>"#).unwrap();
    let expanded: Track = de::from_str(r#"<track title="t" seconds="5"></track>"#).unwrap();
    assert_eq!(compact, expanded);
}
