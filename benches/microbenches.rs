use criterion::{self, criterion_group, criterion_main, Criterion};
use pretty_assertions::assert_eq;
use schema_xml::de::{self, Field, FieldValue, FromXml, RecordAccess, RecordSchema};
use schema_xml::{Event, EventRead, Reader, Result};

static PLAYLIST: &[u8] = include_bytes!("../tests/documents/playlist.xml");

/// Benchmarks pulling every event out of the sample document.
fn read_event(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_event");
    group.bench_function("slice", |b| {
        b.iter(|| {
            let mut reader = Reader::from_bytes(PLAYLIST);
            let mut count = criterion::black_box(0);
            while let Some(event) = reader.next().unwrap() {
                if let Event::Start(_) = event {
                    count += 1;
                }
            }
            assert_eq!(count, 6, "start tags in ./tests/documents/playlist.xml");
        })
    });

    group.bench_function("stream", |b| {
        b.iter(|| {
            let mut reader = Reader::from_reader(PLAYLIST);
            let mut count = criterion::black_box(0);
            while let Some(event) = reader.next().unwrap() {
                if let Event::Start(_) = event {
                    count += 1;
                }
            }
            assert_eq!(count, 6, "start tags in ./tests/documents/playlist.xml");
        })
    });
    group.finish();
}

struct Track {
    seconds: u32,
}

static TRACK: RecordSchema = RecordSchema {
    name: "Track",
    fields: &[
        Field::attribute("title"),
        Field::attribute("seconds").with_default("0"),
    ],
    renames: &[],
};

impl<'xml> FromXml<'xml> for Track {
    fn schema() -> &'static RecordSchema {
        &TRACK
    }

    fn from_record<R: EventRead<'xml>>(access: &mut RecordAccess<'_, 'xml, R>) -> Result<Self> {
        let mut seconds = None;
        while let Some(field) = access.next_field()? {
            if let FieldValue::Text { field: "seconds", value } = field {
                seconds = Some(value.parse().unwrap_or(0));
            }
        }
        Ok(Track {
            seconds: seconds.unwrap_or(0),
        })
    }
}

struct Playlist;

static PLAYLIST_SCHEMA: RecordSchema = RecordSchema {
    name: "Playlist",
    fields: &[
        Field::attribute("name"),
        Field::iterator("tracks", "track", &TRACK),
    ],
    renames: &[],
};

impl<'xml> FromXml<'xml> for Playlist {
    fn schema() -> &'static RecordSchema {
        &PLAYLIST_SCHEMA
    }

    fn from_record<R: EventRead<'xml>>(access: &mut RecordAccess<'_, 'xml, R>) -> Result<Self> {
        while access.next_field()?.is_some() {}
        Ok(Playlist)
    }
}

/// Benchmarks the schema dispatcher on the same document.
fn schema_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema_parse");
    group.bench_function("lazy iterator", |b| {
        b.iter(|| {
            let mut reader = Reader::from_bytes(PLAYLIST);
            let mut playlist = de::parse_lazy::<Playlist, _>(&mut reader).unwrap();
            let mut total = criterion::black_box(0);
            let mut tracks = playlist.items::<Track>().unwrap();
            while let Some(track) = tracks.next().unwrap() {
                total += track.seconds;
            }
            assert_eq!(total, 693, "track seconds in ./tests/documents/playlist.xml");
        })
    });
    group.finish();
}

criterion_group!(benches, read_event, schema_parse);
criterion_main!(benches);
