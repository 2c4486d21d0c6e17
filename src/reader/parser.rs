//! The XML lexer/parser state machine behind [`Reader`](super::Reader).
//!
//! [`Parser`] holds everything that is independent of the input backend:
//! the state machine, the open-element stack, the arena the stack lives in,
//! and the entity table collected from the internal DTD subset. All input
//! goes through the [`Source`] trait, so the same code serves in-memory
//! slices, memory-mapped files and byte streams.

use std::borrow::Cow;
use std::ops::Range;

use memchr::{memchr, memchr3_iter, memmem};

use crate::arena::{Arena, Mark, Span};
use crate::errors::{Error, Result};
use crate::escape::{unescape, unescape_with, EntityTable};
use crate::events::attributes::Attribute;
use crate::events::{
    Doctype, EndElement, Event, ProcessingInstruction, StartElement, Text, XmlDecl,
};
use crate::reader::builder::ReaderBuilder;
use crate::reader::is_whitespace;
use crate::reader::source::Source;

/// Possible parser states. The state transition diagram:
///
/// ```text
///   Init -- DocumentStart --> Parsing -- DocumentEnd --> Done
///           Parsing -- `<x/>` Start --> PendingEnd -- End --> Parsing
///           Parsing -- any error --> Failed
/// ```
///
/// `Done` and `Failed` are terminal: `next` returns `None` forever.
#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    /// Before the first `next` call.
    Init,
    /// Reading events.
    Parsing,
    /// A self-closing tag produced its `Start` event; the matching `End`
    /// is synthesized on the next call.
    PendingEnd,
    /// The input is exhausted and `DocumentEnd` has been delivered.
    Done,
    /// An error was returned; the document cannot be continued.
    Failed,
}

/// One open element.
///
/// The name is stored in the arena (for comparison against the closing
/// tag) and additionally remembered as an absolute input range so that
/// slice backends can hand out a borrowed name for a synthesized end
/// event.
#[derive(Debug)]
struct Frame {
    /// Arena position taken just before the name was stored; everything
    /// above it is released when this element closes.
    mark: Mark,
    name: Span,
    input: Range<usize>,
}

/// Possible declarations started with `<!`.
#[derive(Debug, PartialEq)]
enum BangType {
    /// `<![CDATA[...]]>`
    CData,
    /// `<!--...-->`
    Comment,
    /// `<!DOCTYPE...>`
    Doctype,
}

/// State machine for scanning to an unquoted `>`, used when skipping
/// declarations inside the DOCTYPE internal subset.
#[derive(Clone, Copy)]
enum QuoteState {
    Plain,
    SingleQ,
    DoubleQ,
}

/// Finds the first `>` of `chunk` that is not inside a quoted literal.
fn find_unquoted_gt(chunk: &[u8]) -> Option<usize> {
    let mut state = QuoteState::Plain;
    for i in memchr3_iter(b'>', b'\'', b'"', chunk) {
        state = match (state, chunk[i]) {
            (QuoteState::Plain, b'>') => return Some(i),
            (QuoteState::Plain, b'\'') => QuoteState::SingleQ,
            (QuoteState::Plain, b'"') => QuoteState::DoubleQ,
            (QuoteState::SingleQ, b'\'') | (QuoteState::DoubleQ, b'"') => QuoteState::Plain,
            (state, _) => state,
        };
    }
    None
}

#[inline]
fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_')
}

#[inline]
fn is_name_byte(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b':' | b'-')
}

/// Converts durable bytes into a string, keeping borrows borrowed.
fn cow_str<'r>(bytes: Cow<'r, [u8]>) -> Result<Cow<'r, str>> {
    match bytes {
        Cow::Borrowed(b) => Ok(Cow::Borrowed(std::str::from_utf8(b)?)),
        Cow::Owned(v) => match String::from_utf8(v) {
            Ok(s) => Ok(Cow::Owned(s)),
            Err(e) => Err(Error::Utf8(e.utf8_error())),
        },
    }
}

/// Reslices `source` without copying when it is borrowed.
fn subcow<'r>(source: &Cow<'r, str>, range: Range<usize>) -> Cow<'r, str> {
    match source {
        Cow::Borrowed(s) => Cow::Borrowed(&s[range]),
        Cow::Owned(s) => Cow::Owned(s[range].to_string()),
    }
}

/// Scans for `byte`, growing the lookahead window as needed.
///
/// Returns the index of the match and `true`, or the number of remaining
/// bytes and `false` when the input ends first.
fn scan_byte<'r, S: Source<'r>>(src: &mut S, byte: u8, limit: usize) -> Result<(usize, bool)> {
    let mut window = 64;
    loop {
        let (found, len) = {
            let chunk = src.peek(window)?;
            (memchr(byte, chunk), chunk.len())
        };
        if let Some(i) = found {
            return Ok((i, true));
        }
        if len < window {
            return Ok((len, false));
        }
        if window >= limit {
            return Err(Error::TokenTooLarge);
        }
        window = (window * 2).min(limit);
    }
}

/// Scans for a multi-byte terminator, growing the lookahead window as
/// needed. Returns `None` when the input ends before the terminator.
fn scan_needle<'r, S: Source<'r>>(
    src: &mut S,
    needle: &[u8],
    limit: usize,
) -> Result<Option<usize>> {
    let mut window = 64;
    loop {
        let (found, len) = {
            let chunk = src.peek(window)?;
            (memmem::find(chunk, needle), chunk.len())
        };
        if let Some(i) = found {
            return Ok(Some(i));
        }
        if len < window {
            return Ok(None);
        }
        if window >= limit {
            return Err(Error::TokenTooLarge);
        }
        window = (window * 2).min(limit);
    }
}

/// Discards a whitespace run, returning how many bytes went.
fn skip_whitespace<'r, S: Source<'r>>(src: &mut S) -> Result<usize> {
    let mut total = 0;
    loop {
        let (run, len) = {
            let chunk = src.peek(64)?;
            (
                chunk
                    .iter()
                    .position(|b| !is_whitespace(*b))
                    .unwrap_or(chunk.len()),
                chunk.len(),
            )
        };
        src.toss(run)?;
        total += run;
        if run < len || len == 0 {
            return Ok(total);
        }
    }
}

pub(crate) struct Parser {
    state: State,
    arena: Arena,
    frames: Vec<Frame>,
    entities: EntityTable,

    preserve_whitespace: bool,
    resolve_entities: bool,
    max_depth: usize,
    max_attributes: usize,
    token_limit: usize,
}

impl Parser {
    pub(crate) fn from_builder(builder: &ReaderBuilder) -> Self {
        Self {
            state: State::Init,
            arena: Arena::new(),
            frames: Vec::new(),
            entities: EntityTable::new(),

            preserve_whitespace: builder.preserve_whitespace,
            resolve_entities: builder.resolve_entities,
            max_depth: builder.max_depth,
            max_attributes: builder.max_attributes,
            token_limit: builder.token_limit,
        }
    }

    /// Number of currently open elements.
    #[inline]
    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn entities(&self) -> &EntityTable {
        &self.entities
    }

    /// Pulls the next event out of `src`.
    ///
    /// On `Err` the parser enters its terminal failed state and every
    /// following call returns `Ok(None)`.
    pub(crate) fn next<'r, S: Source<'r>>(&mut self, src: &mut S) -> Result<Option<Event<'r>>> {
        match self.state {
            State::Init => {
                self.state = State::Parsing;
                return match self.strip_bom(src) {
                    Ok(()) => Ok(Some(Event::DocumentStart)),
                    Err(e) => {
                        self.state = State::Failed;
                        Err(e)
                    }
                };
            }
            State::Done | State::Failed => return Ok(None),
            State::PendingEnd => {
                self.state = State::Parsing;
                return match self.synthesized_end(src) {
                    Ok(event) => Ok(Some(event)),
                    Err(e) => {
                        self.state = State::Failed;
                        Err(e)
                    }
                };
            }
            State::Parsing => {}
        }
        match self.next_event(src) {
            Ok(Some(Event::DocumentEnd)) => {
                self.state = State::Done;
                Ok(Some(Event::DocumentEnd))
            }
            Ok(event) => Ok(event),
            Err(e) => {
                self.state = State::Failed;
                Err(e)
            }
        }
    }

    fn strip_bom<'r, S: Source<'r>>(&mut self, src: &mut S) -> Result<()> {
        let has_bom = src.peek(3)?.starts_with(&[0xEF, 0xBB, 0xBF]);
        if has_bom {
            src.toss(3)?;
        }
        Ok(())
    }

    fn next_event<'r, S: Source<'r>>(&mut self, src: &mut S) -> Result<Option<Event<'r>>> {
        loop {
            match src.peek_byte()? {
                None => {
                    if !self.frames.is_empty() {
                        return Err(Error::UnexpectedEof("element"));
                    }
                    // every frame was popped, so the arena is fully unwound
                    debug_assert_eq!(self.arena.len(), 0);
                    return Ok(Some(Event::DocumentEnd));
                }
                Some(b'<') => return self.parse_markup(src).map(Some),
                Some(_) => {
                    if let Some(event) = self.parse_text(src)? {
                        return Ok(Some(event));
                    }
                    // skipped whitespace run, look again
                }
            }
        }
    }

    /// Reads a run of character data up to the next `<`.
    ///
    /// Returns `None` for an all-whitespace run when whitespace
    /// preservation is off.
    fn parse_text<'r, S: Source<'r>>(&mut self, src: &mut S) -> Result<Option<Event<'r>>> {
        let (len, _) = scan_byte(src, b'<', self.token_limit)?;
        let raw = src.take(len)?;
        if raw.iter().all(|b| is_whitespace(*b)) {
            return if self.preserve_whitespace {
                Ok(Some(Event::Whitespace(Text::new(cow_str(raw)?))))
            } else {
                Ok(None)
            };
        }
        if self.frames.is_empty() {
            // character data is only allowed inside the root element
            return Err(Error::InvalidMarkup);
        }
        let text = self.resolve(cow_str(raw)?);
        Ok(Some(Event::Text(Text::new(text))))
    }

    /// Dispatches on the character after a peeked `<`.
    fn parse_markup<'r, S: Source<'r>>(&mut self, src: &mut S) -> Result<Event<'r>> {
        let next = src.peek(2)?.get(1).copied();
        match next {
            None => Err(Error::UnexpectedEof("markup")),
            Some(b'/') => self.parse_end(src),
            Some(b'!') => self.parse_bang(src),
            Some(b'?') => self.parse_question(src),
            Some(_) => self.parse_start(src),
        }
    }

    /// Parses a start tag: name, attributes, optional self-closing `/`.
    fn parse_start<'r, S: Source<'r>>(&mut self, src: &mut S) -> Result<Event<'r>> {
        src.toss(1)?;
        if self.frames.len() == self.max_depth {
            return Err(Error::TooManyNestedElements);
        }
        let name_start = src.position();
        let name = self.parse_name(src)?;
        let input = name_start..name_start + name.len();

        let mut attributes = Vec::new();
        let self_closing;
        loop {
            skip_whitespace(src)?;
            match src.peek_byte()? {
                None => return Err(Error::UnexpectedEof("start tag")),
                Some(b'>') => {
                    src.toss(1)?;
                    self_closing = false;
                    break;
                }
                Some(b'/') => {
                    src.toss(1)?;
                    match src.peek_byte()? {
                        Some(b'>') => src.toss(1)?,
                        _ => return Err(Error::ExpectedClosingBracket),
                    }
                    self_closing = true;
                    break;
                }
                Some(_) => {
                    if attributes.len() == self.max_attributes {
                        return Err(Error::TooManyAttributes);
                    }
                    attributes.push(self.parse_attribute(src)?);
                }
            }
        }

        let mark = self.arena.mark();
        let span = self.arena.store(name.as_bytes());
        self.frames.push(Frame {
            mark,
            name: span,
            input,
        });
        if self_closing {
            self.state = State::PendingEnd;
        }
        Ok(Event::Start(StartElement::new(name, attributes)))
    }

    fn parse_attribute<'r, S: Source<'r>>(&mut self, src: &mut S) -> Result<Attribute<'r>> {
        let name = self.parse_name(src)?;
        skip_whitespace(src)?;
        match src.peek_byte()? {
            Some(b'=') => src.toss(1)?,
            _ => return Err(Error::ExpectedEquals),
        }
        skip_whitespace(src)?;
        let quote = match src.peek_byte()? {
            Some(q @ b'"') | Some(q @ b'\'') => q,
            _ => return Err(Error::ExpectedQuote),
        };
        src.toss(1)?;
        let (len, found) = scan_byte(src, quote, self.token_limit)?;
        if !found {
            return Err(Error::UnterminatedAttributeValue);
        }
        let value = self.resolve(cow_str(src.take(len)?)?);
        src.toss(1)?;
        Ok(Attribute::new(name, value))
    }

    /// Parses an element or attribute name.
    ///
    /// Fast path: ASCII `[A-Za-z_][A-Za-z0-9._:-]*`. A byte past 0x7F
    /// switches to a permissive scan that stops only at whitespace or one
    /// of `>`, `/`, `=`, `<`; well-formedness of non-ASCII names is not
    /// enforced.
    fn parse_name<'r, S: Source<'r>>(&self, src: &mut S) -> Result<Cow<'r, str>> {
        let first = match src.peek_byte()? {
            None => return Err(Error::UnexpectedEof("name")),
            Some(b) => b,
        };
        if first < 0x80 && !is_name_start(first) {
            return Err(Error::InvalidElementName);
        }
        let mut window = 32;
        let len = loop {
            let (stop, len) = {
                let chunk = src.peek(window)?;
                let mut permissive = false;
                let mut stop = None;
                for (i, b) in chunk.iter().enumerate() {
                    if *b >= 0x80 {
                        permissive = true;
                    } else if permissive {
                        if matches!(*b, b' ' | b'\t' | b'\r' | b'\n' | b'>' | b'/' | b'=' | b'<') {
                            stop = Some(i);
                            break;
                        }
                    } else if !is_name_byte(*b) {
                        stop = Some(i);
                        break;
                    }
                }
                (stop, chunk.len())
            };
            match stop {
                Some(i) => break i,
                None if len < window => break len,
                None => {}
            }
            if window >= self.token_limit {
                return Err(Error::TokenTooLarge);
            }
            window = (window * 2).min(self.token_limit);
        };
        cow_str(src.take(len)?)
    }

    /// Parses a closing tag, verifying it against the open element without
    /// storing the closing name.
    fn parse_end<'r, S: Source<'r>>(&mut self, src: &mut S) -> Result<Event<'r>> {
        src.toss(2)?;
        let mut window = 32;
        let len = loop {
            let (stop, len) = {
                let chunk = src.peek(window)?;
                (
                    chunk.iter().position(|b| is_whitespace(*b) || *b == b'>'),
                    chunk.len(),
                )
            };
            match stop {
                Some(i) => break i,
                None if len < window => return Err(Error::UnexpectedEof("end tag")),
                None => {}
            }
            if window >= self.token_limit {
                return Err(Error::TokenTooLarge);
            }
            window = (window * 2).min(self.token_limit);
        };
        if len == 0 {
            return Err(Error::InvalidElementName);
        }

        let frame = match self.frames.pop() {
            Some(frame) => frame,
            None => return Err(Error::UnmatchedClosingTag),
        };
        {
            let found = src.peek(len)?;
            let expected = self.arena.get(frame.name);
            if found != expected {
                return Err(Error::MismatchedTags {
                    expected: String::from_utf8_lossy(expected).into_owned(),
                    found: String::from_utf8_lossy(found).into_owned(),
                });
            }
        }
        let name = cow_str(src.take(len)?)?;
        skip_whitespace(src)?;
        match src.peek_byte()? {
            Some(b'>') => src.toss(1)?,
            _ => return Err(Error::ExpectedClosingBracket),
        }
        self.arena.reset_to(frame.mark);
        Ok(Event::End(EndElement::new(name)))
    }

    /// Delivers the end event of a self-closing element.
    fn synthesized_end<'r, S: Source<'r>>(&mut self, src: &mut S) -> Result<Event<'r>> {
        let frame = match self.frames.pop() {
            Some(frame) => frame,
            None => return Err(Error::UnmatchedClosingTag),
        };
        let name = match src.retrieve(frame.input.start, frame.input.end) {
            Some(bytes) => Cow::Borrowed(std::str::from_utf8(bytes)?),
            None => Cow::Owned(String::from_utf8_lossy(self.arena.get(frame.name)).into_owned()),
        };
        self.arena.reset_to(frame.mark);
        Ok(Event::End(EndElement::new(name)))
    }

    /// Parses markup started with `<!`: comment, CDATA or DOCTYPE.
    fn parse_bang<'r, S: Source<'r>>(&mut self, src: &mut S) -> Result<Event<'r>> {
        let bang_type = {
            let chunk = src.peek(9)?;
            if chunk.starts_with(b"<!--") {
                BangType::Comment
            } else if chunk.starts_with(b"<![CDATA[") {
                BangType::CData
            } else if chunk.len() >= 9 && chunk[..9].eq_ignore_ascii_case(b"<!DOCTYPE") {
                BangType::Doctype
            } else {
                return Err(Error::InvalidMarkup);
            }
        };
        match bang_type {
            BangType::Comment => {
                src.toss(4)?;
                let len = match scan_needle(src, b"-->", self.token_limit)? {
                    Some(i) => i,
                    None => return Err(Error::UnterminatedComment),
                };
                let content = cow_str(src.take(len)?)?;
                src.toss(3)?;
                Ok(Event::Comment(Text::new(content)))
            }
            BangType::CData => {
                src.toss(9)?;
                let len = match scan_needle(src, b"]]>", self.token_limit)? {
                    Some(i) => i,
                    None => return Err(Error::UnterminatedCData),
                };
                let content = cow_str(src.take(len)?)?;
                src.toss(3)?;
                Ok(Event::CData(Text::new(content)))
            }
            BangType::Doctype => self.parse_doctype(src),
        }
    }

    /// Parses `<!DOCTYPE name (SYSTEM|PUBLIC ids)? [internal subset]? >`,
    /// recording `<!ENTITY ...>` declarations from the internal subset.
    fn parse_doctype<'r, S: Source<'r>>(&mut self, src: &mut S) -> Result<Event<'r>> {
        enum ExternalId {
            Missing,
            System,
            Public,
        }

        src.toss(9)?;
        if skip_whitespace(src)? == 0 {
            return Err(Error::InvalidDoctype);
        }
        let name = self.parse_name(src)?;
        skip_whitespace(src)?;

        let mut system_id = None;
        let mut public_id = None;
        let external = {
            let chunk = src.peek(6)?;
            if chunk.starts_with(b"SYSTEM") {
                ExternalId::System
            } else if chunk.starts_with(b"PUBLIC") {
                ExternalId::Public
            } else {
                ExternalId::Missing
            }
        };
        match external {
            ExternalId::System => {
                src.toss(6)?;
                skip_whitespace(src)?;
                system_id = Some(self.parse_quoted(src)?);
            }
            ExternalId::Public => {
                src.toss(6)?;
                skip_whitespace(src)?;
                public_id = Some(self.parse_quoted(src)?);
                skip_whitespace(src)?;
                system_id = Some(self.parse_quoted(src)?);
            }
            ExternalId::Missing => {}
        }

        skip_whitespace(src)?;
        if src.peek_byte()? == Some(b'[') {
            src.toss(1)?;
            self.parse_internal_subset(src)?;
            skip_whitespace(src)?;
        }
        match src.peek_byte()? {
            Some(b'>') => src.toss(1)?,
            None => return Err(Error::UnterminatedDoctype),
            Some(_) => return Err(Error::InvalidDoctype),
        }
        Ok(Event::Doctype(Doctype::new(name, system_id, public_id)))
    }

    /// Parses a quoted literal inside a DOCTYPE declaration.
    fn parse_quoted<'r, S: Source<'r>>(&self, src: &mut S) -> Result<Cow<'r, str>> {
        let quote = match src.peek_byte()? {
            Some(q @ b'"') | Some(q @ b'\'') => q,
            _ => return Err(Error::InvalidDoctype),
        };
        src.toss(1)?;
        let (len, found) = scan_byte(src, quote, self.token_limit)?;
        if !found {
            return Err(Error::UnterminatedDoctype);
        }
        let literal = cow_str(src.take(len)?)?;
        src.toss(1)?;
        Ok(literal)
    }

    /// Scans the internal subset after its opening `[`, consuming the
    /// closing `]`. `<!ENTITY name "value">` declarations are recorded;
    /// everything else is skipped.
    fn parse_internal_subset<'r, S: Source<'r>>(&mut self, src: &mut S) -> Result<()> {
        loop {
            skip_whitespace(src)?;
            match src.peek_byte()? {
                None => return Err(Error::UnterminatedDoctype),
                Some(b']') => {
                    src.toss(1)?;
                    return Ok(());
                }
                Some(_) => {}
            }
            let is_entity = {
                let chunk = src.peek(9)?;
                chunk.len() >= 9
                    && chunk[..8].eq_ignore_ascii_case(b"<!ENTITY")
                    && is_whitespace(chunk[8])
            };
            if is_entity {
                self.parse_entity_decl(src)?;
            } else {
                self.skip_subset_item(src)?;
            }
        }
    }

    /// Records one `<!ENTITY name "value">` declaration. Parameter
    /// entities and external entities are skipped, not recorded.
    fn parse_entity_decl<'r, S: Source<'r>>(&mut self, src: &mut S) -> Result<()> {
        src.toss(8)?;
        skip_whitespace(src)?;
        if src.peek_byte()? == Some(b'%') {
            return self.skip_to_tag_end(src);
        }
        let name = self.parse_name(src)?;
        skip_whitespace(src)?;
        match src.peek_byte()? {
            Some(b'"') | Some(b'\'') => {
                let value = self.parse_quoted(src)?;
                // character and built-in references are resolved when the
                // declaration is recorded; general references stay literal
                self.entities.insert(&name, unescape(&value).into_owned());
                self.skip_to_tag_end(src)
            }
            _ => self.skip_to_tag_end(src),
        }
    }

    /// Skips one non-entity item of the internal subset: a comment, a
    /// conditional section, or any other declaration up to its `>`.
    fn skip_subset_item<'r, S: Source<'r>>(&self, src: &mut S) -> Result<()> {
        enum Item {
            Comment,
            Section,
            Declaration,
        }
        let item = {
            let chunk = src.peek(4)?;
            if chunk.starts_with(b"<!--") {
                Item::Comment
            } else if chunk.starts_with(b"<![") {
                Item::Section
            } else {
                Item::Declaration
            }
        };
        match item {
            Item::Comment => {
                src.toss(4)?;
                match scan_needle(src, b"-->", self.token_limit)? {
                    Some(i) => src.toss(i + 3),
                    None => Err(Error::UnterminatedComment),
                }
            }
            Item::Section => {
                src.toss(3)?;
                match scan_needle(src, b"]]>", self.token_limit)? {
                    Some(i) => src.toss(i + 3),
                    None => Err(Error::UnterminatedDoctype),
                }
            }
            Item::Declaration => self.skip_to_tag_end(src),
        }
    }

    /// Consumes input through the next `>` that is not inside a quoted
    /// literal.
    fn skip_to_tag_end<'r, S: Source<'r>>(&self, src: &mut S) -> Result<()> {
        let mut window = 64;
        loop {
            let (found, len) = {
                let chunk = src.peek(window)?;
                (find_unquoted_gt(chunk), chunk.len())
            };
            if let Some(i) = found {
                return src.toss(i + 1);
            }
            if len < window {
                return Err(Error::UnterminatedDoctype);
            }
            if window >= self.token_limit {
                return Err(Error::TokenTooLarge);
            }
            window = (window * 2).min(self.token_limit);
        }
    }

    /// Parses `<?...?>`: either the XML declaration or a processing
    /// instruction.
    fn parse_question<'r, S: Source<'r>>(&mut self, src: &mut S) -> Result<Event<'r>> {
        src.toss(2)?;
        let len = match scan_needle(src, b"?>", self.token_limit)? {
            Some(i) => i,
            None => return Err(Error::UnterminatedProcessingInstruction),
        };
        let body = cow_str(src.take(len)?)?;
        src.toss(2)?;

        let bytes = body.as_bytes();
        if bytes.starts_with(b"xml") && (bytes.len() == 3 || is_whitespace(bytes[3])) {
            return self.parse_decl(body);
        }
        let target_end = bytes
            .iter()
            .position(|b| is_whitespace(*b))
            .unwrap_or(bytes.len());
        if target_end == 0 {
            return Err(Error::InvalidMarkup);
        }
        let content_start = bytes[target_end..]
            .iter()
            .position(|b| !is_whitespace(*b))
            .map(|i| target_end + i)
            .unwrap_or(bytes.len());
        let target = subcow(&body, 0..target_end);
        let content = subcow(&body, content_start..bytes.len());
        Ok(Event::Pi(ProcessingInstruction::new(target, content)))
    }

    /// Parses the pseudo-attributes of an XML declaration. `body` is the
    /// declaration without its `<?` and `?>` delimiters.
    fn parse_decl<'r>(&self, body: Cow<'r, str>) -> Result<Event<'r>> {
        let bytes = body.as_bytes();
        let mut version = None;
        let mut encoding = None;
        let mut standalone = None;

        let mut pos = 3; // past `xml`
        loop {
            while pos < bytes.len() && is_whitespace(bytes[pos]) {
                pos += 1;
            }
            if pos == bytes.len() {
                break;
            }
            let name_start = pos;
            while pos < bytes.len() && bytes[pos] != b'=' && !is_whitespace(bytes[pos]) {
                pos += 1;
            }
            let name_end = pos;
            while pos < bytes.len() && is_whitespace(bytes[pos]) {
                pos += 1;
            }
            if pos == bytes.len() || bytes[pos] != b'=' {
                return Err(Error::InvalidXmlDeclaration);
            }
            pos += 1;
            while pos < bytes.len() && is_whitespace(bytes[pos]) {
                pos += 1;
            }
            if pos == bytes.len() || (bytes[pos] != b'"' && bytes[pos] != b'\'') {
                return Err(Error::InvalidXmlDeclaration);
            }
            let quote = bytes[pos];
            pos += 1;
            let value_start = pos;
            while pos < bytes.len() && bytes[pos] != quote {
                pos += 1;
            }
            if pos == bytes.len() {
                return Err(Error::InvalidXmlDeclaration);
            }
            let value_end = pos;
            pos += 1;

            match &body[name_start..name_end] {
                "version" => version = Some(value_start..value_end),
                "encoding" => encoding = Some(value_start..value_end),
                // the literal `yes` means true, anything else false
                "standalone" => standalone = Some(&body[value_start..value_end] == "yes"),
                _ => return Err(Error::InvalidXmlDeclaration),
            }
        }

        let version = match version {
            Some(range) => subcow(&body, range),
            None => return Err(Error::InvalidXmlDeclaration),
        };
        let encoding = encoding.map(|range| subcow(&body, range));
        Ok(Event::Decl(XmlDecl::new(version, encoding, standalone)))
    }

    /// Applies entity resolution to `text` when enabled.
    fn resolve<'r>(&self, text: Cow<'r, str>) -> Cow<'r, str> {
        if !self.resolve_entities {
            return text;
        }
        match text {
            Cow::Borrowed(raw) => unescape_with(raw, &self.entities),
            Cow::Owned(raw) => {
                if memchr(b'&', raw.as_bytes()).is_none() {
                    return Cow::Owned(raw);
                }
                Cow::Owned(unescape_with(&raw, &self.entities).into_owned())
            }
        }
    }
}
