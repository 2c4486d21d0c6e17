//! Entity and character reference resolution.
//!
//! Resolution follows a fixed precedence: entities declared in the internal
//! DTD subset, then the five built-in entities, then numeric character
//! references. Anything else — including numerically invalid references —
//! passes through literally, so resolution never fails.

use std::borrow::Cow;
use std::collections::HashMap;

use memchr::{memchr, memchr2};

/// Replacement texts for entities declared in the internal DTD subset.
///
/// Populated by the reader while scanning a `<!DOCTYPE ... [ ... ]>`
/// internal subset; empty for documents without one. Parameter entities
/// (`%name;`) are not recognized.
#[derive(Debug, Clone, Default)]
pub struct EntityTable {
    entities: HashMap<String, String>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a declaration. The first declaration of a name wins, as
    /// required for XML entity declarations.
    pub(crate) fn insert(&mut self, name: &str, value: String) {
        self.entities.entry(name.to_string()).or_insert(value);
    }

    /// Looks up the replacement text for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entities.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

enum Resolved<'e> {
    Text(&'e str),
    Char(char),
}

/// Resolves one reference name (the part between `&` and `;`), or `None`
/// when the name matches nothing and must pass through literally.
fn resolve_reference<'e>(name: &str, entities: &'e EntityTable) -> Option<Resolved<'e>> {
    if let Some(replacement) = entities.get(name) {
        return Some(Resolved::Text(replacement));
    }
    match name {
        "lt" => Some(Resolved::Char('<')),
        "gt" => Some(Resolved::Char('>')),
        "amp" => Some(Resolved::Char('&')),
        "quot" => Some(Resolved::Char('"')),
        "apos" => Some(Resolved::Char('\'')),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                if digits.is_empty() {
                    return None;
                }
                digits.parse::<u32>().ok()?
            };
            std::char::from_u32(code).map(Resolved::Char)
        }
    }
}

/// Resolves entity and character references in `raw` against `entities`.
///
/// Returns `Cow::Borrowed` when `raw` contains no `&` at all, which keeps
/// clean slice-backed input zero-copy.
pub fn unescape_with<'a>(raw: &'a str, entities: &EntityTable) -> Cow<'a, str> {
    let bytes = raw.as_bytes();
    let mut pos = match memchr(b'&', bytes) {
        None => return Cow::Borrowed(raw),
        Some(i) => i,
    };

    let mut out = String::with_capacity(raw.len());
    out.push_str(&raw[..pos]);
    loop {
        // invariant: bytes[pos] == b'&'
        let rest = &bytes[pos + 1..];
        match memchr2(b';', b'&', rest) {
            // no terminator ahead: the rest is literal
            None => {
                out.push_str(&raw[pos..]);
                break;
            }
            // another `&` before any `;`: this one cannot form a reference
            Some(j) if rest[j] == b'&' => {
                out.push_str(&raw[pos..pos + 1 + j]);
                pos += 1 + j;
            }
            Some(j) => {
                let name = &raw[pos + 1..pos + 1 + j];
                match resolve_reference(name, entities) {
                    Some(Resolved::Text(replacement)) => out.push_str(replacement),
                    Some(Resolved::Char(c)) => out.push(c),
                    None => out.push_str(&raw[pos..pos + 2 + j]),
                }
                pos += 2 + j;
                match memchr(b'&', &bytes[pos..]) {
                    None => {
                        out.push_str(&raw[pos..]);
                        break;
                    }
                    Some(k) => {
                        out.push_str(&raw[pos..pos + k]);
                        pos += k;
                    }
                }
            }
        }
    }
    Cow::Owned(out)
}

/// Resolves built-in and numeric references only.
pub fn unescape(raw: &str) -> Cow<str> {
    unescape_with(raw, &EntityTable::new())
}
