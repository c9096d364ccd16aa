//! Support for Java `.properties` resource bundles.
//!
//! `JAVA` files are ISO-8859-1 with `\uXXXX` escapes for anything else;
//! `JAVAUTF8` files are plain UTF-8. Comment lines directly above a key
//! become that key's notes; a leading comment block ended by a blank line
//! becomes the bundle notes.
use std::{
    collections::HashMap,
    io::{Read, Write},
    mem,
};

use tracing::debug;

use crate::{
    error::Error,
    options::FilterOptions,
    text::{read_latin1, read_text},
    traits::ResourceFilter,
    types::{LanguageBundle, LanguageBundleBuilder, ResourceString},
};

pub const JAVA_FILTER_ID: &str = "JAVA";
pub const JAVA_UTF8_FILTER_ID: &str = "JAVAUTF8";

/// Character encoding of a properties file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertiesEncoding {
    /// ISO-8859-1; non-ASCII characters are written as `\uXXXX`.
    Latin1,
    Utf8,
}

/// Java properties filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JavaPropertiesFilter {
    encoding: PropertiesEncoding,
}

impl Default for JavaPropertiesFilter {
    fn default() -> Self {
        Self::latin1()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EscapeSpace {
    All,
    LeadingOnly,
}

/// One logical `key<separator>value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PropLine {
    key: String,
    /// Raw text between the key and the value, e.g. `" = "`.
    separator: String,
    value: String,
}

fn is_ws(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0C')
}

fn strip_leading_ws(s: &str) -> &str {
    s.trim_start_matches(is_ws)
}

fn is_comment(line: &str) -> bool {
    line.starts_with('#') || line.starts_with('!')
}

/// An odd number of trailing backslashes continues the logical line.
fn is_continuation(s: &str) -> bool {
    s.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Splits a logical line into key, separator and value. Returns `None` for
/// lines without a key.
fn parse_line(line: &str) -> Result<Option<PropLine>, Error> {
    let line = strip_leading_ws(line);

    let mut key_end = line.len();
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || is_ws(c) {
            key_end = i;
            break;
        }
    }
    if key_end == 0 {
        return Ok(None);
    }

    let rest = &line[key_end..];
    let after_ws = strip_leading_ws(rest);
    let after_sep = after_ws
        .strip_prefix(|c: char| c == '=' || c == ':')
        .unwrap_or(after_ws);
    let value = strip_leading_ws(after_sep);
    let separator = &rest[..rest.len() - value.len()];

    Ok(Some(PropLine {
        key: unescape(&line[..key_end])?,
        separator: separator.to_string(),
        value: unescape(value)?,
    }))
}

fn unescape(s: &str) -> Result<String, Error> {
    let mut units: Vec<u16> = Vec::with_capacity(s.len());
    let mut buf = [0u16; 2];
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        let c = if c == '\\' {
            match chars.next() {
                Some('t') => '\t',
                Some('n') => '\n',
                Some('f') => '\x0C',
                Some('r') => '\r',
                Some('u') => {
                    let hex: String = chars.by_ref().take(4).collect();
                    let unit = if hex.len() == 4 && hex.chars().all(|h| h.is_ascii_hexdigit()) {
                        u16::from_str_radix(&hex, 16).ok()
                    } else {
                        None
                    };
                    let unit = unit.ok_or_else(|| {
                        Error::format_error(format!("malformed \\uxxxx encoding: \\u{}", hex))
                    })?;
                    units.push(unit);
                    continue;
                }
                // Unknown escapes drop the backslash.
                Some(other) => other,
                None => break,
            }
        } else {
            c
        };
        units.extend_from_slice(c.encode_utf16(&mut buf));
    }
    String::from_utf16(&units)
        .map_err(|_| Error::format_error("unpaired surrogate in \\uxxxx escape"))
}

/// Decodes `\uXXXX` sequences only, leaving every other escape as written.
fn unescape_unicode_only(s: &str) -> String {
    let mut units: Vec<u16> = Vec::with_capacity(s.len());
    let mut buf = [0u16; 2];
    let mut i = 0;
    while i < s.len() {
        let rest = &s[i..];
        if let Some(after) = rest.strip_prefix('\\') {
            let hex = after.strip_prefix('u').and_then(|h| h.get(..4));
            if let Some(unit) = hex
                .filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()))
                .and_then(|h| u16::from_str_radix(h, 16).ok())
            {
                units.push(unit);
                i += 6;
                continue;
            }
            let pair_len = 1 + after.chars().next().map_or(0, char::len_utf8);
            units.extend(rest[..pair_len].encode_utf16());
            i += pair_len;
            continue;
        }
        let Some(c) = rest.chars().next() else {
            break;
        };
        units.extend_from_slice(c.encode_utf16(&mut buf));
        i += c.len_utf8();
    }
    String::from_utf16_lossy(&units)
}

fn push_unicode_escape(out: &mut String, c: char) {
    let mut buf = [0u16; 2];
    for unit in c.encode_utf16(&mut buf) {
        out.push_str(&format!("\\u{:04X}", unit));
    }
}

fn escape(s: &str, spaces: EscapeSpace, ascii_only: bool) -> String {
    let mut out = String::with_capacity(s.len());
    let mut leading = true;
    for c in s.chars() {
        if leading && !is_ws(c) {
            leading = false;
        }
        match c {
            ' ' if leading || spaces == EscapeSpace::All => out.push_str("\\ "),
            ' ' => out.push(' '),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0C' => out.push_str("\\f"),
            '#' | '!' | '=' | ':' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || (ascii_only && (c as u32) > 0x7E) => {
                push_unicode_escape(&mut out, c)
            }
            c => out.push(c),
        }
    }
    out
}

fn escape_unicode_only(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            push_unicode_escape(&mut out, c);
        }
    }
    out
}

impl JavaPropertiesFilter {
    pub const fn new(encoding: PropertiesEncoding) -> Self {
        Self { encoding }
    }

    /// The `JAVA` filter.
    pub const fn latin1() -> Self {
        Self::new(PropertiesEncoding::Latin1)
    }

    /// The `JAVAUTF8` filter.
    pub const fn utf8() -> Self {
        Self::new(PropertiesEncoding::Utf8)
    }

    pub fn encoding(&self) -> PropertiesEncoding {
        self.encoding
    }

    fn ascii_only(&self) -> bool {
        self.encoding == PropertiesEncoding::Latin1
    }

    fn read(&self, reader: &mut dyn Read) -> Result<String, Error> {
        match self.encoding {
            PropertiesEncoding::Latin1 => read_latin1(reader),
            PropertiesEncoding::Utf8 => read_text(reader),
        }
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        match self.encoding {
            PropertiesEncoding::Utf8 => text.as_bytes().to_vec(),
            PropertiesEncoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(c).unwrap_or(b'?'))
                .collect(),
        }
    }

    fn push_note(&self, out: &mut String, note: &str) {
        out.push('#');
        if self.ascii_only() {
            out.push_str(&escape_unicode_only(note));
        } else {
            out.push_str(note);
        }
        out.push('\n');
    }

    fn push_property(&self, out: &mut String, key: &str, separator: &str, value: &str) {
        out.push_str(&escape(key, EscapeSpace::All, self.ascii_only()));
        out.push_str(separator);
        out.push_str(&escape(value, EscapeSpace::LeadingOnly, self.ascii_only()));
        out.push('\n');
    }

    /// Emits one logical line during merge; returns whether its value was replaced.
    fn merge_logical(
        &self,
        out: &mut String,
        logical: &str,
        originals: &[&str],
        translations: &HashMap<&str, &str>,
    ) -> Result<bool, Error> {
        let replacement = parse_line(logical)?
            .and_then(|prop| translations.get(prop.key.as_str()).map(|value| (prop, *value)));

        let Some((prop, value)) = replacement else {
            for line in originals {
                out.push_str(line);
                out.push('\n');
            }
            return Ok(false);
        };

        let first = originals.first().copied().unwrap_or_default();
        out.push_str(&first[..first.len() - strip_leading_ws(first).len()]);
        let separator = if prop.separator.is_empty() {
            "="
        } else {
            prop.separator.as_str()
        };
        self.push_property(out, &prop.key, separator, value);
        Ok(true)
    }
}

impl ResourceFilter for JavaPropertiesFilter {
    fn id(&self) -> &'static str {
        match self.encoding {
            PropertiesEncoding::Latin1 => JAVA_FILTER_ID,
            PropertiesEncoding::Utf8 => JAVA_UTF8_FILTER_ID,
        }
    }

    fn parse(
        &self,
        reader: &mut dyn Read,
        _options: &FilterOptions,
    ) -> Result<LanguageBundle, Error> {
        let text = self.read(reader)?;
        let mut builder = LanguageBundleBuilder::from_parsed_file();
        let mut notes: Vec<String> = Vec::new();
        let mut global_notes_open = true;

        let mut lines = text.lines();
        while let Some(line) = lines.next() {
            let line = strip_leading_ws(line);
            if is_comment(line) {
                let note = &line[1..];
                notes.push(match self.encoding {
                    PropertiesEncoding::Latin1 => unescape_unicode_only(note),
                    PropertiesEncoding::Utf8 => note.to_string(),
                });
            } else if line.is_empty() {
                if global_notes_open && !notes.is_empty() {
                    builder.add_notes(mem::take(&mut notes));
                }
                global_notes_open = false;
            } else {
                global_notes_open = false;
                let mut logical = line.to_string();
                while is_continuation(&logical) {
                    logical.pop();
                    match lines.next() {
                        Some(next) => logical.push_str(strip_leading_ws(next)),
                        None => break,
                    }
                }
                let prop = parse_line(&logical)?.ok_or_else(|| {
                    Error::format_error(format!(
                        "empty property keys are not supported: `{}`",
                        logical
                    ))
                })?;
                builder.add_resource_string(
                    ResourceString::new(prop.key, prop.value).with_notes(mem::take(&mut notes)),
                );
            }
        }

        debug!(filter = self.id(), strings = builder.len(), "parsed bundle");
        Ok(builder.build())
    }

    fn write(
        &self,
        writer: &mut dyn Write,
        bundle: &LanguageBundle,
        _options: &FilterOptions,
    ) -> Result<(), Error> {
        let mut out = String::new();
        for note in bundle.notes() {
            self.push_note(&mut out, note);
        }
        if !bundle.notes().is_empty() {
            out.push('\n');
        }
        for rs in bundle.sorted_resource_strings() {
            for note in rs.notes() {
                self.push_note(&mut out, note);
            }
            self.push_property(&mut out, rs.key(), "=", rs.value());
        }
        writer.write_all(&self.encode(&out))?;
        writer.flush()?;
        debug!(filter = self.id(), strings = bundle.len(), "wrote bundle");
        Ok(())
    }

    fn supports_merge(&self) -> bool {
        true
    }

    fn merge(
        &self,
        base: &mut dyn Read,
        writer: &mut dyn Write,
        bundle: &LanguageBundle,
        _options: &FilterOptions,
    ) -> Result<(), Error> {
        let text = self.read(base)?;
        let translations = bundle.key_value_map();
        let mut out = String::with_capacity(text.len());
        let mut pending: Vec<&str> = Vec::new();
        let mut logical = String::new();
        let mut substituted = 0usize;

        for line in text.lines() {
            let norm = strip_leading_ws(line);
            if pending.is_empty() {
                if norm.is_empty() || is_comment(norm) {
                    out.push_str(line);
                    out.push('\n');
                    continue;
                }
                if !is_continuation(norm) {
                    if self.merge_logical(&mut out, norm, &[line], &translations)? {
                        substituted += 1;
                    }
                    continue;
                }
            }

            pending.push(line);
            if is_continuation(norm) {
                logical.push_str(&norm[..norm.len() - 1]);
            } else {
                logical.push_str(norm);
                if self.merge_logical(&mut out, &logical, &pending, &translations)? {
                    substituted += 1;
                }
                pending.clear();
                logical.clear();
            }
        }
        if !pending.is_empty() && self.merge_logical(&mut out, &logical, &pending, &translations)? {
            substituted += 1;
        }

        writer.write_all(&self.encode(&out))?;
        writer.flush()?;
        debug!(filter = self.id(), substituted, "merged bundle");
        Ok(())
    }
}
