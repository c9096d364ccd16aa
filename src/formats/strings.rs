//! Support for Apple's `.strings` format.
//!
//! Entries look like `"key" = "value";`. Comments (`/* */` or `//`) directly
//! above an entry become its notes. Files may be UTF-8 or UTF-16 with a BOM;
//! output is always UTF-8.
use std::{
    io::{Read, Write},
    ops::Range,
};

use tracing::debug;

use crate::{
    error::Error,
    options::FilterOptions,
    text::read_text,
    traits::ResourceFilter,
    types::{LanguageBundle, LanguageBundleBuilder, ResourceString},
};

pub const IOS_FILTER_ID: &str = "IOS";

/// Apple `.strings` filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppleStringsFilter;

/// One `key = value;` entry and where its quoted value sits in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Pair {
    key: String,
    value: String,
    /// Byte range of the quoted value, quotes included.
    value_span: Range<usize>,
    notes: Vec<String>,
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn line(&self) -> usize {
        self.text[..self.pos].matches('\n').count() + 1
    }

    fn error(&self, message: &str) -> Error {
        Error::format_error(format!("line {}: {}", self.line(), message))
    }

    /// Skips whitespace and comments, collecting comment text into `notes`.
    fn skip_trivia(&mut self, notes: &mut Vec<String>) -> Result<(), Error> {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            if let Some(body) = trimmed.strip_prefix("/*") {
                let end = body
                    .find("*/")
                    .ok_or_else(|| self.error("unterminated comment"))?;
                notes.push(body[..end].trim().to_string());
                self.pos += 2 + end + 2;
            } else if let Some(body) = trimmed.strip_prefix("//") {
                let end = body.find('\n').unwrap_or(body.len());
                notes.push(body[..end].trim().to_string());
                self.pos += 2 + end;
            } else {
                return Ok(());
            }
        }
    }

    fn expect(&mut self, c: u8) -> Result<(), Error> {
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected `{}`", c as char)))
        }
    }

    /// Reads a quoted string, returning its unescaped content and its span.
    fn quoted(&mut self) -> Result<(String, Range<usize>), Error> {
        let start = self.pos;
        self.expect(b'"')?;
        let bytes = self.text.as_bytes();
        let mut escaped = false;
        while let Some(&b) = bytes.get(self.pos) {
            self.pos += 1;
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                let raw = &self.text[start + 1..self.pos - 1];
                return Ok((unescape(raw).map_err(|m| self.error(&m))?, start..self.pos));
            }
        }
        Err(self.error("unterminated string"))
    }

    /// Reads an unquoted key such as `greeting_title`.
    fn bare(&mut self) -> &'a str {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '$')))
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn key(&mut self) -> Result<String, Error> {
        let key = if self.peek() == Some(b'"') {
            self.quoted()?.0
        } else {
            self.bare().to_string()
        };
        if key.is_empty() {
            return Err(self.error("missing key"));
        }
        Ok(key)
    }
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('U') | Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let unit = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("malformed \\U escape `{}`", hex))?;
                out.push(unit);
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Ok(out)
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

fn parse_pairs(text: &str) -> Result<Vec<Pair>, Error> {
    let mut scanner = Scanner::new(text);
    let mut pairs = Vec::new();
    let mut notes = Vec::new();
    let mut ignored = Vec::new();
    loop {
        scanner.skip_trivia(&mut notes)?;
        if scanner.peek().is_none() {
            break;
        }
        let key = scanner.key()?;
        scanner.skip_trivia(&mut ignored)?;
        scanner.expect(b'=')?;
        scanner.skip_trivia(&mut ignored)?;
        let (value, value_span) = scanner.quoted()?;
        scanner.skip_trivia(&mut ignored)?;
        scanner.expect(b';')?;
        pairs.push(Pair {
            key,
            value,
            value_span,
            notes: std::mem::take(&mut notes),
        });
    }
    Ok(pairs)
}

impl ResourceFilter for AppleStringsFilter {
    fn id(&self) -> &'static str {
        IOS_FILTER_ID
    }

    fn parse(
        &self,
        reader: &mut dyn Read,
        _options: &FilterOptions,
    ) -> Result<LanguageBundle, Error> {
        let text = read_text(reader)?;
        let mut builder = LanguageBundleBuilder::from_parsed_file();
        for pair in parse_pairs(&text)? {
            builder.add_resource_string(ResourceString::new(pair.key, pair.value).with_notes(pair.notes));
        }
        debug!(filter = IOS_FILTER_ID, strings = builder.len(), "parsed bundle");
        Ok(builder.build())
    }

    fn write(
        &self,
        writer: &mut dyn Write,
        bundle: &LanguageBundle,
        _options: &FilterOptions,
    ) -> Result<(), Error> {
        let mut content = String::new();
        for rs in bundle.sorted_resource_strings() {
            for note in rs.notes() {
                content.push_str(&format!("/* {} */\n", note.replace("*/", "* /")));
            }
            content.push_str(&format!("\"{}\" = \"{}\";\n", escape(rs.key()), escape(rs.value())));
        }
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        debug!(filter = IOS_FILTER_ID, strings = bundle.len(), "wrote bundle");
        Ok(())
    }

    fn supports_merge(&self) -> bool {
        true
    }

    /// Copies the base file, replacing only the quoted values of keys that
    /// have a translation.
    fn merge(
        &self,
        base: &mut dyn Read,
        writer: &mut dyn Write,
        bundle: &LanguageBundle,
        _options: &FilterOptions,
    ) -> Result<(), Error> {
        let translations = bundle.key_value_map();
        let text = read_text(base)?;

        let mut out = String::with_capacity(text.len());
        let mut copied = 0usize;
        let mut substituted = 0usize;
        for pair in parse_pairs(&text)? {
            if let Some(value) = translations.get(pair.key.as_str()) {
                out.push_str(&text[copied..pair.value_span.start]);
                out.push('"');
                out.push_str(&escape(value));
                out.push('"');
                copied = pair.value_span.end;
                substituted += 1;
            }
        }
        out.push_str(&text[copied..]);

        writer.write_all(out.as_bytes())?;
        writer.flush()?;
        debug!(filter = IOS_FILTER_ID, substituted, "merged bundle");
        Ok(())
    }
}
