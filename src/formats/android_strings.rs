//! Support for Android `strings.xml` resources.
//!
//! `<string name="key">value</string>` elements map to resource strings.
//! A `<string-array>` maps to one resource string whose value lists the
//! items as `[first, second]`.
use std::{
    collections::HashMap,
    io::{Read, Write},
};

use lazy_static::lazy_static;
use quick_xml::{
    Reader, Writer,
    escape::escape,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};
use regex::Regex;
use tracing::debug;

use crate::{
    error::Error,
    options::FilterOptions,
    text::read_text,
    traits::ResourceFilter,
    types::{LanguageBundle, LanguageBundleBuilder},
};

pub const ANDROID_FILTER_ID: &str = "ANDROID";

lazy_static! {
    static ref STRING_OPEN: Regex = Regex::new(r#"^(\s*)<string\s+name="([^"]*)"[^>]*>"#).unwrap();
    static ref STRING_CLOSE: Regex = Regex::new(r"</string\s*>").unwrap();
    static ref ARRAY_OPEN: Regex =
        Regex::new(r#"^(\s*)<string-array\s+name="([^"]*)"[^>]*>"#).unwrap();
    static ref ARRAY_CLOSE: Regex = Regex::new(r"</string-array\s*>").unwrap();
}

/// Android `strings.xml` filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct AndroidStringsFilter;

/// Items of an array value written as `[a, b, c]`.
fn array_items(value: &str) -> Option<Vec<&str>> {
    let inner = value.strip_prefix('[')?.strip_suffix(']')?;
    Some(inner.split(',').map(str::trim).collect())
}

fn name_attribute(e: &BytesStart) -> Result<String, Error> {
    for attr in e.attributes().with_checks(false) {
        let attr = attr?;
        if attr.key.as_ref() == b"name" {
            return Ok(attr.unescape_value()?.to_string());
        }
    }
    Err(Error::format_error(format!(
        "<{}> element missing 'name'",
        String::from_utf8_lossy(e.name().as_ref())
    )))
}

/// Collects the text of the element just opened, including the text of
/// nested markup, up to its matching end tag.
fn element_text(reader: &mut Reader<&[u8]>) -> Result<String, Error> {
    let mut text = String::new();
    let mut depth = 0usize;
    loop {
        match reader.read_event()? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => return Ok(text),
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(Error::format_error("unexpected end of strings.xml")),
            _ => {}
        }
    }
}

/// Reads the `<item>` children of a `<string-array>` up to its end tag.
fn array_text(reader: &mut Reader<&[u8]>) -> Result<String, Error> {
    let mut items = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"item" => {
                items.push(element_text(reader)?.trim().to_string());
            }
            Event::Empty(e) if e.name().as_ref() == b"item" => items.push(String::new()),
            Event::Start(_) => {
                element_text(reader)?;
            }
            Event::End(_) => return Ok(format!("[{}]", items.join(", "))),
            Event::Eof => return Err(Error::format_error("unexpected end of strings.xml")),
            _ => {}
        }
    }
}

/// Indentation one level deeper than `indent`, following its tab or space style.
fn nested_indent(indent: &str) -> String {
    let step = if indent.starts_with('\t') { "\t" } else { "    " };
    format!("{}{}", indent, step)
}

impl ResourceFilter for AndroidStringsFilter {
    fn id(&self) -> &'static str {
        ANDROID_FILTER_ID
    }

    fn parse(
        &self,
        reader: &mut dyn Read,
        _options: &FilterOptions,
    ) -> Result<LanguageBundle, Error> {
        let text = read_text(reader)?;
        let mut xml_reader = Reader::from_str(&text);

        let mut builder = LanguageBundleBuilder::from_parsed_file();
        loop {
            match xml_reader.read_event()? {
                Event::Start(e) if e.name().as_ref() == b"string" => {
                    let name = name_attribute(&e)?;
                    builder.add(name, element_text(&mut xml_reader)?);
                }
                Event::Start(e) if e.name().as_ref() == b"string-array" => {
                    let name = name_attribute(&e)?;
                    builder.add(name, array_text(&mut xml_reader)?);
                }
                Event::Empty(e) if e.name().as_ref() == b"string" => {
                    builder.add(name_attribute(&e)?, "");
                }
                Event::Eof => break,
                _ => {}
            }
        }
        debug!(filter = ANDROID_FILTER_ID, strings = builder.len(), "parsed bundle");
        Ok(builder.build())
    }

    fn write(
        &self,
        writer: &mut dyn Write,
        bundle: &LanguageBundle,
        _options: &FilterOptions,
    ) -> Result<(), Error> {
        let mut xml_writer = Writer::new_with_indent(&mut *writer, b' ', 4);
        xml_writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), Some("no"))))?;
        xml_writer.write_event(Event::Start(BytesStart::new("resources")))?;

        for rs in bundle.sorted_resource_strings() {
            match array_items(rs.value()) {
                Some(items) => {
                    let mut elem = BytesStart::new("string-array");
                    elem.push_attribute(("name", rs.key()));
                    xml_writer.write_event(Event::Start(elem))?;
                    for item in items {
                        xml_writer
                            .create_element("item")
                            .write_text_content(BytesText::new(item))?;
                    }
                    xml_writer.write_event(Event::End(BytesEnd::new("string-array")))?;
                }
                None => {
                    xml_writer
                        .create_element("string")
                        .with_attribute(("name", rs.key()))
                        .write_text_content(BytesText::new(rs.value()))?;
                }
            }
        }

        xml_writer.write_event(Event::End(BytesEnd::new("resources")))?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        debug!(filter = ANDROID_FILTER_ID, strings = bundle.len(), "wrote bundle");
        Ok(())
    }

    fn supports_merge(&self) -> bool {
        true
    }

    /// Rewrites the base file line by line. Elements whose key has a
    /// translation are replaced in place; every other line is copied.
    fn merge(
        &self,
        base: &mut dyn Read,
        writer: &mut dyn Write,
        bundle: &LanguageBundle,
        _options: &FilterOptions,
    ) -> Result<(), Error> {
        let translations: HashMap<&str, &str> = bundle.key_value_map();
        let text = read_text(base)?;
        let mut out = String::with_capacity(text.len());
        let mut substituted = 0usize;

        let mut lines = text.lines();
        while let Some(line) = lines.next() {
            if let Some(caps) = ARRAY_OPEN.captures(line) {
                let open = &caps[0];
                let items = translations.get(&caps[2]).and_then(|v| array_items(v));
                let Some(items) = items.filter(|_| !open.ends_with("/>")) else {
                    out.push_str(line);
                    out.push('\n');
                    continue;
                };
                let indent = &caps[1];
                let item_indent = nested_indent(indent);
                out.push_str(open);
                out.push('\n');
                for item in items {
                    out.push_str(&format!("{}<item>{}</item>\n", item_indent, escape(item)));
                }
                out.push_str(&format!("{}</string-array>\n", indent));
                if !ARRAY_CLOSE.is_match(&line[open.len()..]) {
                    for next in lines.by_ref() {
                        if ARRAY_CLOSE.is_match(next) {
                            break;
                        }
                    }
                }
                substituted += 1;
            } else if let Some(caps) = STRING_OPEN.captures(line) {
                let open = &caps[0];
                let value = translations.get(&caps[2]).copied();
                let Some(value) = value.filter(|_| !open.ends_with("/>")) else {
                    out.push_str(line);
                    out.push('\n');
                    continue;
                };
                out.push_str(&format!("{}{}</string>\n", open, escape(value)));
                if !STRING_CLOSE.is_match(&line[open.len()..]) {
                    for next in lines.by_ref() {
                        if STRING_CLOSE.is_match(next) {
                            break;
                        }
                    }
                }
                substituted += 1;
            } else {
                out.push_str(line);
                out.push('\n');
            }
        }

        writer.write_all(out.as_bytes())?;
        writer.flush()?;
        debug!(filter = ANDROID_FILTER_ID, substituted, "merged bundle");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResourceString;
    use indoc::indoc;

    const INPUT: &str = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <resources>
            <string name="app_name">Sample &amp; Co</string>
            <!-- greeting shown on launch -->
            <string name="hello"><b>Hello</b> world</string>
            <string-array name="planets">
                <item>Mercury</item>
                <item>Venus</item>
            </string-array>
            <string name="empty"/>
        </resources>
    "#};

    fn parse(content: &str) -> Result<LanguageBundle, Error> {
        AndroidStringsFilter.parse_str(content, &FilterOptions::new())
    }

    #[test]
    fn test_parse_strings_and_arrays() {
        let bundle = parse(INPUT).unwrap();
        let strings: Vec<_> = bundle
            .sorted_resource_strings()
            .into_iter()
            .map(|rs| (rs.key(), rs.value(), rs.sequence_number()))
            .collect();
        assert_eq!(
            strings,
            vec![
                ("app_name", "Sample & Co", Some(1)),
                ("hello", "Hello world", Some(2)),
                ("planets", "[Mercury, Venus]", Some(3)),
                ("empty", "", Some(4)),
            ]
        );
    }

    #[test]
    fn test_parse_rejects_missing_name() {
        let result = parse("<resources><string>Nameless</string></resources>");
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn test_parse_rejects_malformed_xml() {
        let result = parse("<resources><string name=\"a\">A</resources>");
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn test_write_then_parse() {
        let mut builder = LanguageBundleBuilder::from_service_data();
        builder
            .add_resource_string(ResourceString::new("colors", "[Red, Blue]").with_sequence_number(Some(2)))
            .add_resource_string(ResourceString::new("title", "Fish <&> Chips").with_sequence_number(Some(1)));
        let bundle = builder.build();

        let mut out: Vec<u8> = Vec::new();
        AndroidStringsFilter.write(&mut out, &bundle, &FilterOptions::new()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\" standalone=\"no\"?>"));
        assert!(text.contains("<string name=\"title\">Fish &lt;&amp;&gt; Chips</string>"));
        assert!(text.find("title").unwrap() < text.find("colors").unwrap());

        let reparsed = parse(&text).unwrap();
        assert_eq!(reparsed.get("title").unwrap().value(), "Fish <&> Chips");
        assert_eq!(reparsed.get("colors").unwrap().value(), "[Red, Blue]");
    }

    #[test]
    fn test_merge_replaces_values_in_place() {
        let base = indoc! {r#"
            <?xml version="1.0" encoding="utf-8"?>
            <resources>
                <!-- keep me -->
                <string name="app_name">Sample</string>
                <string name="long">First line
                    continues here</string>
                <string name="untranslated">Stay</string>
                <string-array name="planets">
                    <item>Mercury</item>
                    <item>Venus</item>
                </string-array>
            </resources>
        "#};
        let mut builder = LanguageBundleBuilder::from_service_data();
        builder
            .add("app_name", "Exemple & Cie")
            .add("long", "Première ligne")
            .add("planets", "[Mercure, Vénus]")
            .add("tempura", "Tempura");

        let mut out: Vec<u8> = Vec::new();
        AndroidStringsFilter
            .merge(&mut base.as_bytes(), &mut out, &builder.build(), &FilterOptions::new())
            .unwrap();
        let expected = indoc! {r#"
            <?xml version="1.0" encoding="utf-8"?>
            <resources>
                <!-- keep me -->
                <string name="app_name">Exemple &amp; Cie</string>
                <string name="long">Première ligne</string>
                <string name="untranslated">Stay</string>
                <string-array name="planets">
                    <item>Mercure</item>
                    <item>Vénus</item>
                </string-array>
            </resources>
        "#};
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }
}
