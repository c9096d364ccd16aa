//! Support for JSON resource bundles and Globalize.js message files.
//!
//! Nested objects and arrays are flattened to JSONPath-style keys such as
//! `$.menu.file`, `$.colors[0]` or `$['ibm.com'].title`. Plain top-level
//! string entries keep their key as-is. `write` rebuilds the nesting.
use std::io::{Read, Write};

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    error::Error,
    options::FilterOptions,
    text::read_text,
    traits::ResourceFilter,
    types::{LanguageBundle, LanguageBundleBuilder},
};

pub const JSON_FILTER_ID: &str = "JSON";
pub const GLOBALIZEJS_FILTER_ID: &str = "GLOBALIZEJS";

const JSONPATH_ROOT: &str = "$";

lazy_static! {
    /// Keys already written in JSONPath notation.
    static ref JSONPATH_KEY: Regex = Regex::new(r"^\$[.\[].*").unwrap();
    /// Key segments that need the bracket notation.
    static ref NEEDS_BRACKET: Regex = Regex::new(r"[.'\[\]]").unwrap();
}

/// Plain JSON filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFilter;

/// Globalize.js filter: a JSON document wrapped in one object keyed by the
/// language tag, e.g. `{"fr": {"greeting": "Bonjour"}}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalizeJsFilter;

/// How string arrays are mapped to resource strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayStyle {
    /// One resource string per element, keyed `name[i]`.
    Indexed,
    /// One resource string holding the elements joined with a space.
    Joined,
}

/// Builds the flat key for `key` nested under the already encoded `parent`.
fn encode_resource_key(parent: &str, key: &str, is_leaf: bool) -> Result<String, Error> {
    if key.is_empty() {
        return Err(Error::format_error("JSON object has an empty key"));
    }

    let mut buf = String::new();
    let bracket = if parent.is_empty() {
        if is_leaf {
            // Top-level leaves stay plain unless they look like JSONPath.
            let bracket = JSONPATH_KEY.is_match(key);
            if bracket {
                buf.push_str(JSONPATH_ROOT);
            }
            bracket
        } else {
            buf.push_str(JSONPATH_ROOT);
            NEEDS_BRACKET.is_match(key)
        }
    } else {
        buf.push_str(parent);
        NEEDS_BRACKET.is_match(key)
    };

    if bracket {
        buf.push_str("['");
        buf.push_str(&key.replace('\'', "\\u0027"));
        buf.push_str("']");
    } else {
        if !buf.is_empty() {
            buf.push('.');
        }
        buf.push_str(key);
    }
    Ok(buf)
}

fn add_bundle_strings(
    obj: &Map<String, Value>,
    prefix: &str,
    arrays: ArrayStyle,
    builder: &mut LanguageBundleBuilder,
) -> Result<(), Error> {
    for (key, value) in obj {
        match value {
            Value::String(s) => {
                builder.add(encode_resource_key(prefix, key, true)?, s.as_str());
            }
            Value::Object(child) => {
                let child_prefix = encode_resource_key(prefix, key, false)?;
                add_bundle_strings(child, &child_prefix, arrays, builder)?;
            }
            Value::Array(items) => match arrays {
                ArrayStyle::Indexed => {
                    let base = encode_resource_key(prefix, key, false)?;
                    for (i, item) in items.iter().enumerate() {
                        let item_key = format!("{}[{}]", base, i);
                        match item {
                            Value::String(s) => {
                                builder.add(item_key, s.as_str());
                            }
                            Value::Object(child) => {
                                add_bundle_strings(child, &item_key, arrays, builder)?;
                            }
                            _ => {
                                return Err(Error::format_error(format!(
                                    "element {} of JSON array {} is not a string or object",
                                    i, key
                                )));
                            }
                        }
                    }
                }
                ArrayStyle::Joined => {
                    let parts = items
                        .iter()
                        .map(|item| {
                            item.as_str().ok_or_else(|| {
                                Error::format_error(format!(
                                    "JSON array {} must contain only strings",
                                    key
                                ))
                            })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    builder.add(encode_resource_key(prefix, key, true)?, parts.join(" "));
                }
            },
            _ => {
                return Err(Error::format_error(format!(
                    "the value of JSON element {} is not a string",
                    key
                )));
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyPiece {
    Field(String),
    Index(usize),
}

/// Splits a JSONPath-like key into object and array steps. Keys that are not
/// in JSONPath notation are a single object field.
fn split_key_pieces(key: &str) -> Vec<KeyPiece> {
    if !JSONPATH_KEY.is_match(key) {
        return vec![KeyPiece::Field(key.to_string())];
    }

    let mut pieces = Vec::new();
    for token in find_tokens(&key[JSONPATH_ROOT.len()..]) {
        if let Some(quoted) = token
            .strip_prefix('\'')
            .and_then(|t| t.strip_suffix('\''))
        {
            pieces.push(KeyPiece::Field(quoted.replace("\\u0027", "'")));
            continue;
        }
        if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(idx) = token.parse() {
                pieces.push(KeyPiece::Index(idx));
                continue;
            }
        }
        pieces.extend(
            token
                .split('.')
                .filter(|s| !s.is_empty())
                .map(|s| KeyPiece::Field(s.to_string())),
        );
    }
    pieces
}

/// Tokenizes on `.`, `[` and `]` outside single quotes.
fn find_tokens(data: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut in_quotes = false;
    let mut current = String::new();
    for c in data.chars() {
        if c == '\'' {
            in_quotes = !in_quotes;
        }
        if !in_quotes && matches!(c, '.' | '[' | ']') {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    tokens.push(current);
    tokens
}

fn structure_conflict(key: &str) -> Error {
    Error::Filter(format!("resource key {} conflicts with another key's structure", key))
}

/// Inserts `value` at the path `pieces`. Array indices must stay below
/// `max_items`, the number of strings in the bundle, since every array
/// element holds at least one string.
fn insert_value(
    current: &mut Value,
    pieces: &[KeyPiece],
    value: &str,
    key: &str,
    max_items: usize,
) -> Result<(), Error> {
    let Some((piece, rest)) = pieces.split_first() else {
        return Ok(());
    };
    let slot = match piece {
        KeyPiece::Field(name) => current
            .as_object_mut()
            .ok_or_else(|| structure_conflict(key))?
            .entry(name.clone())
            .or_insert(Value::Null),
        KeyPiece::Index(idx) => {
            let items = current
                .as_array_mut()
                .ok_or_else(|| structure_conflict(key))?;
            let len = idx
                .checked_add(1)
                .filter(|len| *len <= max_items)
                .ok_or_else(|| {
                    Error::Filter(format!("array index {} in resource key {} is out of range", idx, key))
                })?;
            if items.len() < len {
                items.resize(len, Value::Null);
            }
            &mut items[*idx]
        }
    };

    match rest.first() {
        None => {
            *slot = Value::String(value.to_string());
            Ok(())
        }
        Some(next) => {
            if slot.is_null() {
                *slot = match next {
                    KeyPiece::Index(_) => Value::Array(Vec::new()),
                    KeyPiece::Field(_) => Value::Object(Map::new()),
                };
            }
            insert_value(slot, rest, value, key, max_items)
        }
    }
}

/// Rebuilds the nested document from the bundle's strings in canonical order.
fn build_document(bundle: &LanguageBundle) -> Result<Value, Error> {
    let mut root = Value::Object(Map::new());
    let max_items = bundle.len();
    for rs in bundle.sorted_resource_strings() {
        insert_value(&mut root, &split_key_pieces(rs.key()), rs.value(), rs.key(), max_items)?;
    }
    Ok(root)
}

fn parse_document(text: &str) -> Result<Map<String, Value>, Error> {
    match serde_json::from_str(text)? {
        Value::Object(obj) => Ok(obj),
        _ => Err(Error::format_error("the root JSON element is not an object")),
    }
}

fn write_document(writer: &mut dyn Write, document: &Value) -> Result<(), Error> {
    serde_json::to_writer_pretty(&mut *writer, document)?;
    writer.flush()?;
    Ok(())
}

impl ResourceFilter for JsonFilter {
    fn id(&self) -> &'static str {
        JSON_FILTER_ID
    }

    fn parse(
        &self,
        reader: &mut dyn Read,
        _options: &FilterOptions,
    ) -> Result<LanguageBundle, Error> {
        let root = parse_document(&read_text(reader)?)?;
        let mut builder = LanguageBundleBuilder::from_parsed_file();
        add_bundle_strings(&root, "", ArrayStyle::Indexed, &mut builder)?;
        debug!(filter = JSON_FILTER_ID, strings = builder.len(), "parsed bundle");
        Ok(builder.build())
    }

    fn write(
        &self,
        writer: &mut dyn Write,
        bundle: &LanguageBundle,
        _options: &FilterOptions,
    ) -> Result<(), Error> {
        write_document(writer, &build_document(bundle)?)?;
        debug!(filter = JSON_FILTER_ID, strings = bundle.len(), "wrote bundle");
        Ok(())
    }
}

impl ResourceFilter for GlobalizeJsFilter {
    fn id(&self) -> &'static str {
        GLOBALIZEJS_FILTER_ID
    }

    fn parse(
        &self,
        reader: &mut dyn Read,
        _options: &FilterOptions,
    ) -> Result<LanguageBundle, Error> {
        let root = parse_document(&read_text(reader)?)?;
        if root.len() != 1 {
            return Err(Error::format_error(
                "only one top level language tag element is allowed per file",
            ));
        }
        let mut builder = LanguageBundleBuilder::from_parsed_file();
        for (language, messages) in &root {
            let messages = messages.as_object().ok_or_else(|| {
                Error::format_error("the top level language element is not an object")
            })?;
            builder.embedded_language_code(Some(language.clone()));
            add_bundle_strings(messages, "", ArrayStyle::Joined, &mut builder)?;
        }
        debug!(filter = GLOBALIZEJS_FILTER_ID, strings = builder.len(), "parsed bundle");
        Ok(builder.build())
    }

    fn write(
        &self,
        writer: &mut dyn Write,
        bundle: &LanguageBundle,
        _options: &FilterOptions,
    ) -> Result<(), Error> {
        let language = bundle
            .embedded_language_code()
            .filter(|code| !code.is_empty())
            .ok_or_else(|| {
                Error::Filter("missing embedded language code in the language bundle".to_string())
            })?;
        let mut top = Map::new();
        top.insert(language.to_string(), build_document(bundle)?);
        write_document(writer, &Value::Object(top))?;
        debug!(filter = GLOBALIZEJS_FILTER_ID, strings = bundle.len(), "wrote bundle");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResourceString;
    use indoc::indoc;

    const INPUT: &str = indoc! {r#"
        {
          "bears": {
            "grizzly": { "brown": "Brown Bear", "black": "Black Bear" },
            "white": "Polar Bear"
          },
          "countries": [
            { "Europe": ["Germany", "Italy"] },
            { "Americas": { "S. America": ["Brazil"], "N. America": ["United States [USA]"] } }
          ],
          "colors": ["red", "blue"],
          "some_text": "Just a plain old string",
          "another.text": "Another plain old string",
          "frog['2']": "Red-eyed Tree Frog",
          "$.xxx": "Looks like JSONPATH",
          "$abc": "Starts with the root char",
          "ibm.com": { "g11n.pipeline.title": "Globalization Pipeline" }
        }
    "#};

    fn keys_and_values(bundle: &LanguageBundle) -> Vec<(String, String, Option<u32>)> {
        bundle
            .sorted_resource_strings()
            .into_iter()
            .map(|rs| (rs.key().to_string(), rs.value().to_string(), rs.sequence_number()))
            .collect()
    }

    #[test]
    fn test_parse_flattens_keys() {
        let bundle = JsonFilter.parse_str(INPUT, &FilterOptions::new()).unwrap();
        let expected = [
            ("$.bears.grizzly.brown", "Brown Bear"),
            ("$.bears.grizzly.black", "Black Bear"),
            ("$.bears.white", "Polar Bear"),
            ("$.countries[0].Europe[0]", "Germany"),
            ("$.countries[0].Europe[1]", "Italy"),
            ("$.countries[1].Americas['S. America'][0]", "Brazil"),
            ("$.countries[1].Americas['N. America'][0]", "United States [USA]"),
            ("$.colors[0]", "red"),
            ("$.colors[1]", "blue"),
            ("some_text", "Just a plain old string"),
            ("another.text", "Another plain old string"),
            ("frog['2']", "Red-eyed Tree Frog"),
            ("$['$.xxx']", "Looks like JSONPATH"),
            ("$abc", "Starts with the root char"),
            ("$['ibm.com']['g11n.pipeline.title']", "Globalization Pipeline"),
        ];
        let actual = keys_and_values(&bundle);
        assert_eq!(actual.len(), expected.len());
        for (i, ((key, value, seq), (ekey, evalue))) in actual.iter().zip(expected).enumerate() {
            assert_eq!(key, ekey);
            assert_eq!(value, evalue);
            assert_eq!(*seq, Some(i as u32 + 1));
        }
    }

    #[test]
    fn test_write_rebuilds_structure() {
        let bundle = JsonFilter.parse_str(INPUT, &FilterOptions::new()).unwrap();
        let mut out: Vec<u8> = Vec::new();
        JsonFilter.write(&mut out, &bundle, &FilterOptions::new()).unwrap();

        let written: Value = serde_json::from_slice(&out).unwrap();
        let original: Value = serde_json::from_str(INPUT).unwrap();
        assert_eq!(written, original);

        let reparsed = JsonFilter.parse(&mut out.as_slice(), &FilterOptions::new()).unwrap();
        assert_eq!(keys_and_values(&reparsed), keys_and_values(&bundle));
    }

    #[test]
    fn test_write_follows_sequence_order() {
        let mut builder = LanguageBundleBuilder::from_service_data();
        builder
            .add_resource_string(ResourceString::new("b", "B").with_sequence_number(Some(2)))
            .add_resource_string(ResourceString::new("a", "A").with_sequence_number(Some(1)));
        let mut out: Vec<u8> = Vec::new();
        JsonFilter.write(&mut out, &builder.build(), &FilterOptions::new()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\n  \"a\": \"A\",\n  \"b\": \"B\"\n}");
    }

    #[test]
    fn test_quote_in_bracketed_key() {
        let bundle = JsonFilter
            .parse_str(r#"{"outer": {"it's.here": "x"}}"#, &FilterOptions::new())
            .unwrap();
        let rs = &bundle.resource_strings()[0];
        assert_eq!(rs.key(), "$.outer['it\\u0027s.here']");
        assert_eq!(
            split_key_pieces(rs.key()),
            vec![KeyPiece::Field("outer".into()), KeyPiece::Field("it's.here".into())]
        );
    }

    #[test]
    fn test_parse_rejects_non_string_values() {
        let result = JsonFilter.parse_str(r#"{"count": 3}"#, &FilterOptions::new());
        assert!(matches!(result, Err(Error::Format(_))));
        let result = JsonFilter.parse_str(r#"["a"]"#, &FilterOptions::new());
        assert!(matches!(result, Err(Error::Format(_))));
        let result = JsonFilter.parse_str("{ not json", &FilterOptions::new());
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn test_json_merge_unsupported() {
        assert!(!JsonFilter.supports_merge());
        let mut out: Vec<u8> = Vec::new();
        let result = JsonFilter.merge(
            &mut "{}".as_bytes(),
            &mut out,
            &LanguageBundle::default(),
            &FilterOptions::new(),
        );
        assert!(matches!(result, Err(Error::UnsupportedOperation(_))));
    }

    #[test]
    fn test_write_rejects_out_of_range_index() {
        for key in ["$.a[18446744073709551615]", "$.a[100000000000]", "$.a[2]"] {
            let mut builder = LanguageBundleBuilder::from_parsed_file();
            builder.add(key, "x").add("$.a[0]", "y");
            let mut out: Vec<u8> = Vec::new();
            let result = JsonFilter.write(&mut out, &builder.build(), &FilterOptions::new());
            assert!(matches!(result, Err(Error::Filter(_))), "{}", key);
        }

        let mut builder = LanguageBundleBuilder::from_parsed_file();
        builder.add("$.a[1]", "b").add("$.a[0]", "a");
        let mut out: Vec<u8> = Vec::new();
        JsonFilter.write(&mut out, &builder.build(), &FilterOptions::new()).unwrap();
        let written: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(written, serde_json::json!({"a": ["a", "b"]}));
    }

    #[test]
    fn test_globalizejs_parse() {
        let content = indoc! {r#"
            {
              "fr": {
                "greeting": "Bonjour",
                "long": ["Une phrase", "en deux parties"],
                "menu": { "file": "Fichier" }
              }
            }
        "#};
        let bundle = GlobalizeJsFilter.parse_str(content, &FilterOptions::new()).unwrap();
        assert_eq!(bundle.embedded_language_code(), Some("fr"));
        assert_eq!(bundle.get("greeting").unwrap().value(), "Bonjour");
        assert_eq!(bundle.get("long").unwrap().value(), "Une phrase en deux parties");
        assert_eq!(bundle.get("$.menu.file").unwrap().value(), "Fichier");
    }

    #[test]
    fn test_globalizejs_single_language_only() {
        let result = GlobalizeJsFilter.parse_str(
            r#"{"fr": {"a": "A"}, "de": {"a": "A"}}"#,
            &FilterOptions::new(),
        );
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn test_globalizejs_write() {
        let mut builder = LanguageBundleBuilder::from_parsed_file();
        builder
            .add("greeting", "Hallo")
            .add("$.menu.file", "Datei")
            .embedded_language_code(Some("de".to_string()));
        let mut out: Vec<u8> = Vec::new();
        GlobalizeJsFilter
            .write(&mut out, &builder.build(), &FilterOptions::new())
            .unwrap();
        let written: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            written,
            serde_json::json!({"de": {"greeting": "Hallo", "menu": {"file": "Datei"}}})
        );
    }

    #[test]
    fn test_globalizejs_write_requires_language() {
        let mut builder = LanguageBundleBuilder::from_parsed_file();
        builder.add("greeting", "Hallo");
        let mut out: Vec<u8> = Vec::new();
        let result = GlobalizeJsFilter.write(&mut out, &builder.build(), &FilterOptions::new());
        assert!(matches!(result, Err(Error::Filter(_))));
    }
}
