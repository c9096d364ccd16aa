//! Strict, BOM-aware decoding of filter input.

use std::io::Read;

use encoding_rs::{Encoding, UTF_8};

use crate::error::Error;

/// Reads the whole stream and decodes it as text.
///
/// A leading byte order mark selects UTF-8 or UTF-16 and is stripped; without
/// one the input must be UTF-8. Malformed byte sequences are a format error.
pub fn read_text(reader: &mut dyn Read) -> Result<String, Error> {
    let mut bytes: Vec<u8> = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode(&bytes)
}

/// Reads the whole stream as ISO-8859-1, where every byte is one character.
pub fn read_latin1(reader: &mut dyn Read) -> Result<String, Error> {
    let mut bytes: Vec<u8> = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(bytes.iter().map(|&b| char::from(b)).collect())
}

fn decode(bytes: &[u8]) -> Result<String, Error> {
    let (encoding, bom_len) = Encoding::for_bom(bytes).unwrap_or((UTF_8, 0));
    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
        .map(|text| text.into_owned())
        .ok_or_else(|| Error::format_error(format!("invalid {} byte sequence", encoding.name())))
}
