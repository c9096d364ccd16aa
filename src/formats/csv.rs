//! Support for the CSV bundle format.
//!
//! Header row `key,value`, then one `key,value` record per resource string.
//! Standard CSV quoting, UTF-8.
use std::io::{Read, Write};

use tracing::debug;

use crate::{
    error::Error,
    options::FilterOptions,
    text::read_text,
    traits::ResourceFilter,
    types::{LanguageBundle, LanguageBundleBuilder},
};

pub const CSV_FILTER_ID: &str = "CSV";

const HEADER: [&str; 2] = ["key", "value"];

/// Single-bundle CSV filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvFilter;

/// Opens a CSV reader over decoded text and checks its header row against `expected`.
pub(crate) fn open_reader<'a>(
    text: &'a str,
    expected: &[&str],
) -> Result<csv::Reader<&'a [u8]>, Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let header = rdr.headers()?;
    if header.len() < expected.len() {
        return Err(Error::format_error(format!(
            "header has {} column(s), expected `{}`",
            header.len(),
            expected.join(",")
        )));
    }
    for (pos, name) in expected.iter().enumerate() {
        let actual = header.get(pos).unwrap_or_default().trim();
        if !actual.eq_ignore_ascii_case(name) {
            return Err(Error::format_error(format!(
                "header column {} is `{}`, expected `{}`",
                pos + 1,
                actual,
                name
            )));
        }
    }
    Ok(rdr)
}

/// Checks that a data record has every required column.
pub(crate) fn require_columns(record: &csv::StringRecord, count: usize) -> Result<(), Error> {
    if record.len() < count {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        return Err(Error::format_error(format!(
            "line {}: expected {} columns, found {}",
            line,
            count,
            record.len()
        )));
    }
    Ok(())
}

/// Returns the key column of a data record. Keys must not be empty.
pub(crate) fn record_key(record: &csv::StringRecord, column: usize) -> Result<&str, Error> {
    let key = record.get(column).unwrap_or_default();
    if key.is_empty() {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        return Err(Error::format_error(format!("line {}: empty resource key", line)));
    }
    Ok(key)
}

/// Opens a writer for a merge pass. The base header is copied through as-is
/// and rows may carry extra columns.
pub(crate) fn open_merge_writer<'a>(
    writer: &'a mut dyn Write,
    header: &csv::StringRecord,
) -> Result<csv::Writer<&'a mut dyn Write>, Error> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    wtr.write_record(header)?;
    Ok(wtr)
}

pub(crate) fn open_writer<'a>(
    writer: &'a mut dyn Write,
    header: &[&str],
) -> Result<csv::Writer<&'a mut dyn Write>, Error> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(header)?;
    Ok(wtr)
}

impl ResourceFilter for CsvFilter {
    fn id(&self) -> &'static str {
        CSV_FILTER_ID
    }

    fn parse(
        &self,
        reader: &mut dyn Read,
        _options: &FilterOptions,
    ) -> Result<LanguageBundle, Error> {
        let text = read_text(reader)?;
        let mut rdr = open_reader(&text, &HEADER)?;
        let mut builder = LanguageBundleBuilder::from_parsed_file();
        for result in rdr.records() {
            let record = result?;
            require_columns(&record, HEADER.len())?;
            builder.add(record_key(&record, 0)?, &record[1]);
        }
        debug!(filter = CSV_FILTER_ID, strings = builder.len(), "parsed bundle");
        Ok(builder.build())
    }

    fn write(
        &self,
        writer: &mut dyn Write,
        bundle: &LanguageBundle,
        _options: &FilterOptions,
    ) -> Result<(), Error> {
        let mut wtr = open_writer(writer, &HEADER)?;
        for rs in bundle.sorted_resource_strings() {
            wtr.write_record([rs.key(), rs.value()])?;
        }
        wtr.flush()?;
        debug!(filter = CSV_FILTER_ID, strings = bundle.len(), "wrote bundle");
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
        let translations = bundle.key_value_map();
        let text = read_text(base)?;
        let mut rdr = open_reader(&text, &HEADER)?;
        let header = rdr.headers()?.clone();
        let mut wtr = open_merge_writer(writer, &header)?;

        let mut rows = 0usize;
        let mut substituted = 0usize;
        for result in rdr.records() {
            let record = result?;
            require_columns(&record, HEADER.len())?;
            let mut fields: Vec<&str> = record.iter().collect();
            if let Some(value) = translations.get(fields[0]) {
                fields[1] = *value;
                substituted += 1;
            }
            wtr.write_record(&fields)?;
            rows += 1;
        }
        wtr.flush()?;
        debug!(filter = CSV_FILTER_ID, rows, substituted, "merged bundle");
        Ok(())
    }
}
