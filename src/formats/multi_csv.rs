//! Support for the multi-bundle CSV format.
//!
//! Header row `module,key,value`; the first column names the module (bundle)
//! a record belongs to, so one file carries several bundles.
use std::{
    collections::HashMap,
    io::{Read, Write},
};

use tracing::debug;

use super::csv::{open_merge_writer, open_reader, open_writer, record_key, require_columns};
use crate::{
    error::Error,
    options::FilterOptions,
    text::read_text,
    traits::MultiBundleResourceFilter,
    types::{LanguageBundleBuilder, LanguageBundles},
};

pub const MULTI_CSV_FILTER_ID: &str = "CSV-MULTI";

const HEADER: [&str; 3] = ["module", "key", "value"];

/// Multi-bundle CSV filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiBundleCsvFilter;

impl MultiBundleResourceFilter for MultiBundleCsvFilter {
    fn id(&self) -> &'static str {
        MULTI_CSV_FILTER_ID
    }

    fn parse(
        &self,
        reader: &mut dyn Read,
        _options: &FilterOptions,
    ) -> Result<LanguageBundles, Error> {
        let text = read_text(reader)?;
        let mut rdr = open_reader(&text, &HEADER)?;

        let mut builders: HashMap<String, LanguageBundleBuilder> = HashMap::new();
        for result in rdr.records() {
            let record = result?;
            require_columns(&record, HEADER.len())?;
            builders
                .entry(record[0].to_string())
                .or_insert_with(LanguageBundleBuilder::from_parsed_file)
                .add(record_key(&record, 1)?, &record[2]);
        }

        let bundles: LanguageBundles = builders
            .into_iter()
            .map(|(module, builder)| (module, builder.build()))
            .collect();
        debug!(filter = MULTI_CSV_FILTER_ID, modules = bundles.len(), "parsed bundles");
        Ok(bundles)
    }

    fn write(
        &self,
        writer: &mut dyn Write,
        bundles: &LanguageBundles,
        _options: &FilterOptions,
    ) -> Result<(), Error> {
        let mut wtr = open_writer(writer, &HEADER)?;
        for (module, bundle) in bundles {
            for rs in bundle.sorted_resource_strings() {
                wtr.write_record([module.as_str(), rs.key(), rs.value()])?;
            }
        }
        wtr.flush()?;
        debug!(filter = MULTI_CSV_FILTER_ID, modules = bundles.len(), "wrote bundles");
        Ok(())
    }

    fn supports_merge(&self) -> bool {
        true
    }

    fn merge(
        &self,
        base: &mut dyn Read,
        writer: &mut dyn Write,
        bundles: &LanguageBundles,
        _options: &FilterOptions,
    ) -> Result<(), Error> {
        let translations: HashMap<&str, HashMap<&str, &str>> = bundles
            .iter()
            .map(|(module, bundle)| (module.as_str(), bundle.key_value_map()))
            .collect();

        let text = read_text(base)?;
        let mut rdr = open_reader(&text, &HEADER)?;
        let header = rdr.headers()?.clone();
        let mut wtr = open_merge_writer(writer, &header)?;

        let mut rows = 0usize;
        for result in rdr.records() {
            let record = result?;
            require_columns(&record, HEADER.len())?;
            let mut fields: Vec<&str> = record.iter().collect();
            if let Some(value) = translations
                .get(fields[0])
                .and_then(|module| module.get(fields[1]))
            {
                fields[2] = *value;
            }
            wtr.write_record(&fields)?;
            rows += 1;
        }
        wtr.flush()?;
        debug!(filter = MULTI_CSV_FILTER_ID, rows, "merged bundles");
        Ok(())
    }
}
