//! All built-in resource bundle formats.
//!
//! This module re-exports each filter and provides the [`FilterType`] enum
//! naming the built-in filters by identifier.

pub mod android_strings;
pub mod csv;
pub mod json;
pub mod multi_csv;
pub mod properties;
pub mod strings;

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

// Reexporting the filters for easier access
pub use android_strings::{ANDROID_FILTER_ID, AndroidStringsFilter};
pub use csv::{CSV_FILTER_ID, CsvFilter};
pub use json::{GLOBALIZEJS_FILTER_ID, GlobalizeJsFilter, JSON_FILTER_ID, JsonFilter};
pub use multi_csv::{MULTI_CSV_FILTER_ID, MultiBundleCsvFilter};
pub use properties::{
    JAVA_FILTER_ID, JAVA_UTF8_FILTER_ID, JavaPropertiesFilter, PropertiesEncoding,
};
pub use strings::{AppleStringsFilter, IOS_FILTER_ID};

use crate::Error;

/// The built-in filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterType {
    /// `ANDROID`: Android `strings.xml`.
    Android,
    /// `CSV`: `key,value` rows.
    Csv,
    /// `CSV-MULTI`: `module,key,value` rows, several bundles per file.
    MultiCsv,
    /// `GLOBALIZEJS`: Globalize.js JSON keyed by language.
    GlobalizeJs,
    /// `IOS`: Apple `.strings`.
    Ios,
    /// `JAVA`: ISO-8859-1 `.properties`.
    Java,
    /// `JAVAUTF8`: UTF-8 `.properties`.
    JavaUtf8,
    /// `JSON`: nested JSON object.
    Json,
}

impl FilterType {
    /// Every built-in filter, in identifier order.
    pub const ALL: [FilterType; 8] = [
        FilterType::Android,
        FilterType::Csv,
        FilterType::MultiCsv,
        FilterType::GlobalizeJs,
        FilterType::Ios,
        FilterType::Java,
        FilterType::JavaUtf8,
        FilterType::Json,
    ];

    /// The upper-case filter identifier.
    pub fn id(&self) -> &'static str {
        match self {
            FilterType::Android => ANDROID_FILTER_ID,
            FilterType::Csv => CSV_FILTER_ID,
            FilterType::MultiCsv => MULTI_CSV_FILTER_ID,
            FilterType::GlobalizeJs => GLOBALIZEJS_FILTER_ID,
            FilterType::Ios => IOS_FILTER_ID,
            FilterType::Java => JAVA_FILTER_ID,
            FilterType::JavaUtf8 => JAVA_UTF8_FILTER_ID,
            FilterType::Json => JSON_FILTER_ID,
        }
    }

    /// Whether the format holds several bundles per file.
    pub fn is_multi_bundle(&self) -> bool {
        matches!(self, FilterType::MultiCsv)
    }

    /// Returns the typical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            FilterType::Csv | FilterType::MultiCsv => "csv",
            FilterType::GlobalizeJs | FilterType::Json => "json",
            FilterType::Java | FilterType::JavaUtf8 => "properties",
            FilterType::Android => "xml",
            FilterType::Ios => "strings",
        }
    }
}

/// Displays the filter identifier, e.g. `CSV-MULTI`.
///
/// # Example
/// ```rust
/// use bundlesync::formats::FilterType;
/// assert_eq!(FilterType::MultiCsv.to_string(), "CSV-MULTI");
/// assert_eq!(FilterType::JavaUtf8.to_string(), "JAVAUTF8");
/// ```
impl Display for FilterType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Parses a filter identifier, ignoring case and surrounding whitespace.
///
/// Returns [`crate::error::Error::UnknownFilterType`] for unknown identifiers.
///
/// # Example
/// ```rust
/// use bundlesync::formats::FilterType;
/// use std::str::FromStr;
/// assert_eq!(FilterType::from_str("java").unwrap(), FilterType::Java);
/// assert_eq!(FilterType::from_str("csv-multi").unwrap(), FilterType::MultiCsv);
/// assert!(FilterType::from_str("xliff").is_err());
/// ```
impl FromStr for FilterType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        FilterType::ALL
            .into_iter()
            .find(|t| t.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownFilterType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse_agree() {
        for filter_type in FilterType::ALL {
            let parsed: FilterType = filter_type.to_string().parse().unwrap();
            assert_eq!(parsed, filter_type);
        }
    }

    #[test]
    fn test_multi_bundle_flag() {
        let multi: Vec<_> = FilterType::ALL
            .into_iter()
            .filter(FilterType::is_multi_bundle)
            .collect();
        assert_eq!(multi, vec![FilterType::MultiCsv]);
    }

    #[test]
    fn test_unknown_filter_type() {
        let err = "PO".parse::<FilterType>().unwrap_err();
        assert!(matches!(err, Error::UnknownFilterType(id) if id == "PO"));
    }

    #[test]
    fn test_extension() {
        assert_eq!(FilterType::JavaUtf8.extension(), "properties");
        assert_eq!(FilterType::GlobalizeJs.extension(), "json");
        assert_eq!(FilterType::Ios.extension(), "strings");
        assert_eq!("android".parse::<FilterType>().unwrap(), FilterType::Android);
    }
}
