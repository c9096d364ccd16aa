//! Assembles language bundles from translation service entries and back.

use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    types::{LanguageBundle, LanguageBundleBuilder, ResourceString},
};

/// What goes into an exported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputContentOption {
    /// Merge translations (source value as fallback) into a copy of the source file.
    #[default]
    MergeToSource,
    /// Write translations, falling back to the source value.
    TranslatedWithFallback,
    /// Write translated values only.
    TranslatedOnly,
    /// Merge reviewed translations (source value as fallback) into a copy of the source file.
    MergeReviewedToSource,
    /// Write reviewed translations, falling back to the source value.
    #[serde(alias = "REVIEWD_WITH_FALLBACK")]
    ReviewedWithFallback,
    /// Write reviewed translations only.
    ReviewedOnly,
}

impl OutputContentOption {
    pub const ALL: [OutputContentOption; 6] = [
        OutputContentOption::MergeToSource,
        OutputContentOption::TranslatedWithFallback,
        OutputContentOption::TranslatedOnly,
        OutputContentOption::MergeReviewedToSource,
        OutputContentOption::ReviewedWithFallback,
        OutputContentOption::ReviewedOnly,
    ];

    /// Whether the output is produced by merging into the source file.
    pub fn merges(&self) -> bool {
        matches!(
            self,
            OutputContentOption::MergeToSource | OutputContentOption::MergeReviewedToSource
        )
    }

    /// Whether unreviewed translations are treated as missing.
    pub fn reviewed_only(&self) -> bool {
        matches!(
            self,
            OutputContentOption::MergeReviewedToSource
                | OutputContentOption::ReviewedWithFallback
                | OutputContentOption::ReviewedOnly
        )
    }

    /// Whether a missing translation is replaced by the source value.
    pub fn with_fallback(&self) -> bool {
        !matches!(
            self,
            OutputContentOption::TranslatedOnly | OutputContentOption::ReviewedOnly
        )
    }
}

impl Display for OutputContentOption {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OutputContentOption::MergeToSource => "MERGE_TO_SOURCE",
            OutputContentOption::TranslatedWithFallback => "TRANSLATED_WITH_FALLBACK",
            OutputContentOption::TranslatedOnly => "TRANSLATED_ONLY",
            OutputContentOption::MergeReviewedToSource => "MERGE_REVIEWED_TO_SOURCE",
            OutputContentOption::ReviewedWithFallback => "REVIEWED_WITH_FALLBACK",
            OutputContentOption::ReviewedOnly => "REVIEWED_ONLY",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputContentOption {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        if normalized == "REVIEWD_WITH_FALLBACK" {
            return Ok(OutputContentOption::ReviewedWithFallback);
        }
        OutputContentOption::ALL
            .into_iter()
            .find(|option| option.to_string() == normalized)
            .ok_or_else(|| Error::Config(format!("unknown output content option `{}`", s)))
    }
}

/// One resource entry as the translation service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ResourceEntry {
    /// The value in the requested language; `None` when not translated yet.
    pub value: Option<String>,
    pub source_value: Option<String>,
    pub sequence_number: Option<u32>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub reviewed: bool,
}

/// One resource entry to upload to the translation service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct NewResourceEntry {
    pub value: String,
    pub sequence_number: Option<u32>,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// Builds the bundle to export from service entries.
///
/// Unreviewed values are dropped when the option is reviewed-only, then
/// missing values take the source value when the option falls back. Entries
/// still without a value are left out. Sequence numbers are kept as the
/// service reports them.
pub fn build_language_bundle(
    entries: &BTreeMap<String, ResourceEntry>,
    option: OutputContentOption,
    embedded_language_code: Option<String>,
) -> LanguageBundle {
    let mut builder = LanguageBundleBuilder::from_service_data();
    builder.embedded_language_code(embedded_language_code);

    for (key, entry) in entries {
        let mut value = entry.value.as_deref();
        if option.reviewed_only() && !entry.reviewed {
            value = None;
        }
        if value.is_none() && option.with_fallback() {
            value = entry.source_value.as_deref();
        }
        let Some(value) = value else {
            continue;
        };
        builder.add_resource_string(
            ResourceString::new(key.as_str(), value)
                .with_source_value(entry.source_value.clone())
                .with_sequence_number(entry.sequence_number)
                .with_notes(entry.notes.clone()),
        );
    }
    builder.build()
}

/// Converts a parsed bundle into the upload shape, keyed by resource key.
pub fn entries_from_bundle(bundle: &LanguageBundle) -> BTreeMap<String, NewResourceEntry> {
    bundle
        .resource_strings()
        .iter()
        .map(|rs| {
            (
                rs.key().to_string(),
                NewResourceEntry {
                    value: rs.value().to_string(),
                    sequence_number: rs.sequence_number(),
                    notes: rs.notes().to_vec(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(value: Option<&str>, source: &str, seq: u32, reviewed: bool) -> ResourceEntry {
        ResourceEntry {
            value: value.map(str::to_string),
            source_value: Some(source.to_string()),
            sequence_number: Some(seq),
            notes: Vec::new(),
            reviewed,
        }
    }

    fn sample() -> BTreeMap<String, ResourceEntry> {
        let mut entries = BTreeMap::new();
        entries.insert("reviewed".to_string(), entry(Some("Relu"), "Reviewed", 1, true));
        entries.insert("draft".to_string(), entry(Some("Brouillon"), "Draft", 2, false));
        entries.insert("missing".to_string(), entry(None, "Missing", 3, false));
        entries
    }

    fn values(bundle: &LanguageBundle) -> Vec<(&str, &str)> {
        bundle
            .sorted_resource_strings()
            .into_iter()
            .map(|rs| (rs.key(), rs.value()))
            .collect()
    }

    #[test]
    fn test_option_flags() {
        use OutputContentOption::*;
        let flags: Vec<_> = OutputContentOption::ALL
            .into_iter()
            .map(|o| (o.merges(), o.reviewed_only(), o.with_fallback()))
            .collect();
        assert_eq!(
            flags,
            vec![
                (true, false, true),
                (false, false, true),
                (false, false, false),
                (true, true, true),
                (false, true, true),
                (false, true, false),
            ]
        );
        assert!(MergeToSource.merges());
    }

    #[test]
    fn test_translated_with_fallback() {
        let bundle = build_language_bundle(&sample(), OutputContentOption::TranslatedWithFallback, None);
        assert_eq!(
            values(&bundle),
            vec![("reviewed", "Relu"), ("draft", "Brouillon"), ("missing", "Missing")]
        );
        assert_eq!(bundle.get("draft").unwrap().source_value(), Some("Draft"));
    }

    #[test]
    fn test_translated_only_drops_missing() {
        let bundle = build_language_bundle(&sample(), OutputContentOption::TranslatedOnly, None);
        assert_eq!(values(&bundle), vec![("reviewed", "Relu"), ("draft", "Brouillon")]);
    }

    #[test]
    fn test_reviewed_with_fallback() {
        let bundle = build_language_bundle(&sample(), OutputContentOption::ReviewedWithFallback, None);
        assert_eq!(
            values(&bundle),
            vec![("reviewed", "Relu"), ("draft", "Draft"), ("missing", "Missing")]
        );
    }

    #[test]
    fn test_reviewed_only() {
        let bundle = build_language_bundle(
            &sample(),
            OutputContentOption::ReviewedOnly,
            Some("fr-CA".to_string()),
        );
        assert_eq!(values(&bundle), vec![("reviewed", "Relu")]);
        assert_eq!(bundle.embedded_language_code(), Some("fr-CA"));
    }

    #[test]
    fn test_keeps_service_sequence_numbers() {
        let mut entries = BTreeMap::new();
        entries.insert("a".to_string(), entry(Some("A"), "A", 9, true));
        entries.insert("b".to_string(), entry(Some("B"), "B", 4, true));
        let bundle = build_language_bundle(&entries, OutputContentOption::MergeToSource, None);
        assert_eq!(bundle.get("a").unwrap().sequence_number(), Some(9));
        assert_eq!(values(&bundle), vec![("b", "B"), ("a", "A")]);
    }

    #[test]
    fn test_option_parse() {
        assert_eq!(
            "reviewd_with_fallback".parse::<OutputContentOption>().unwrap(),
            OutputContentOption::ReviewedWithFallback
        );
        assert_eq!(
            "merge-to-source".parse::<OutputContentOption>().unwrap(),
            OutputContentOption::MergeToSource
        );
        let option: OutputContentOption = serde_json::from_str("\"REVIEWD_WITH_FALLBACK\"").unwrap();
        assert_eq!(option, OutputContentOption::ReviewedWithFallback);
        assert!("EVERYTHING".parse::<OutputContentOption>().is_err());
    }

    #[test]
    fn test_entries_from_bundle() {
        let mut builder = LanguageBundleBuilder::from_parsed_file();
        builder
            .add_resource_string(ResourceString::new("hello", "Hello").with_notes(vec!["greeting".into()]))
            .add("bye", "Goodbye");
        let entries = entries_from_bundle(&builder.build());
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries["hello"],
            NewResourceEntry {
                value: "Hello".to_string(),
                sequence_number: Some(1),
                notes: vec!["greeting".to_string()],
            }
        );
        assert_eq!(entries["bye"].sequence_number, Some(2));
    }
}
