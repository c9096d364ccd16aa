//! Bundle set configuration.
//!
//! A bundle set is a group of source files sharing one filter type, language
//! policy and output policy. It is usually loaded from JSON:
//!
//! ```json
//! {
//!   "type": "JAVA",
//!   "sourceLanguage": "en",
//!   "targetLanguages": ["fr", "pt-BR"],
//!   "languageIdStyle": "BCP47_UNDERSCORE",
//!   "outputContentOption": "MERGE_TO_SOURCE",
//!   "bundleLayout": "LANGUAGE_SUFFIX"
//! }
//! ```

use std::{
    collections::{BTreeSet, HashMap},
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    content::OutputContentOption,
    error::Error,
    language::{LanguageIdResolver, LanguageIdStyle},
    layout::{BundleLayout, BundleLayoutResolver},
    mapper::{RegexMapper, apply_mappers, path_to_bundle_id, slash_path},
};

/// Settings for one bundle set. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BundleSetConfig {
    /// Filter identifier, e.g. `JAVA` or `JSON`.
    #[serde(rename = "type")]
    pub filter_type: String,

    pub source_language: String,

    /// Languages to export; `None` means every target language of the service bundle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_languages: Option<BTreeSet<String>>,

    /// Explicit language tag to identifier remap.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub language_map: HashMap<String, String>,

    pub language_id_style: LanguageIdStyle,

    /// Root for exported files; `None` writes next to the source files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Also export the source language.
    pub output_source_language: bool,

    pub output_content_option: OutputContentOption,

    pub bundle_layout: BundleLayout,

    /// Replace existing output files.
    pub overwrite: bool,

    /// Rewrites a source path (relative, `/`-separated) into its bundle id.
    /// When empty the id is derived with [`path_to_bundle_id`].
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path_to_bundle_mapper: Vec<RegexMapper>,

    /// Rewrites a source path before the bundle layout places the output.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub source_path_to_target_mapper: Vec<RegexMapper>,
}

impl Default for BundleSetConfig {
    fn default() -> Self {
        Self {
            filter_type: "JAVA".to_string(),
            source_language: "en".to_string(),
            target_languages: None,
            language_map: HashMap::new(),
            language_id_style: LanguageIdStyle::default(),
            output_dir: None,
            output_source_language: false,
            output_content_option: OutputContentOption::default(),
            bundle_layout: BundleLayout::default(),
            overwrite: true,
            path_to_bundle_mapper: Vec::new(),
            source_path_to_target_mapper: Vec::new(),
        }
    }
}

impl BundleSetConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.filter_type.trim().is_empty() {
            return Err(Error::Config("`type` must not be empty".to_string()));
        }
        if self.source_language.trim().is_empty() {
            return Err(Error::Config("`sourceLanguage` must not be empty".to_string()));
        }
        if let Some(targets) = &self.target_languages {
            if targets.iter().any(|t| t.trim().is_empty()) {
                return Err(Error::Config(
                    "`targetLanguages` must not contain empty tags".to_string(),
                ));
            }
        }
        self.path_to_bundle_mapper
            .iter()
            .chain(&self.source_path_to_target_mapper)
            .try_for_each(RegexMapper::validate)
    }

    /// Bundle id for a source file path relative to its package root.
    pub fn bundle_id_for(&self, relative_path: &Path) -> Result<String, Error> {
        if self.path_to_bundle_mapper.is_empty() {
            return Ok(path_to_bundle_id(&self.filter_type, relative_path));
        }
        let bundle_id = apply_mappers(&self.path_to_bundle_mapper, &slash_path(relative_path))?;
        if bundle_id.is_empty() {
            return Err(Error::Config(format!(
                "`pathToBundleMapper` maps {} to an empty bundle id",
                relative_path.display()
            )));
        }
        Ok(bundle_id)
    }

    pub fn language_resolver(&self) -> LanguageIdResolver {
        LanguageIdResolver::new(self.language_id_style).with_language_map(self.language_map.clone())
    }

    pub fn layout_resolver(&self) -> BundleLayoutResolver {
        BundleLayoutResolver::new(self.bundle_layout, self.language_resolver())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = BundleSetConfig::from_json_str("{}").unwrap();
        assert_eq!(config, BundleSetConfig::default());
        assert_eq!(config.filter_type, "JAVA");
        assert_eq!(config.source_language, "en");
        assert_eq!(config.language_id_style, LanguageIdStyle::Bcp47Underscore);
        assert_eq!(config.output_content_option, OutputContentOption::MergeToSource);
        assert_eq!(config.bundle_layout, BundleLayout::LanguageSuffix);
        assert!(config.overwrite);
        assert!(!config.output_source_language);
    }

    #[test]
    fn test_full_config() {
        let json = indoc! {r#"
            {
              "type": "JSON",
              "sourceLanguage": "en",
              "targetLanguages": ["fr", "pt-BR"],
              "languageMap": { "pt-BR": "pt" },
              "languageIdStyle": "BCP47",
              "outputDir": "build/nls",
              "outputSourceLanguage": true,
              "outputContentOption": "REVIEWD_WITH_FALLBACK",
              "bundleLayout": "LANGUAGE_DIR",
              "overwrite": false
            }
        "#};
        let config = BundleSetConfig::from_json_str(json).unwrap();
        assert_eq!(config.filter_type, "JSON");
        assert_eq!(
            config.target_languages,
            Some(["fr", "pt-BR"].into_iter().map(String::from).collect())
        );
        assert_eq!(config.output_dir.as_deref(), Some(Path::new("build/nls")));
        assert_eq!(config.output_content_option, OutputContentOption::ReviewedWithFallback);
        assert_eq!(config.bundle_layout, BundleLayout::LanguageDir);
        assert!(!config.overwrite);
        assert_eq!(config.language_resolver().language_id("pt-BR"), "pt");
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            BundleSetConfig::from_json_str(r#"{"bundleLayout": "FLAT"}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            BundleSetConfig::from_json_str(r#"{"sourceLanguage": " "}"#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_bundle_id_mappers() {
        let config = BundleSetConfig::from_json_str(indoc! {r#"
            {
              "type": "JSON",
              "pathToBundleMapper": [
                { "pattern": "\\.json$", "replacement": "" },
                { "pattern": "/", "replacement": "_" }
              ]
            }
        "#})
        .unwrap();
        assert_eq!(
            config.bundle_id_for(Path::new("web/nls/strings.json")).unwrap(),
            "web_nls_strings"
        );

        let default = BundleSetConfig::default();
        assert_eq!(
            default.bundle_id_for(Path::new("com/example/Messages.properties")).unwrap(),
            "com.example.Messages"
        );

        let invalid = BundleSetConfig::from_json_str(
            r#"{"sourcePathToTargetMapper": [{"pattern": "(", "replacement": ""}]}"#,
        );
        assert!(matches!(invalid, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"type": "CSV", "targetLanguages": ["de"]}}"#).unwrap();
        let config = BundleSetConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.filter_type, "CSV");

        let missing = BundleSetConfig::from_json_file(Path::new("/nonexistent/bundles.json"));
        assert!(matches!(missing, Err(Error::Io(_))));
    }
}
