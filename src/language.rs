//! Maps service language tags to the identifiers used in file and directory names.

use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// How a language tag is spelled in output paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LanguageIdStyle {
    /// The tag as-is, e.g. `pt-BR`.
    Bcp47,
    /// Hyphens replaced by underscores, e.g. `pt_BR`.
    #[default]
    Bcp47Underscore,
}

impl Display for LanguageIdStyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LanguageIdStyle::Bcp47 => write!(f, "BCP47"),
            LanguageIdStyle::Bcp47Underscore => write!(f, "BCP47_UNDERSCORE"),
        }
    }
}

/// Accepts `BCP47` and `BCP47_UNDERSCORE`, ignoring case; `-` may stand for `_`.
impl FromStr for LanguageIdStyle {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "BCP47" => Ok(LanguageIdStyle::Bcp47),
            "BCP47_UNDERSCORE" => Ok(LanguageIdStyle::Bcp47Underscore),
            _ => Err(Error::Config(format!("unknown language id style `{}`", s))),
        }
    }
}

/// Resolves file-facing and content-facing language identifiers.
///
/// # Example
///
/// ```rust
/// use bundlesync::language::{LanguageIdResolver, LanguageIdStyle};
///
/// let resolver = LanguageIdResolver::new(LanguageIdStyle::Bcp47Underscore)
///     .with_mapping("zh-Hans", "zh-CN");
/// assert_eq!(resolver.language_id("zh-Hans"), "zh_CN");
/// assert_eq!(resolver.embedded_language_id("zh-Hans"), "zh-CN");
/// assert_eq!(resolver.language_id("pt-BR"), "pt_BR");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LanguageIdResolver {
    style: LanguageIdStyle,
    language_map: HashMap<String, String>,
}

impl LanguageIdResolver {
    pub fn new(style: LanguageIdStyle) -> Self {
        Self {
            style,
            language_map: HashMap::new(),
        }
    }

    /// Replaces the explicit tag remap table.
    pub fn with_language_map(mut self, language_map: HashMap<String, String>) -> Self {
        self.language_map = language_map;
        self
    }

    /// Adds one explicit remap entry.
    pub fn with_mapping(mut self, tag: impl Into<String>, id: impl Into<String>) -> Self {
        self.language_map.insert(tag.into(), id.into());
        self
    }

    pub fn style(&self) -> LanguageIdStyle {
        self.style
    }

    pub fn language_map(&self) -> &HashMap<String, String> {
        &self.language_map
    }

    /// The identifier written inside file content: the remapped tag, without
    /// style conversion.
    pub fn embedded_language_id(&self, tag: &str) -> String {
        self.language_map
            .get(tag)
            .cloned()
            .unwrap_or_else(|| tag.to_string())
    }

    /// The identifier used in file and directory names.
    pub fn language_id(&self, tag: &str) -> String {
        let id = self.embedded_language_id(tag);
        match self.style {
            LanguageIdStyle::Bcp47 => id,
            LanguageIdStyle::Bcp47Underscore => id.replace('-', "_"),
        }
    }
}
