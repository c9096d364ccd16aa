//! Computes where a translated bundle file goes.

use std::{
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{error::Error, language::LanguageIdResolver};

/// Layout strategy for translated files relative to the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BundleLayout {
    /// `res/messages.properties` -> `res/messages_fr.properties`
    #[default]
    LanguageSuffix,
    /// `res/messages.properties` -> `res/fr.properties`
    LanguageOnly,
    /// `res/messages.properties` -> `res/fr/messages.properties`
    LanguageSubdir,
    /// `res/en/messages.properties` -> `res/fr/messages.properties`
    LanguageDir,
}

impl BundleLayout {
    pub const ALL: [BundleLayout; 4] = [
        BundleLayout::LanguageSuffix,
        BundleLayout::LanguageOnly,
        BundleLayout::LanguageSubdir,
        BundleLayout::LanguageDir,
    ];
}

impl Display for BundleLayout {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BundleLayout::LanguageSuffix => "LANGUAGE_SUFFIX",
            BundleLayout::LanguageOnly => "LANGUAGE_ONLY",
            BundleLayout::LanguageSubdir => "LANGUAGE_SUBDIR",
            BundleLayout::LanguageDir => "LANGUAGE_DIR",
        };
        f.write_str(name)
    }
}

impl FromStr for BundleLayout {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        BundleLayout::ALL
            .into_iter()
            .find(|layout| layout.to_string() == normalized)
            .ok_or_else(|| Error::Config(format!("unknown bundle layout `{}`", s)))
    }
}

/// Splits a file name at its last `.`; the extension keeps the dot.
fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) => file_name.split_at(idx),
        None => (file_name, ""),
    }
}

/// Resolves output paths for one layout and language id policy.
///
/// # Example
///
/// ```rust
/// use bundlesync::language::{LanguageIdResolver, LanguageIdStyle};
/// use bundlesync::layout::{BundleLayout, BundleLayoutResolver};
/// use std::path::Path;
///
/// let resolver = BundleLayoutResolver::new(
///     BundleLayout::LanguageSuffix,
///     LanguageIdResolver::new(LanguageIdStyle::Bcp47Underscore),
/// );
/// let out = resolver.output_path(Path::new("res/MyMessages_en.properties"), "en", "pt-BR");
/// assert_eq!(out, Path::new("res/MyMessages_pt_BR.properties"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BundleLayoutResolver {
    layout: BundleLayout,
    language: LanguageIdResolver,
}

impl BundleLayoutResolver {
    pub fn new(layout: BundleLayout, language: LanguageIdResolver) -> Self {
        Self { layout, language }
    }

    pub fn layout(&self) -> BundleLayout {
        self.layout
    }

    pub fn language_resolver(&self) -> &LanguageIdResolver {
        &self.language
    }

    /// Output path of `target_language` for `source_file`, written in `source_language`.
    pub fn output_path(
        &self,
        source_file: &Path,
        source_language: &str,
        target_language: &str,
    ) -> PathBuf {
        let dir = source_file.parent().unwrap_or_else(|| Path::new(""));
        let file_name = source_file.file_name().unwrap_or_default();
        let target_id = self.language.language_id(target_language);

        match self.layout {
            BundleLayout::LanguageSuffix => {
                if target_language == source_language {
                    return dir.join(file_name);
                }
                let file_name = file_name.to_string_lossy();
                let (base, extension) = split_extension(&file_name);
                let source_suffix = format!("_{}", self.language.language_id(source_language));
                let base = base.strip_suffix(source_suffix.as_str()).unwrap_or(base);
                dir.join(format!("{}_{}{}", base, target_id, extension))
            }
            BundleLayout::LanguageOnly => {
                let file_name = file_name.to_string_lossy();
                let (_, extension) = split_extension(&file_name);
                dir.join(format!("{}{}", target_id, extension))
            }
            BundleLayout::LanguageSubdir => dir.join(target_id).join(file_name),
            BundleLayout::LanguageDir => dir
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(target_id)
                .join(file_name),
        }
    }

    /// Like [`BundleLayoutResolver::output_path`], with the source file's
    /// path relative to its source root re-rooted under `output_dir`.
    pub fn output_path_under(
        &self,
        output_dir: &Path,
        relative_path: &Path,
        source_language: &str,
        target_language: &str,
    ) -> PathBuf {
        self.output_path(&output_dir.join(relative_path), source_language, target_language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguageIdStyle;

    fn resolver(layout: BundleLayout, style: LanguageIdStyle) -> BundleLayoutResolver {
        BundleLayoutResolver::new(layout, LanguageIdResolver::new(style))
    }

    #[test]
    fn test_language_suffix() {
        let r = resolver(BundleLayout::LanguageSuffix, LanguageIdStyle::Bcp47Underscore);
        assert_eq!(
            r.output_path(Path::new("res/MyMessages.properties"), "en", "fr"),
            Path::new("res/MyMessages_fr.properties")
        );
        assert_eq!(
            r.output_path(Path::new("res/MyMessages_en.properties"), "en", "fr"),
            Path::new("res/MyMessages_fr.properties")
        );
        assert_eq!(
            r.output_path(Path::new("res/MyMessages.properties"), "en", "zh-Hant"),
            Path::new("res/MyMessages_zh_Hant.properties")
        );
    }

    #[test]
    fn test_language_suffix_same_language_unchanged() {
        let r = resolver(BundleLayout::LanguageSuffix, LanguageIdStyle::Bcp47);
        assert_eq!(
            r.output_path(Path::new("res/MyMessages_en.properties"), "en", "en"),
            Path::new("res/MyMessages_en.properties")
        );
    }

    #[test]
    fn test_language_suffix_without_extension() {
        let r = resolver(BundleLayout::LanguageSuffix, LanguageIdStyle::Bcp47);
        assert_eq!(
            r.output_path(Path::new("res/messages"), "en", "pt-BR"),
            Path::new("res/messages_pt-BR")
        );
        assert_eq!(
            r.output_path(Path::new("res/messages_en"), "en", "de"),
            Path::new("res/messages_de")
        );
    }

    #[test]
    fn test_language_suffix_strips_source_id_in_style() {
        let r = resolver(BundleLayout::LanguageSuffix, LanguageIdStyle::Bcp47Underscore);
        assert_eq!(
            r.output_path(Path::new("strings_en_US.json"), "en-US", "ja"),
            Path::new("strings_ja.json")
        );
    }

    #[test]
    fn test_language_only() {
        let r = resolver(BundleLayout::LanguageOnly, LanguageIdStyle::Bcp47);
        assert_eq!(
            r.output_path(Path::new("locales/en.json"), "en", "pt-BR"),
            Path::new("locales/pt-BR.json")
        );
        assert_eq!(r.output_path(Path::new("locales/en"), "en", "de"), Path::new("locales/de"));
    }

    #[test]
    fn test_language_subdir() {
        let r = resolver(BundleLayout::LanguageSubdir, LanguageIdStyle::Bcp47Underscore);
        assert_eq!(
            r.output_path(Path::new("res/messages.json"), "en", "zh-Hans"),
            Path::new("res/zh_Hans/messages.json")
        );
    }

    #[test]
    fn test_language_dir() {
        let r = resolver(BundleLayout::LanguageDir, LanguageIdStyle::Bcp47);
        assert_eq!(
            r.output_path(Path::new("nls/en/messages.json"), "en", "fr"),
            Path::new("nls/fr/messages.json")
        );
        assert_eq!(
            r.output_path(Path::new("en/messages.json"), "en", "fr"),
            Path::new("fr/messages.json")
        );
    }

    #[test]
    fn test_custom_language_map() {
        let language = LanguageIdResolver::new(LanguageIdStyle::Bcp47Underscore)
            .with_mapping("zh-Hans", "zh-CN")
            .with_mapping("en", "base");
        let r = BundleLayoutResolver::new(BundleLayout::LanguageSuffix, language);
        assert_eq!(
            r.output_path(Path::new("Messages_base.properties"), "en", "zh-Hans"),
            Path::new("Messages_zh_CN.properties")
        );
    }

    #[test]
    fn test_output_path_under() {
        let r = resolver(BundleLayout::LanguageSubdir, LanguageIdStyle::Bcp47);
        assert_eq!(
            r.output_path_under(Path::new("out"), Path::new("com/acme/msgs.properties"), "en", "de"),
            Path::new("out/com/acme/de/msgs.properties")
        );
    }

    #[test]
    fn test_layout_parse_and_display() {
        for layout in BundleLayout::ALL {
            assert_eq!(layout.to_string().parse::<BundleLayout>().unwrap(), layout);
        }
        assert_eq!("language-dir".parse::<BundleLayout>().unwrap(), BundleLayout::LanguageDir);
        assert!(matches!("FLAT".parse::<BundleLayout>(), Err(Error::Config(_))));
        let layout: BundleLayout = serde_json::from_str("\"LANGUAGE_SUBDIR\"").unwrap();
        assert_eq!(layout, BundleLayout::LanguageSubdir);
    }
}
