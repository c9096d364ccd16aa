//! Regex rewrite rules for bundle ids and output paths.

use std::path::{Component, Path};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{error::Error, formats::FilterType};

/// Replaces every match of `pattern` with `replacement`.
///
/// The replacement uses the `regex` crate syntax: `$1` or `${name}` refer to
/// capture groups and `$$` is a literal dollar sign.
///
/// # Example
/// ```rust
/// use bundlesync::mapper::RegexMapper;
/// let mapper = RegexMapper::new(r"(.+)\.java", "$1");
/// assert_eq!(mapper.map("com/example/Test.java").unwrap(), "com/example/Test");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexMapper {
    pub pattern: String,
    pub replacement: String,
}

impl RegexMapper {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    fn regex(&self) -> Result<Regex, Error> {
        Regex::new(&self.pattern)
            .map_err(|e| Error::Config(format!("invalid mapper pattern `{}`: {}", self.pattern, e)))
    }

    /// Checks that the pattern compiles.
    pub fn validate(&self) -> Result<(), Error> {
        self.regex().map(|_| ())
    }

    pub fn map(&self, s: &str) -> Result<String, Error> {
        Ok(self
            .regex()?
            .replace_all(s, self.replacement.as_str())
            .into_owned())
    }
}

/// Runs `s` through every mapper in order.
pub fn apply_mappers(mappers: &[RegexMapper], s: &str) -> Result<String, Error> {
    mappers
        .iter()
        .try_fold(s.to_string(), |acc, mapper| mapper.map(&acc))
}

/// Joins the normal components of `path` with `/`, whatever the platform separator.
pub fn slash_path(path: &Path) -> String {
    path_segments(path).join("/")
}

fn path_segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Default bundle id for a source file path relative to its package root.
///
/// Java properties (`JAVA`, `JAVAUTF8`) give `pkg.path.basename`, with the
/// base name cut at its first dot. Other types give `pkg.path-filename`.
/// Files at the root give just the base name or file name.
///
/// # Example
/// ```rust
/// use bundlesync::mapper::path_to_bundle_id;
/// use std::path::Path;
/// assert_eq!(
///     path_to_bundle_id("JAVA", Path::new("com/example/Messages.properties")),
///     "com.example.Messages"
/// );
/// assert_eq!(
///     path_to_bundle_id("JSON", Path::new("web/nls/strings.json")),
///     "web.nls-strings.json"
/// );
/// ```
pub fn path_to_bundle_id(filter_type: &str, relative_path: &Path) -> String {
    let mut segments = path_segments(relative_path);
    let file_name = segments.pop().unwrap_or_default();
    let package = segments.join(".");

    let is_java = matches!(
        filter_type.parse::<FilterType>(),
        Ok(FilterType::Java | FilterType::JavaUtf8)
    );
    let (name, separator) = if is_java {
        let base = file_name.split('.').next().unwrap_or_default().to_string();
        (base, '.')
    } else {
        (file_name, '-')
    };

    if package.is_empty() {
        name
    } else {
        format!("{}{}{}", package, separator, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map() {
        let cases = [
            ("com/ibm/g11n/Test.java", r"(.+)\.java", "$1", "com/ibm/g11n/Test"),
            ("com/ibm/g11n/Test", "/", ".", "com.ibm.g11n.Test"),
            ("abc-123", "def", "xyz", "abc-123"),
        ];
        for (input, pattern, replacement, expected) in cases {
            let mapper = RegexMapper::new(pattern, replacement);
            assert_eq!(mapper.map(input).unwrap(), expected);
        }
    }

    #[test]
    fn test_apply_mappers_in_order() {
        let mappers = [
            RegexMapper::new(r"\.properties$", ""),
            RegexMapper::new("/", "."),
        ];
        assert_eq!(
            apply_mappers(&mappers, "com/example/Messages.properties").unwrap(),
            "com.example.Messages"
        );
        assert_eq!(apply_mappers(&[], "unchanged").unwrap(), "unchanged");
    }

    #[test]
    fn test_invalid_pattern() {
        let mapper = RegexMapper::new("(unclosed", "x");
        assert!(matches!(mapper.validate(), Err(Error::Config(_))));
        assert!(matches!(mapper.map("anything"), Err(Error::Config(_))));
    }

    #[test]
    fn test_path_to_bundle_id() {
        assert_eq!(
            path_to_bundle_id("JAVA", Path::new("com/example/Messages.properties")),
            "com.example.Messages"
        );
        assert_eq!(
            path_to_bundle_id("javautf8", Path::new("com/example/Messages.utf8.properties")),
            "com.example.Messages"
        );
        assert_eq!(path_to_bundle_id("JAVA", Path::new("Root.properties")), "Root");
        assert_eq!(
            path_to_bundle_id("JSON", Path::new("web/nls/strings.json")),
            "web.nls-strings.json"
        );
        assert_eq!(path_to_bundle_id("CSV", Path::new("./labels.csv")), "labels.csv");
    }

    #[test]
    fn test_slash_path() {
        assert_eq!(slash_path(Path::new("./a/b/c.json")), "a/b/c.json");
    }
}
